use platform_db::Paged;
use serde::Serialize;
use url::form_urlencoded;

/// Page-number envelope: `{count, next, previous, results}`.
#[derive(Debug, Serialize)]
pub struct PageBody<T: Serialize> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T: Serialize> PageBody<T> {
    /// `filters` are re-encoded into the navigation links next to `page`.
    pub fn new(paged: Paged<T>, path: &str, filters: &[(&str, Option<&str>)]) -> Self {
        let link = |page: u64| page_link(path, filters, page);
        let next = paged.has_next().then(|| link(paged.page + 1));
        let previous = paged.has_previous().then(|| link(paged.page - 1));
        Self {
            count: paged.total,
            next,
            previous,
            results: paged.items,
        }
    }
}

fn page_link(path: &str, filters: &[(&str, Option<&str>)], page: u64) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in filters {
        if let Some(value) = value {
            query.append_pair(key, value);
        }
    }
    query.append_pair("page", &page.to_string());
    format!("{path}?{}", query.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paged(page: u64, num_pages: u64) -> Paged<u32> {
        Paged {
            items: vec![1, 2],
            total: 42,
            page,
            num_pages,
        }
    }

    #[test]
    fn middle_page_links_both_ways() {
        let body = PageBody::new(paged(2, 3), "/api/employee", &[]);
        assert_eq!(body.count, 42);
        assert_eq!(body.next.as_deref(), Some("/api/employee?page=3"));
        assert_eq!(body.previous.as_deref(), Some("/api/employee?page=1"));
    }

    #[test]
    fn links_keep_filters_encoded() {
        let body = PageBody::new(
            paged(1, 2),
            "/api/employee",
            &[("department", Some("R&D")), ("surname", None)],
        );
        assert_eq!(
            body.next.as_deref(),
            Some("/api/employee?department=R%26D&page=2")
        );
        assert!(body.previous.is_none());
    }
}
