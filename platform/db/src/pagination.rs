use sea_orm::{ConnectionTrait, DbErr, Paginator, SelectorTrait};
use thiserror::Error;

/// Upper bound applied to any configured page size.
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("invalid page {page}; {num_pages} page(s) available")]
    OutOfRange { page: u64, num_pages: u64 },
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// One-based page number plus the page size to slice with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub num_pages: u64,
}

impl<T> Paged<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            num_pages: self.num_pages,
        }
    }
}

/// Fetches `request.page` from `paginator`. The first page always exists,
/// even for an empty result; any other page past the end is out of range.
pub async fn fetch_page<'db, C, S>(
    paginator: Paginator<'db, C, S>,
    request: PageRequest,
) -> Result<Paged<S::Item>, PageError>
where
    C: ConnectionTrait,
    S: SelectorTrait + 'db,
{
    let counts = paginator.num_items_and_pages().await?;
    let num_pages = counts.number_of_pages.max(1);
    if request.page == 0 || request.page > num_pages {
        return Err(PageError::OutOfRange {
            page: request.page,
            num_pages,
        });
    }
    let items = paginator.fetch_page(request.page - 1).await?;
    Ok(Paged {
        items,
        total: counts.number_of_items,
        page: request.page,
        num_pages,
    })
}
