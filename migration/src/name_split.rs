//! Positional split of a legacy single-field employee name.

/// Name parts in the order the legacy `full_name` column stored them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameParts {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
}

/// Splits on whitespace and assigns tokens to name, surname and patronymic
/// in that order. Tokens past the third are discarded.
pub fn split_full_name(full_name: &str) -> NameParts {
    let mut tokens = full_name.split_whitespace().map(str::to_owned);
    NameParts {
        name: tokens.next(),
        surname: tokens.next(),
        patronymic: tokens.next(),
    }
}

/// Inverse of [`split_full_name`], used when rolling the split back.
pub fn join_name_parts(parts: &NameParts) -> String {
    [&parts.name, &parts.surname, &parts.patronymic]
        .into_iter()
        .flatten()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
