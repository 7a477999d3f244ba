mod error;
mod page;

pub use error::{ApiError, ApiResult, FieldErrors};
pub use page::PageBody;
