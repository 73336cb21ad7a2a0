pub mod pagination;
pub mod response;
mod string_enum;

pub(crate) use string_enum::define_string_enum;

pub use pagination::{PaginationInfo, PaginationQuery, normalize_page};
pub use response::ApiResponse;
