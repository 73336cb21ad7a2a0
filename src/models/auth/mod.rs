pub mod entities;
pub mod requests;
pub mod responses;

pub use entities::{AccessRole, AuthUser, Session};
pub use requests::{ChangePasswordRequest, LoginRequest};
pub use responses::LoginResponse;
