pub mod auth;
pub mod security_headers;

pub use auth::{Session, SessionLoader};
pub use security_headers::SecurityHeaders;
