pub mod auth;
pub mod files;
pub mod limiter;
pub mod token;

pub use auth::{AuthError, AuthService};
pub use files::{FileError, FileService};
pub use limiter::{AttemptLimiter, AttemptPermission, InMemoryAttemptLimiter};
pub use token::{Principal, TokenService};
