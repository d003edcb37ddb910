pub mod jwt;
pub mod manager;
pub mod middleware;

pub use manager::{AuthManager, IssuedToken};
pub use middleware::{AuthUser, BearerToken};
