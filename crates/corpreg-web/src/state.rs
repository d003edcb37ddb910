use std::sync::Arc;

use corpreg_core::CompanyService;

use crate::auth::AuthManager;
use crate::middleware::rate_limit::RequestLimiter;

/// Everything a handler can reach. Built once in `main` (or per test) and
/// cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub companies: CompanyService,
    pub auth: Arc<AuthManager>,
    pub limiter: Arc<RequestLimiter>,
}
