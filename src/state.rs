use std::sync::Arc;

use crate::audit::AuditLogger;
use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::db::Store;

/// Shared application state, cheap to clone into every handler and layer.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
    pub tokens: TokenService,
    pub audit: AuditLogger,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store) -> Self {
        let tokens = TokenService::new(&config.security);
        let audit = AuditLogger::new(&store);
        Self {
            config: Arc::new(config),
            store,
            tokens,
            audit,
        }
    }
}
