use std::sync::Arc;

use albums_dal::{Backend, Pool};

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, pool: Pool, backend: Backend) -> Self {
        AppState {
            state: Arc::new(AppStateInner {
                app_config,
                pool,
                backend,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }

    pub fn backend(&self) -> Backend {
        self.state.backend
    }
}

struct AppStateInner {
    pool: Pool,
    backend: Backend,
    app_config: AppConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Maximum size of request body for uploads
    pub upload_limit_mb: usize,
}
