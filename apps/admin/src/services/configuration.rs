//! Read access to the loaded [`AppConfig`] for the other services.

use std::sync::Arc;

use crate::config::AppConfig;

#[derive(Debug, Clone)]
pub struct ConfigurationService {
    config: Arc<AppConfig>,
}

impl ConfigurationService {
    pub fn new(config: AppConfig) -> Self {
        ConfigurationService {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn connection_string(&self) -> &str {
        &self.config.connection_string
    }

    pub fn stock_minimo(&self) -> i64 {
        self.config.stock_minimo
    }

    pub fn dias_vencimiento(&self) -> i64 {
        self.config.dias_vencimiento
    }
}
