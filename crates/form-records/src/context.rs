use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::pdf::PdfRenderer;
use crate::store::DocumentStore;

/// Everything a form page needs, built once at startup
#[derive(Debug)]
pub struct AppContext<S, R> {
    config: AppConfig,
    store: S,
    renderer: R,
}

impl<S: DocumentStore, R: PdfRenderer> AppContext<S, R> {
    pub fn new(config: AppConfig, store: S, renderer: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            renderer,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}
