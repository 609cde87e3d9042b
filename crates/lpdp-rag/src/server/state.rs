//! Application state for the RAG server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::server::rate_limit::RateLimiter;
use crate::service::{RagService, SERVICE_UNAVAILABLE};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Assistant facade; absent when initialization failed
    service: Option<Arc<RagService>>,
    /// Cooldown between questions of one session
    rate_limiter: RateLimiter,
}

impl AppState {
    /// Build the service from configuration.
    ///
    /// A failed initialization is logged and the server still starts, so
    /// question routes answer 503 instead of the process exiting.
    pub fn new(config: RagConfig) -> Self {
        tracing::info!("Initializing RAG application state...");

        let service = match RagService::from_config(&config) {
            Ok(service) => {
                tracing::info!(
                    "RAG service ready (llm available: {})",
                    service.llm_available()
                );
                Some(Arc::new(service))
            }
            Err(e) => {
                tracing::error!("Failed to initialize RAG service: {}", e);
                None
            }
        };

        Self::with_service(config, service)
    }

    /// State around an already-built service
    pub fn with_service(config: RagConfig, service: Option<Arc<RagService>>) -> Self {
        let rate_limiter = RateLimiter::from_secs(config.validation.rate_limit_secs);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                service,
                rate_limiter,
            }),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn service(&self) -> Option<&Arc<RagService>> {
        self.inner.service.as_ref()
    }

    /// The service, or `ServiceUnavailable`
    pub fn require_service(&self) -> Result<&Arc<RagService>> {
        self.service()
            .ok_or_else(|| Error::unavailable(SERVICE_UNAVAILABLE))
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.inner.rate_limiter
    }

    /// Service initialized and a language model configured
    pub fn is_ready(&self) -> bool {
        self.service().map(|s| s.llm_available()).unwrap_or(false)
    }
}
