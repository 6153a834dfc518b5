pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    attempt_service::AttemptService, authoring_service::AuthoringService,
    catalog_service::CatalogService,
    credentials::Credentials, store::HttpQuizStore,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<Credentials>,
    pub attempt_service: AttemptService<HttpQuizStore>,
    pub authoring_service: AuthoringService<HttpQuizStore>,
    pub catalog_service: CatalogService<HttpQuizStore>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let credentials = Arc::new(match &config.api_token {
            Some(token) => Credentials::with_token(token.clone()),
            None => Credentials::new(),
        });
        let store = HttpQuizStore::new(
            &config.api_base_url,
            credentials.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;

        let attempt_service = AttemptService::new(store.clone(), config.submit_max_retries);
        let authoring_service = AuthoringService::new(store.clone());
        let catalog_service = CatalogService::new(store);

        Ok(Self {
            credentials,
            attempt_service,
            authoring_service,
            catalog_service,
        })
    }
}
