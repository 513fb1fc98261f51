use crate::{
    config::AppConfig,
    credential::CredentialHolder,
    fal::{FalApi, FalClient},
    staging::ImageStaging,
    workflow::progress::ProgressState,
};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    config: AppConfig,
    client: Arc<dyn FalApi>,
    credential: Arc<RwLock<CredentialHolder>>,
    staging: Arc<RwLock<ImageStaging>>,
    progress: Arc<RwLock<ProgressState>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let client = FalClient::new(&config);
        Self::with_client(config, Arc::new(client))
    }

    pub fn with_client(config: AppConfig, client: Arc<dyn FalApi>) -> Self {
        Self {
            config,
            client,
            credential: Arc::new(RwLock::new(CredentialHolder::new())),
            staging: Arc::new(RwLock::new(ImageStaging::new())),
            progress: Arc::new(RwLock::new(ProgressState::default())),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> Arc<dyn FalApi> {
        self.client.clone()
    }

    pub fn credential(&self) -> Arc<RwLock<CredentialHolder>> {
        self.credential.clone()
    }

    pub fn staging(&self) -> Arc<RwLock<ImageStaging>> {
        self.staging.clone()
    }

    pub fn progress(&self) -> Arc<RwLock<ProgressState>> {
        self.progress.clone()
    }
}
