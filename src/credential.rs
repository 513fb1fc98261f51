use crate::fal::FalApi;

/// The fal api key entered for this session. Never persisted.
#[derive(Clone, Debug, Default)]
pub struct CredentialHolder {
    is_set: bool,
}

impl CredentialHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure `client` with `secret`. Blank secrets are ignored.
    pub fn submit(&mut self, secret: &str, client: &dyn FalApi) -> bool {
        if secret.trim().is_empty() {
            return false;
        }

        client.configure(secret);
        self.is_set = true;
        tracing::info!("api key set");

        true
    }

    pub fn is_set(&self) -> bool {
        self.is_set
    }
}
