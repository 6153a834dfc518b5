use std::sync::RwLock;

/// Bearer credential for store calls. Constructed once at start-up and shared
/// by reference; its lifetime follows login and logout.
#[derive(Debug, Default)]
pub struct Credentials {
    token: RwLock<Option<String>>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let credentials = Self::new();
        credentials.login(token);
        credentials
    }

    pub fn login(&self, token: impl Into<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.into());
        tracing::debug!("Credentials updated");
    }

    pub fn logout(&self) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
        tracing::debug!("Credentials cleared");
    }

    pub fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer().is_some()
    }
}
