//! Shared handler state.

use std::sync::Arc;
use storybook_generator::Services;
use storybook_interface::TokenVerifier;

/// Everything a handler needs: the domain services and the token verifier.
#[derive(Clone)]
pub struct AppState {
    /// Domain services
    pub services: Services,
    /// Bearer token verifier
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    /// Bundle services and verifier.
    pub fn new(services: Services, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { services, verifier }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}
