use crate::registry::SessionRegistry;
use crate::session::CallServices;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Collaborators handed to every accepted media stream
    pub services: CallServices,

    /// Host the provider reaches us on, used in generated TwiML
    pub public_host: String,
}

impl AppState {
    pub fn new(services: CallServices, public_host: impl Into<String>) -> Self {
        Self {
            services,
            public_host: public_host.into(),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.services.registry
    }
}
