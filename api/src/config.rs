use serde::Deserialize;
use shared::listener::{Listener, ListenerError};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("listener: {0}")]
    Listener(ListenerError),

    #[error("admin_listener: {0}")]
    AdminListener(ListenerError),

    #[error("listener and admin_listener cannot share {0}")]
    AddressClash(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ApiConfig {
    pub listener: Listener,
    pub admin_listener: Listener,
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate().map_err(ValidationError::Listener)?;
        self.admin_listener
            .validate()
            .map_err(ValidationError::AdminListener)?;

        if self.listener.port == self.admin_listener.port
            && self.listener.host == self.admin_listener.host
        {
            return Err(ValidationError::AddressClash(self.listener.addr()));
        }
        Ok(())
    }
}
