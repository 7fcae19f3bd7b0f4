use serde::Deserialize;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("sqlite path cannot be empty")]
    EmptyPath,

    #[error("max_connections must be at least 1")]
    InvalidPoolSize,
}

fn default_max_connections() -> u32 {
    8
}

/// Which backend holds surveys and responses.
#[derive(Clone, Default, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum StoreConfig {
    #[default]
    Memory,
    Sqlite {
        path: PathBuf,
        #[serde(default = "default_max_connections")]
        max_connections: u32,
    },
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            StoreConfig::Memory => Ok(()),
            StoreConfig::Sqlite {
                path,
                max_connections,
            } => {
                if path.as_os_str().is_empty() {
                    return Err(ValidationError::EmptyPath);
                }
                if *max_connections == 0 {
                    return Err(ValidationError::InvalidPoolSize);
                }
                Ok(())
            }
        }
    }
}
