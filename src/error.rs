//! Error types for the wallet session manager

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("StarKey extension not installed")]
    ExtensionNotInstalled,

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Wallet provider error: {0}")]
    Provider(String),

    #[error("Wallet not connected")]
    NotConnected,

    #[error("Login attempt superseded by a newer session change")]
    Superseded,

    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Errors that the user should hear about through a toast.
    ///
    /// A superseded attempt is silent: the newer attempt reports on its own.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Error::Superseded)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
