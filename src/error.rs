use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrerenderError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation failed for {route}: {message}")]
    Navigation { route: String, message: String },

    #[error("Script evaluation failed: {0}")]
    Evaluation(String),

    #[error("CDP command failed: {0}")]
    Cdp(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Renderer is not initialized; call initialize() before rendering")]
    NotInitialized,
}

impl PrerenderError {
    pub fn navigation(route: impl Into<String>, message: impl Into<String>) -> Self {
        PrerenderError::Navigation {
            route: route.into(),
            message: message.into(),
        }
    }
}

impl From<chromiumoxide::error::CdpError> for PrerenderError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        PrerenderError::Cdp(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PrerenderError>;
