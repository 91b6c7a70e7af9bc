#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog is misconfigured: {0}")]
    Config(String),
    #[error("catalog entry not found: {0}")]
    NotFound(String),
    #[error("catalog responded with HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("catalog response is invalid: {0}")]
    InvalidResponse(String),
}
