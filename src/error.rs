use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("species url has no numeric id: {0}")]
    MalformedSpeciesUrl(String),
    #[error("requested pokemon #{requested} but the api returned #{received}")]
    IdMismatch { requested: u32, received: u32 },
}
