//! Best-effort mirroring of delivered notifications into a search store.
pub mod elasticsearch;
pub mod encoder;

pub use elasticsearch::ElasticsearchMirror;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("failed to encode mirror payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("mirror request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to read mirror response: {0}")]
    Body(#[source] reqwest::Error),

    #[error("mirror store answered {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}
