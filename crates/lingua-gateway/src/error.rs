use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("request to AI gateway failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI gateway returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("completion response contained no choices")]
    EmptyCompletion,

    #[error("audio transcoding failed: {0}")]
    Transcode(String),
}
