#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("No readable text in the selected pages")]
    NoReadableText,

    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),
}
