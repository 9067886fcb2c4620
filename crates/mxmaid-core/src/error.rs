pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("payload extraction failed: {reason}")]
    Extraction { reason: String },

    #[error("no diagram pages found in input")]
    NoPages,

    #[error("diagram parse error: {message}")]
    Parse { message: String },

    #[error("page index {index} out of range (available: 0..{pages})")]
    PageIndex { index: usize, pages: usize },

    #[error("conversion failed: {message}")]
    Conversion { message: String },
}
