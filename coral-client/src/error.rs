use crate::api::Error as ApiError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("No thread level at depth {0}")]
    UnknownDepth(u8),

    #[error("Level at depth {depth} does not embed the selection of the next level")]
    ShapeMismatch { depth: u8 },

    #[error("Invalid thread levels: {0}")]
    InvalidLevels(String),
}

impl Error {
    /// Code reported through the lifecycle event error channel
    pub fn code(&self) -> &'static str {
        match self {
            Error::Api(err) => err.code(),
            Error::Anyhow(_) => "INTERNAL_ERROR",
            Error::UnknownDepth(_) | Error::ShapeMismatch { .. } | Error::InvalidLevels(_) => {
                "INVALID_THREAD_LEVELS"
            }
        }
    }
}
