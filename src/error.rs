pub type Result<T> = std::result::Result<T, AxialError>;

#[derive(Debug, thiserror::Error)]
pub enum AxialError {
    /// A factory was handed a shape it cannot build a value from.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("invalid chart configuration: {message}")]
    Config { message: String },

    /// A queued draw closure failed; the rest of that flush was abandoned.
    #[error("draw closure failed: {message}")]
    Draw { message: String },

    #[error("axial encountered a backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AxialError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        AxialError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn draw(message: impl Into<String>) -> Self {
        AxialError::Draw {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for AxialError {
    fn from(err: std::io::Error) -> Self {
        AxialError::Backend(Box::new(err))
    }
}

impl From<serde_json::Error> for AxialError {
    fn from(err: serde_json::Error) -> Self {
        AxialError::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "cairo")]
impl From<cairo::Error> for AxialError {
    fn from(err: cairo::Error) -> Self {
        AxialError::Backend(Box::new(err))
    }
}

#[cfg(feature = "cairo")]
impl From<cairo::IoError> for AxialError {
    fn from(err: cairo::IoError) -> Self {
        AxialError::Backend(Box::new(err))
    }
}
