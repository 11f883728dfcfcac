use thiserror::Error;

/// Failures talking to the inference service itself.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    /// HTTP 404: the model does not exist or the key cannot use it.
    #[error("model '{model}' not found or not authorized for this API key: {message}")]
    ModelUnavailable { model: String, message: String },
}

#[derive(Debug, Error)]
pub enum InferError {
    /// Client could not be built from the resolved configuration.
    #[error("inference not configured: {0}")]
    NotConfigured(String),
    /// The service answered but returned no text.
    #[error("the inference service returned no text")]
    EmptyResponse,
    /// Text was not JSON, or did not match the expected schema.
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl InferError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        InferError::MalformedResponse(reason.into())
    }
}
