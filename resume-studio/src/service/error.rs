//! Errors returned by the resume service client

use thiserror::Error;

/// Failures talking to the resume service
///
/// Every variant is local to the action that triggered it and is safe to
/// retry by repeating the action.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request could not be sent or the response not read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status
    #[error("Service error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// The `detail` of the error body, else its raw text
        message: String,
    },

    /// The configured base URL cannot have endpoint paths appended
    #[error("Invalid service URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL as configured
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// A 2xx response whose body lacks the expected content
    #[error("Unexpected service response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Short message suitable for showing next to the control that failed
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Http(e) if e.is_timeout() => {
                "The service took too long to respond. Please try again.".to_string()
            }
            ServiceError::Http(_) => "Could not reach the resume service.".to_string(),
            ServiceError::Api { message, .. } if !message.is_empty() => message.clone(),
            ServiceError::Api { status, .. } => format!("The service returned status {}", status),
            ServiceError::InvalidUrl { url, .. } => format!("Invalid service URL: {}", url),
            ServiceError::Decode(_) => "The service returned an unexpected response.".to_string(),
        }
    }
}
