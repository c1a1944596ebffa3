//! Failures of the availability translation pipeline

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// The inbound SOAP envelope is missing something we need
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// No bearer token could be obtained for the scheduling backend
    #[error("Backend authentication failed: {0}")]
    AuthFailure(String),

    /// The backend call failed or replied with something we can't read
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
}
