//! Public types for the token API
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Serializes to `{}` when the credentials didn't match
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}
