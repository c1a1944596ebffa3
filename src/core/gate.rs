//! Credential check for the calendar client's token request.
//!
//! NOTE: This impersonates an OAuth token endpoint. The token handed
//! back is a fixed string and nothing downstream validates it.

use super::AppConfig;

#[derive(Clone, Debug)]
pub struct CredentialGate {
    expected_client_id: String,
    expected_client_secret: String,
    access_token: String,
}

impl CredentialGate {
    pub fn new(client_id: &str, client_secret: &str, access_token: &str) -> Self {
        Self {
            expected_client_id: client_id.to_string(),
            expected_client_secret: client_secret.to_string(),
            access_token: access_token.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.gate_client_id,
            &config.gate_client_secret,
            &config.gate_access_token,
        )
    }

    /// Returns the access token only when both values match exactly.
    /// `None` means unauthenticated and is not an error.
    pub fn authenticate(
        &self,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Option<String> {
        if client_id != Some(self.expected_client_id.as_str())
            || client_secret != Some(self.expected_client_secret.as_str())
        {
            tracing::info!("Wrong oauth credentials");
            return None;
        }
        Some(self.access_token.clone())
    }
}
