use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    // Credentials the calendar client presents to `/token`
    pub gate_client_id: String,
    pub gate_client_secret: String,
    pub gate_access_token: String,
    // Credentials for the scheduling backend (client-credentials grant)
    pub graph_client_id: String,
    pub graph_client_secret: String,
    pub graph_authority: String,
    pub graph_scope: String,
    pub graph_api_url: String,
    pub graph_timeout_secs: u64,
    pub time_zone: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let gate_client_id =
            env::var("RELAY_GATE_CLIENT_ID").expect("Missing env var RELAY_GATE_CLIENT_ID");
        let gate_client_secret = env::var("RELAY_GATE_CLIENT_SECRET")
            .expect("Missing env var RELAY_GATE_CLIENT_SECRET");
        let gate_access_token = env::var("RELAY_GATE_ACCESS_TOKEN")
            .unwrap_or_else(|_| "some_access_token".to_string());
        let graph_client_id =
            env::var("RELAY_GRAPH_CLIENT_ID").expect("Missing env var RELAY_GRAPH_CLIENT_ID");
        let graph_client_secret = env::var("RELAY_GRAPH_CLIENT_SECRET")
            .expect("Missing env var RELAY_GRAPH_CLIENT_SECRET");
        // For Office365 this looks like https://login.microsoftonline.com/<tenant id>
        let graph_authority =
            env::var("RELAY_GRAPH_AUTHORITY").expect("Missing env var RELAY_GRAPH_AUTHORITY");
        let graph_scope = env::var("RELAY_GRAPH_SCOPE")
            .unwrap_or_else(|_| "https://graph.microsoft.com/.default".to_string());
        let graph_api_url = env::var("RELAY_GRAPH_API_URL")
            .unwrap_or_else(|_| "https://graph.microsoft.com/v1.0".to_string());
        let graph_timeout_secs = env::var("RELAY_GRAPH_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse().ok())
            .unwrap_or(30);
        let time_zone =
            env::var("RELAY_TIME_ZONE").unwrap_or_else(|_| "Pacific Standard Time".to_string());

        Self {
            gate_client_id,
            gate_client_secret,
            gate_access_token,
            graph_client_id,
            graph_client_secret,
            graph_authority,
            graph_scope,
            graph_api_url,
            graph_timeout_secs,
            time_zone,
        }
    }
}
