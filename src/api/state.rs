use std::sync::Arc;

use crate::core::AppConfig;
use crate::core::gate::CredentialGate;
use crate::graph::{GraphClient, GraphSettings, TokenCache};

pub struct AppState {
    pub gate: CredentialGate,
    pub graph: GraphClient,
}

impl AppState {
    /// The token cache is shared by every clone of the graph client
    pub fn new(config: &AppConfig, tokens: Arc<TokenCache>) -> anyhow::Result<Self> {
        let gate = CredentialGate::from_config(config);
        let graph = GraphClient::new(GraphSettings::from_config(config), tokens)?;
        Ok(Self { gate, graph })
    }
}
