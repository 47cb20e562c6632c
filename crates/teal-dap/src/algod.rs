use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{Value, json};
use tracing::{debug, info};
use url::Url;

use crate::error::AlgodError;
use crate::protocol::SimulateResponse;

pub const DEFAULT_ALGOD: &str = "https://testnet-api.algonode.cloud";
pub const TOKEN_HEADER: &str = "X-Algo-API-Token";
const SIMULATE_PATH: &str = "v2/transactions/simulate";

/// A node endpoint plus its API token. An empty token means unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveEndpoint {
    pub url: Url,
    pub token: String,
}

impl LiveEndpoint {
    /// Parses an `http(s)` endpoint address.
    pub fn parse(address: &str, token: &str) -> Result<Self, String> {
        let url = Url::parse(address).map_err(|e| e.to_string())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("unsupported scheme {:?}", url.scheme()));
        }

        Ok(Self {
            url,
            token: token.to_string(),
        })
    }

    fn simulate_url(&self) -> String {
        format!(
            "{}/{}?format=json",
            self.url.as_str().trim_end_matches('/'),
            SIMULATE_PATH
        )
    }
}

#[derive(Debug)]
pub struct AlgodClient {
    client: Client,
    endpoint: LiveEndpoint,
}

impl AlgodClient {
    pub fn new(endpoint: LiveEndpoint) -> Result<Self, AlgodError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("tealsp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, endpoint })
    }

    /// Runs `request` through the node's simulate endpoint with execution tracing
    /// switched on.
    pub fn simulate(&self, request: &Value) -> Result<SimulateResponse, AlgodError> {
        let mut body = request.clone();
        enable_exec_trace(&mut body)?;

        let url = self.endpoint.simulate_url();
        info!(%url, "Requesting simulated execution");

        let mut builder = self.client.post(&url).json(&body);
        if !self.endpoint.token.is_empty() {
            builder = builder.header(TOKEN_HEADER, self.endpoint.token.as_str());
        }

        let response = builder.send()?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(AlgodError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let simulated: SimulateResponse = response.json()?;
        debug!(groups = simulated.txn_groups.len(), "Received simulate response");
        Ok(simulated)
    }
}

/// Asks the node to record stack and scratch changes for every opcode.
fn enable_exec_trace(body: &mut Value) -> Result<(), AlgodError> {
    let object = body.as_object_mut().ok_or(AlgodError::InvalidRequest)?;
    object.insert(
        "exec-trace-config".to_string(),
        json!({
            "enable": true,
            "stack-change": true,
            "scratch-change": true,
            "state-change": true,
        }),
    );
    object
        .entry("allow-empty-signatures")
        .or_insert(Value::Bool(true));
    Ok(())
}
