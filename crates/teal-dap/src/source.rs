//! Resolves where a debug session gets its execution data from.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::algod::{DEFAULT_ALGOD, LiveEndpoint};
use crate::error::SetupError;
use crate::mirror::Mirror;
use crate::protocol::{DebugConfig, SimulateResponse};

/// Command-line inputs of `tealsp dbg`.
///
/// `algod` distinguishes an absent flag (`None`) from an explicit empty
/// address (`Some("")`), which disables the command-line live endpoint.
#[derive(Debug, Clone, Default)]
pub struct DebugSources {
    pub debug_log: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub algod: Option<String>,
    pub algod_token: String,
    pub replay: Option<PathBuf>,
}

/// One configuration effect applied to a debug session under construction.
#[derive(Debug, Clone)]
pub enum DebugOption {
    Mirror(Mirror),
    Config(DebugConfig),
    Live(LiveEndpoint),
    Replay(SimulateResponse),
}

/// Produces the option list in application order: mirror, config, live
/// endpoint, replay. Both a live endpoint and a replay may be present.
pub fn resolve(sources: &DebugSources) -> Result<Vec<DebugOption>, SetupError> {
    let mut options = Vec::new();

    if let Some(path) = &sources.debug_log {
        let mirror = Mirror::create(path).map_err(|source| SetupError::DebugSink {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "Mirroring debug adapter traffic");
        options.push(DebugOption::Mirror(mirror));
    }

    let mut config_has_algod = false;
    if let Some(path) = &sources.config {
        let text = fs::read_to_string(path).map_err(|source| SetupError::ReadConfig {
            path: path.clone(),
            source,
        })?;
        let config: DebugConfig = parse(path, &text, |path, source| SetupError::ParseConfig { path, source })?;
        config_has_algod = config.algod.is_some();
        options.push(DebugOption::Config(config));
    }

    let address = match sources.algod.as_deref() {
        Some(address) => Some(address),
        None if sources.replay.is_none() && !config_has_algod => Some(DEFAULT_ALGOD),
        None => None,
    };

    if let Some(address) = address.filter(|a| !a.is_empty()) {
        let endpoint =
            LiveEndpoint::parse(address, &sources.algod_token).map_err(|reason| SetupError::Endpoint {
                address: address.to_string(),
                reason,
            })?;
        debug!(url = %endpoint.url, "Using live algod endpoint");
        options.push(DebugOption::Live(endpoint));
    }

    if let Some(path) = &sources.replay {
        let text = fs::read_to_string(path).map_err(|source| SetupError::ReadReplay {
            path: path.clone(),
            source,
        })?;
        let response: SimulateResponse =
            parse(path, &text, |path, source| SetupError::ParseReplay { path, source })?;
        options.push(DebugOption::Replay(response));
    }

    Ok(options)
}

fn parse<T: DeserializeOwned>(
    path: &Path,
    text: &str,
    error: impl FnOnce(PathBuf, serde_json::Error) -> SetupError,
) -> Result<T, SetupError> {
    serde_json::from_str(text).map_err(|source| error(path.to_path_buf(), source))
}
