use std::fmt;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Static debugger configuration loaded from `--config`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugConfig {
    /// TEAL source used to map program counters to lines.
    pub program: Option<PathBuf>,
    pub stop_on_entry: Option<bool>,
    pub algod: Option<AlgodConfig>,
    /// Body of the algod simulate request used in live mode.
    pub simulate: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AlgodConfig {
    pub address: String,
    #[serde(default)]
    pub token: String,
}

/// Launch arguments for DAP launch configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchArgs {
    pub program: Option<PathBuf>,
    pub stop_on_entry: Option<bool>,
}

/// The subset of algod's simulate response needed to replay execution.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimulateResponse {
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub last_round: u64,
    #[serde(default)]
    pub txn_groups: Vec<TxnGroupResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TxnGroupResult {
    #[serde(default)]
    pub txn_results: Vec<TxnResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<Vec<u64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TxnResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec_trace: Option<ExecTrace>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExecTrace {
    #[serde(default)]
    pub logic_sig_trace: Vec<OpcodeTrace>,
    #[serde(default)]
    pub approval_program_trace: Vec<OpcodeTrace>,
    #[serde(default)]
    pub clear_state_program_trace: Vec<OpcodeTrace>,
    #[serde(default)]
    pub inner_trace: Vec<ExecTrace>,
}

/// Effects of executing the opcode at `pc`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OpcodeTrace {
    pub pc: u64,
    #[serde(default)]
    pub stack_pop_count: u64,
    #[serde(default)]
    pub stack_additions: Vec<AvmValue>,
    #[serde(default)]
    pub scratch_changes: Vec<ScratchChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScratchChange {
    pub slot: u64,
    pub new_value: AvmValue,
}

/// An AVM stack value. `kind` is 1 for bytes and 2 for uint64.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AvmValue {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uint: Option<u64>,
}

impl AvmValue {
    pub const BYTES: u8 = 1;
    pub const UINT: u8 = 2;

    pub fn uint(value: u64) -> Self {
        Self {
            kind: Self::UINT,
            bytes: None,
            uint: Some(value),
        }
    }

    pub fn bytes(value: &[u8]) -> Self {
        Self {
            kind: Self::BYTES,
            bytes: Some(STANDARD.encode(value)),
            uint: None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        if self.kind == Self::BYTES { "bytes" } else { "uint64" }
    }
}

impl fmt::Display for AvmValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind != Self::BYTES {
            return write!(f, "{}", self.uint.unwrap_or_default());
        }

        let encoded = self.bytes.as_deref().unwrap_or_default();
        match STANDARD.decode(encoded) {
            Ok(bytes) => {
                write!(f, "0x")?;
                bytes.iter().try_for_each(|b| write!(f, "{:02x}", b))
            }
            Err(_) => write!(f, "{}", encoded),
        }
    }
}
