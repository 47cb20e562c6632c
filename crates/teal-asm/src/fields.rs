//! Named field immediates. A field's encoded value is its index in its group.

pub type FieldGroup = &'static [&'static str];

pub const TXN: FieldGroup = &[
    "Sender",
    "Fee",
    "FirstValid",
    "FirstValidTime",
    "LastValid",
    "Note",
    "Lease",
    "Receiver",
    "Amount",
    "CloseRemainderTo",
    "VotePK",
    "SelectionPK",
    "VoteFirst",
    "VoteLast",
    "VoteKeyDilution",
    "Type",
    "TypeEnum",
    "XferAsset",
    "AssetAmount",
    "AssetSender",
    "AssetReceiver",
    "AssetCloseTo",
    "GroupIndex",
    "TxID",
    "ApplicationID",
    "OnCompletion",
    "ApplicationArgs",
    "NumAppArgs",
    "Accounts",
    "NumAccounts",
    "ApprovalProgram",
    "ClearStateProgram",
    "RekeyTo",
    "ConfigAsset",
    "ConfigAssetTotal",
    "ConfigAssetDecimals",
    "ConfigAssetDefaultFrozen",
    "ConfigAssetUnitName",
    "ConfigAssetName",
    "ConfigAssetURL",
    "ConfigAssetMetadataHash",
    "ConfigAssetManager",
    "ConfigAssetReserve",
    "ConfigAssetFreeze",
    "ConfigAssetClawback",
    "FreezeAsset",
    "FreezeAssetAccount",
    "FreezeAssetFrozen",
    "Assets",
    "NumAssets",
    "Applications",
    "NumApplications",
    "GlobalNumUint",
    "GlobalNumByteSlice",
    "LocalNumUint",
    "LocalNumByteSlice",
    "ExtraProgramPages",
    "Nonparticipation",
    "Logs",
    "NumLogs",
    "CreatedAssetID",
    "CreatedApplicationID",
    "LastLog",
    "StateProofPK",
    "ApprovalProgramPages",
    "NumApprovalProgramPages",
    "ClearStateProgramPages",
    "NumClearStateProgramPages",
];

pub const GLOBAL: FieldGroup = &[
    "MinTxnFee",
    "MinBalance",
    "MaxTxnLife",
    "ZeroAddress",
    "GroupSize",
    "LogicSigVersion",
    "Round",
    "LatestTimestamp",
    "CurrentApplicationID",
    "CreatorAddress",
    "CurrentApplicationAddress",
    "GroupID",
    "OpcodeBudget",
    "CallerApplicationID",
    "CallerApplicationAddress",
    "AssetCreateMinBalance",
    "AssetOptInMinBalance",
    "GenesisHash",
];

pub const ASSET_HOLDING: FieldGroup = &["AssetBalance", "AssetFrozen"];

pub const ASSET_PARAMS: FieldGroup = &[
    "AssetTotal",
    "AssetDecimals",
    "AssetDefaultFrozen",
    "AssetUnitName",
    "AssetName",
    "AssetURL",
    "AssetMetadataHash",
    "AssetManager",
    "AssetReserve",
    "AssetFreeze",
    "AssetClawback",
    "AssetCreator",
];

pub const APP_PARAMS: FieldGroup = &[
    "AppApprovalProgram",
    "AppClearStateProgram",
    "AppGlobalNumUint",
    "AppGlobalNumByteSlice",
    "AppLocalNumUint",
    "AppLocalNumByteSlice",
    "AppExtraProgramPages",
    "AppCreator",
    "AppAddress",
];

pub const ACCT_PARAMS: FieldGroup = &[
    "AcctBalance",
    "AcctMinBalance",
    "AcctAuthAddr",
    "AcctTotalNumUint",
    "AcctTotalNumByteSlice",
    "AcctTotalExtraAppPages",
    "AcctTotalAppsCreated",
    "AcctTotalAppsOptedIn",
    "AcctTotalAssetsCreated",
    "AcctTotalAssets",
    "AcctTotalBoxes",
    "AcctTotalBoxBytes",
];

pub const ECDSA_CURVE: FieldGroup = &["Secp256k1", "Secp256r1"];

pub const BASE64_ENCODING: FieldGroup = &["URLEncoding", "StdEncoding"];

pub const JSON_REF: FieldGroup = &["JSONString", "JSONUint64", "JSONObject"];

pub const VRF_STANDARD: FieldGroup = &["VrfAlgorand"];

pub const BLOCK: FieldGroup = &["BlkSeed", "BlkTimestamp"];

/// Resolves a field immediate given either by name or by numeric index.
pub fn resolve(group: FieldGroup, text: &str) -> Option<u8> {
    if let Ok(index) = text.parse::<usize>() {
        return (index < group.len()).then(|| u8::try_from(index).ok()).flatten();
    }

    group
        .iter()
        .position(|name| *name == text)
        .and_then(|index| u8::try_from(index).ok())
}
