use crate::fields::{self, FieldGroup};

/// Kinds of immediate arguments an opcode takes, in encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Immediate {
    U8,
    I8,
    Field(FieldGroup),
    VarUint,
    Bytes,
    Label,
    Labels,
    IntBlock,
    ByteBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpSpec {
    pub name: &'static str,
    pub code: u8,
    pub immediates: &'static [Immediate],
}

const fn op(name: &'static str, code: u8, immediates: &'static [Immediate]) -> OpSpec {
    OpSpec {
        name,
        code,
        immediates,
    }
}

use Immediate::*;

const TXN: Immediate = Field(fields::TXN);
const GLOBAL: Immediate = Field(fields::GLOBAL);
const CURVE: Immediate = Field(fields::ECDSA_CURVE);
const B64: Immediate = Field(fields::BASE64_ENCODING);
const JSON: Immediate = Field(fields::JSON_REF);
const HOLDING: Immediate = Field(fields::ASSET_HOLDING);
const ASSET: Immediate = Field(fields::ASSET_PARAMS);
const APP: Immediate = Field(fields::APP_PARAMS);
const ACCT: Immediate = Field(fields::ACCT_PARAMS);
const VRF: Immediate = Field(fields::VRF_STANDARD);
const BLK: Immediate = Field(fields::BLOCK);

pub const PUSHBYTES: u8 = 0x80;
pub const PUSHINT: u8 = 0x81;

static OPCODES: &[OpSpec] = &[
    op("err", 0x00, &[]),
    op("sha256", 0x01, &[]),
    op("keccak256", 0x02, &[]),
    op("sha512_256", 0x03, &[]),
    op("ed25519verify", 0x04, &[]),
    op("ecdsa_verify", 0x05, &[CURVE]),
    op("ecdsa_pk_decompress", 0x06, &[CURVE]),
    op("ecdsa_pk_recover", 0x07, &[CURVE]),
    op("+", 0x08, &[]),
    op("-", 0x09, &[]),
    op("/", 0x0a, &[]),
    op("*", 0x0b, &[]),
    op("<", 0x0c, &[]),
    op(">", 0x0d, &[]),
    op("<=", 0x0e, &[]),
    op(">=", 0x0f, &[]),
    op("&&", 0x10, &[]),
    op("||", 0x11, &[]),
    op("==", 0x12, &[]),
    op("!=", 0x13, &[]),
    op("!", 0x14, &[]),
    op("len", 0x15, &[]),
    op("itob", 0x16, &[]),
    op("btoi", 0x17, &[]),
    op("%", 0x18, &[]),
    op("|", 0x19, &[]),
    op("&", 0x1a, &[]),
    op("^", 0x1b, &[]),
    op("~", 0x1c, &[]),
    op("mulw", 0x1d, &[]),
    op("addw", 0x1e, &[]),
    op("divmodw", 0x1f, &[]),
    op("intcblock", 0x20, &[IntBlock]),
    op("intc", 0x21, &[U8]),
    op("intc_0", 0x22, &[]),
    op("intc_1", 0x23, &[]),
    op("intc_2", 0x24, &[]),
    op("intc_3", 0x25, &[]),
    op("bytecblock", 0x26, &[ByteBlock]),
    op("bytec", 0x27, &[U8]),
    op("bytec_0", 0x28, &[]),
    op("bytec_1", 0x29, &[]),
    op("bytec_2", 0x2a, &[]),
    op("bytec_3", 0x2b, &[]),
    op("arg", 0x2c, &[U8]),
    op("arg_0", 0x2d, &[]),
    op("arg_1", 0x2e, &[]),
    op("arg_2", 0x2f, &[]),
    op("arg_3", 0x30, &[]),
    op("txn", 0x31, &[TXN]),
    op("global", 0x32, &[GLOBAL]),
    op("gtxn", 0x33, &[U8, TXN]),
    op("load", 0x34, &[U8]),
    op("store", 0x35, &[U8]),
    op("txna", 0x36, &[TXN, U8]),
    op("gtxna", 0x37, &[U8, TXN, U8]),
    op("gtxns", 0x38, &[TXN]),
    op("gtxnsa", 0x39, &[TXN, U8]),
    op("gload", 0x3a, &[U8, U8]),
    op("gloads", 0x3b, &[U8]),
    op("gaid", 0x3c, &[U8]),
    op("gaids", 0x3d, &[]),
    op("loads", 0x3e, &[]),
    op("stores", 0x3f, &[]),
    op("bnz", 0x40, &[Label]),
    op("bz", 0x41, &[Label]),
    op("b", 0x42, &[Label]),
    op("return", 0x43, &[]),
    op("assert", 0x44, &[]),
    op("bury", 0x45, &[U8]),
    op("popn", 0x46, &[U8]),
    op("dupn", 0x47, &[U8]),
    op("pop", 0x48, &[]),
    op("dup", 0x49, &[]),
    op("dup2", 0x4a, &[]),
    op("dig", 0x4b, &[U8]),
    op("swap", 0x4c, &[]),
    op("select", 0x4d, &[]),
    op("cover", 0x4e, &[U8]),
    op("uncover", 0x4f, &[U8]),
    op("concat", 0x50, &[]),
    op("substring", 0x51, &[U8, U8]),
    op("substring3", 0x52, &[]),
    op("getbit", 0x53, &[]),
    op("setbit", 0x54, &[]),
    op("getbyte", 0x55, &[]),
    op("setbyte", 0x56, &[]),
    op("extract", 0x57, &[U8, U8]),
    op("extract3", 0x58, &[]),
    op("extract_uint16", 0x59, &[]),
    op("extract_uint32", 0x5a, &[]),
    op("extract_uint64", 0x5b, &[]),
    op("replace2", 0x5c, &[U8]),
    op("replace3", 0x5d, &[]),
    op("base64_decode", 0x5e, &[B64]),
    op("json_ref", 0x5f, &[JSON]),
    op("balance", 0x60, &[]),
    op("app_opted_in", 0x61, &[]),
    op("app_local_get", 0x62, &[]),
    op("app_local_get_ex", 0x63, &[]),
    op("app_global_get", 0x64, &[]),
    op("app_global_get_ex", 0x65, &[]),
    op("app_local_put", 0x66, &[]),
    op("app_global_put", 0x67, &[]),
    op("app_local_del", 0x68, &[]),
    op("app_global_del", 0x69, &[]),
    op("asset_holding_get", 0x70, &[HOLDING]),
    op("asset_params_get", 0x71, &[ASSET]),
    op("app_params_get", 0x72, &[APP]),
    op("acct_params_get", 0x73, &[ACCT]),
    op("min_balance", 0x78, &[]),
    op("pushbytes", PUSHBYTES, &[Bytes]),
    op("pushint", PUSHINT, &[VarUint]),
    op("pushbytess", 0x82, &[ByteBlock]),
    op("pushints", 0x83, &[IntBlock]),
    op("ed25519verify_bare", 0x84, &[]),
    op("callsub", 0x88, &[Label]),
    op("retsub", 0x89, &[]),
    op("proto", 0x8a, &[U8, U8]),
    op("frame_dig", 0x8b, &[I8]),
    op("frame_bury", 0x8c, &[I8]),
    op("switch", 0x8d, &[Labels]),
    op("match", 0x8e, &[Labels]),
    op("shl", 0x90, &[]),
    op("shr", 0x91, &[]),
    op("sqrt", 0x92, &[]),
    op("bitlen", 0x93, &[]),
    op("exp", 0x94, &[]),
    op("expw", 0x95, &[]),
    op("bsqrt", 0x96, &[]),
    op("divw", 0x97, &[]),
    op("sha3_256", 0x98, &[]),
    op("b+", 0xa0, &[]),
    op("b-", 0xa1, &[]),
    op("b/", 0xa2, &[]),
    op("b*", 0xa3, &[]),
    op("b<", 0xa4, &[]),
    op("b>", 0xa5, &[]),
    op("b<=", 0xa6, &[]),
    op("b>=", 0xa7, &[]),
    op("b==", 0xa8, &[]),
    op("b!=", 0xa9, &[]),
    op("b%", 0xaa, &[]),
    op("b|", 0xab, &[]),
    op("b&", 0xac, &[]),
    op("b^", 0xad, &[]),
    op("b~", 0xae, &[]),
    op("bzero", 0xaf, &[]),
    op("log", 0xb0, &[]),
    op("itxn_begin", 0xb1, &[]),
    op("itxn_field", 0xb2, &[TXN]),
    op("itxn_submit", 0xb3, &[]),
    op("itxn", 0xb4, &[TXN]),
    op("itxna", 0xb5, &[TXN, U8]),
    op("itxn_next", 0xb6, &[]),
    op("gitxn", 0xb7, &[U8, TXN]),
    op("gitxna", 0xb8, &[U8, TXN, U8]),
    op("box_create", 0xb9, &[]),
    op("box_extract", 0xba, &[]),
    op("box_replace", 0xbb, &[]),
    op("box_del", 0xbc, &[]),
    op("box_len", 0xbd, &[]),
    op("box_get", 0xbe, &[]),
    op("box_put", 0xbf, &[]),
    op("txnas", 0xc0, &[TXN]),
    op("gtxnas", 0xc1, &[U8, TXN]),
    op("gtxnsas", 0xc2, &[TXN]),
    op("args", 0xc3, &[]),
    op("gloadss", 0xc4, &[]),
    op("itxnas", 0xc5, &[TXN]),
    op("gitxnas", 0xc6, &[U8, TXN]),
    op("vrf_verify", 0xd0, &[VRF]),
    op("block", 0xd1, &[BLK]),
];

pub fn lookup(name: &str) -> Option<&'static OpSpec> {
    OPCODES.iter().find(|spec| spec.name == name)
}

/// Integer names accepted wherever an integer constant is expected.
pub fn named_int(name: &str) -> Option<u64> {
    match name {
        "unknown" | "NoOp" => Some(0),
        "pay" | "OptIn" => Some(1),
        "keyreg" | "CloseOut" => Some(2),
        "acfg" | "ClearState" => Some(3),
        "axfer" | "UpdateApplication" => Some(4),
        "afrz" | "DeleteApplication" => Some(5),
        "appl" => Some(6),
        "stpf" => Some(7),
        _ => None,
    }
}
