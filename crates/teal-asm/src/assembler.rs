use std::collections::{HashMap, HashSet};

use crate::encoding::{self, put_varuint};
use crate::error::{AsmError, AssembleError, LineError, Warning};
use crate::fields;
use crate::lexer::{self, Token, TokenKind};
use crate::opcodes::{self, Immediate, OpSpec, PUSHBYTES, PUSHINT};
use crate::source_map::SourceMap;

pub const DEFAULT_VERSION: u64 = 1;
pub const MAX_VERSION: u64 = 11;
pub const MAX_PROGRAM_SIZE: usize = 8192;

/// Result carrying the column of the token that caused the error.
type Located<T> = Result<T, (usize, AsmError)>;

/// The outcome of assembling one source text.
///
/// `bytecode` is empty whenever `failure` is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    pub version: u64,
    pub bytecode: Vec<u8>,
    pub errors: Vec<LineError>,
    pub warnings: Vec<Warning>,
    pub failure: Option<AssembleError>,
    pub source_map: SourceMap,
}

impl Assembly {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty() && self.failure.is_none()
    }
}

/// Assembles TEAL source text. Problems are reported through the returned
/// [`Assembly`], never by panicking.
pub fn assemble(source: &str) -> Assembly {
    Assembler::default().run(source)
}

#[derive(Debug)]
struct LabelRef {
    name: String,
    line: usize,
    column: usize,
    /// Code offset of the 2-byte slot to patch.
    at: usize,
    /// Code offset the branch is relative to.
    base: usize,
}

#[derive(Debug, Default)]
struct Encoded {
    bytes: Vec<u8>,
    /// (label, column, offset of the slot within `bytes`)
    labels: Vec<(String, usize, usize)>,
}

impl Encoded {
    fn with_opcode(code: u8) -> Self {
        Self {
            bytes: vec![code],
            labels: Vec::new(),
        }
    }

    fn push_bytes(bytes: &[u8]) -> Self {
        let mut out = Self::with_opcode(PUSHBYTES);
        put_varuint(&mut out.bytes, bytes.len() as u64);
        out.bytes.extend_from_slice(bytes);
        out
    }

    fn label(&mut self, token: &Token) -> Located<()> {
        let name = token
            .word()
            .filter(|w| !w.is_empty())
            .ok_or_else(|| (token.column, AsmError::InvalidLabel(token.text())))?;
        self.labels.push((name.to_string(), token.column, self.bytes.len()));
        self.bytes.extend_from_slice(&[0, 0]);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Assembler {
    version: Option<u64>,
    code: Vec<u8>,
    /// (code offset, line) of every emitted instruction.
    instructions: Vec<(usize, usize)>,
    labels: HashMap<String, usize>,
    definitions: Vec<String>,
    references: Vec<LabelRef>,
    errors: Vec<LineError>,
    seen_instruction: bool,
}

impl Assembler {
    fn run(mut self, source: &str) -> Assembly {
        for (index, text) in source.lines().enumerate() {
            self.line(index + 1, text);
        }
        self.resolve_labels();
        self.errors.sort_by_key(|e| e.line);

        let mut warnings = Vec::new();
        let version = self.version.unwrap_or_else(|| {
            warnings.push(Warning::MissingVersion(DEFAULT_VERSION));
            DEFAULT_VERSION
        });
        let referenced: HashSet<&str> = self.references.iter().map(|r| r.name.as_str()).collect();
        warnings.extend(
            self.definitions
                .iter()
                .filter(|name| !referenced.contains(name.as_str()))
                .map(|name| Warning::UnusedLabel(name.clone())),
        );

        let mut bytecode = Vec::with_capacity(self.code.len() + 1);
        put_varuint(&mut bytecode, version);
        let prefix = bytecode.len();
        bytecode.extend_from_slice(&self.code);

        let mut source_map = SourceMap::default();
        for (offset, line) in &self.instructions {
            source_map.push(prefix + offset, *line);
        }

        let failure = if !self.errors.is_empty() {
            Some(AssembleError::LineErrors(self.errors.len()))
        } else if bytecode.len() > MAX_PROGRAM_SIZE {
            Some(AssembleError::ProgramTooLarge {
                size: bytecode.len(),
                max: MAX_PROGRAM_SIZE,
            })
        } else {
            None
        };

        if failure.is_some() {
            bytecode.clear();
        }

        Assembly {
            version,
            bytecode,
            errors: self.errors,
            warnings,
            failure,
            source_map,
        }
    }

    fn error(&mut self, line: usize, column: usize, cause: AsmError) {
        self.errors.push(LineError::new(line, column, cause));
    }

    fn line(&mut self, line: usize, text: &str) {
        let tokens = match lexer::tokenize(text) {
            Ok(tokens) => tokens,
            Err((column, cause)) => return self.error(line, column, cause),
        };

        let mut rest = tokens.as_slice();
        if let Some((first, tail)) = rest.split_first()
            && let Some(label) = first.word().and_then(|w| w.strip_suffix(':'))
        {
            if let Err(cause) = self.define_label(label) {
                self.error(line, first.column, cause);
            }
            rest = tail;
        }

        let Some((op, args)) = rest.split_first() else {
            return;
        };

        let result = match &op.kind {
            TokenKind::Str(_) => Err((op.column, AsmError::UnknownOpcode(op.text()))),
            TokenKind::Word(name) if name.starts_with('#') => self.pragma(op, name, args),
            TokenKind::Word(name) => {
                self.seen_instruction = true;
                self.instruction(line, op, name, args)
            }
        };

        if let Err((column, cause)) = result {
            self.error(line, column, cause);
        }
    }

    fn define_label(&mut self, name: &str) -> Result<(), AsmError> {
        if name.is_empty() || name.contains([':', '"', '#']) {
            return Err(AsmError::InvalidLabel(name.to_string()));
        }
        if self.labels.contains_key(name) {
            return Err(AsmError::DuplicateLabel(name.to_string()));
        }

        self.labels.insert(name.to_string(), self.code.len());
        self.definitions.push(name.to_string());
        Ok(())
    }

    fn pragma(&mut self, op: &Token, name: &str, args: &[Token]) -> Located<()> {
        let unknown = || {
            let words = std::iter::once(name.to_string())
                .chain(args.iter().map(Token::text))
                .collect::<Vec<_>>()
                .join(" ");
            (op.column, AsmError::UnknownPragma(words))
        };

        if name != "#pragma" {
            return Err(unknown());
        }
        let [kind, value] = args else {
            return Err(unknown());
        };
        if kind.word() != Some("version") {
            return Err((kind.column, AsmError::UnknownPragma(kind.text())));
        }

        let text = value.text();
        let version = text
            .parse::<u64>()
            .ok()
            .filter(|v| (1..=MAX_VERSION).contains(v))
            .ok_or_else(|| (value.column, AsmError::UnsupportedVersion(text.clone())))?;

        if self.seen_instruction {
            return Err((op.column, AsmError::PragmaAfterInstructions));
        }

        self.version = Some(version);
        Ok(())
    }

    fn instruction(&mut self, line: usize, op: &Token, name: &str, args: &[Token]) -> Located<()> {
        let encoded = match name {
            "int" => pseudo_int(op, args),
            "byte" => pseudo_byte(op, args),
            "addr" => pseudo_addr(op, args),
            "method" => pseudo_method(op, args),
            _ => {
                let spec = opcodes::lookup(name)
                    .ok_or_else(|| (op.column, AsmError::UnknownOpcode(name.to_string())))?;
                encode(spec, op, args)
            }
        }?;

        let start = self.code.len();
        let base = start + encoded.bytes.len();
        for (label, column, at) in encoded.labels {
            self.references.push(LabelRef {
                name: label,
                line,
                column,
                at: start + at,
                base,
            });
        }
        self.code.extend(encoded.bytes);
        self.instructions.push((start, line));
        Ok(())
    }

    fn resolve_labels(&mut self) {
        for reference in &self.references {
            let Some(&target) = self.labels.get(&reference.name) else {
                self.errors.push(LineError::new(
                    reference.line,
                    reference.column,
                    AsmError::UndefinedLabel(reference.name.clone()),
                ));
                continue;
            };

            let delta = target as i64 - reference.base as i64;
            match i16::try_from(delta) {
                Ok(offset) => {
                    if let Some(slot) = self.code.get_mut(reference.at..reference.at + 2) {
                        slot.copy_from_slice(&offset.to_be_bytes());
                    }
                }
                Err(_) => self.errors.push(LineError::new(
                    reference.line,
                    reference.column,
                    AsmError::BranchTooFar(reference.name.clone()),
                )),
            }
        }
    }
}

/// Walks the immediate arguments of one instruction.
struct Args<'a> {
    op: &'a str,
    column: usize,
    expected: String,
    tokens: &'a [Token],
    next: usize,
}

impl<'a> Args<'a> {
    fn new(op: &'a str, column: usize, expected: usize, tokens: &'a [Token]) -> Self {
        Self {
            op,
            column,
            expected: expected.to_string(),
            tokens,
            next: 0,
        }
    }

    fn count_error(&self) -> (usize, AsmError) {
        (
            self.column,
            AsmError::ImmediateCount {
                op: self.op.to_string(),
                expected: self.expected.clone(),
            },
        )
    }

    fn next(&mut self) -> Located<&'a Token> {
        let token = self.tokens.get(self.next).ok_or_else(|| self.count_error())?;
        self.next += 1;
        Ok(token)
    }

    fn rest(&mut self) -> &'a [Token] {
        let rest = self.tokens.get(self.next..).unwrap_or_default();
        self.next = self.tokens.len();
        rest
    }

    fn is_done(&self) -> bool {
        self.next >= self.tokens.len()
    }

    fn finish(&self) -> Located<()> {
        if self.is_done() { Ok(()) } else { Err(self.count_error()) }
    }

    /// A byte constant in any of its forms: `0x..`, `"..."`, `base64 ..`, `b64(..)`, ...
    fn byte_constant(&mut self) -> Located<Vec<u8>> {
        let token = self.next()?;
        let word = match &token.kind {
            TokenKind::Str(bytes) => return Ok(bytes.clone()),
            TokenKind::Word(word) => word.as_str(),
        };

        if let Some(hex) = word.strip_prefix("0x") {
            return encoding::decode_hex(hex)
                .ok_or_else(|| (token.column, AsmError::InvalidByteConstant(word.to_string())));
        }

        if let Some((name, payload)) = word.strip_suffix(')').and_then(|w| w.split_once('(')) {
            return decode_named(name, payload).map_err(|e| (token.column, e));
        }

        if matches!(word, "base64" | "b64" | "base32" | "b32") {
            let payload = self.next()?;
            return decode_named(word, &payload.text()).map_err(|e| (payload.column, e));
        }

        Err((token.column, AsmError::InvalidByteConstant(word.to_string())))
    }
}

fn decode_named(name: &str, payload: &str) -> Result<Vec<u8>, AsmError> {
    let decoded = match name {
        "base64" | "b64" => encoding::decode_base64(payload),
        "base32" | "b32" => encoding::decode_base32(payload),
        other => return Err(AsmError::UnsupportedEncoding(other.to_string())),
    };
    decoded.ok_or_else(|| AsmError::InvalidByteConstant(payload.to_string()))
}

fn parse_uint(token: &Token) -> Located<u64> {
    let text = token.text();
    let parsed = if let Some(value) = opcodes::named_int(&text) {
        Some(value)
    } else if let Some(hex) = text.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(octal) = text.strip_prefix('0').filter(|rest| !rest.is_empty()) {
        u64::from_str_radix(octal, 8).ok()
    } else {
        text.parse().ok()
    };

    parsed.ok_or_else(|| (token.column, AsmError::InvalidInteger(text)))
}

fn parse_u8(token: &Token) -> Located<u8> {
    let value = parse_uint(token)?;
    u8::try_from(value).map_err(|_| {
        (
            token.column,
            AsmError::OutOfRange {
                value: value.into(),
                max: u8::MAX.into(),
            },
        )
    })
}

fn parse_i8(token: &Token) -> Located<u8> {
    let text = token.text();
    let value = text
        .parse::<i64>()
        .map_err(|_| (token.column, AsmError::InvalidInteger(text.clone())))?;
    let value = i8::try_from(value).map_err(|_| {
        (
            token.column,
            AsmError::SignedOutOfRange {
                value: value.into(),
                min: i8::MIN.into(),
                max: i8::MAX.into(),
            },
        )
    })?;
    Ok(value.to_be_bytes()[0])
}

fn encode(spec: &OpSpec, op: &Token, tokens: &[Token]) -> Located<Encoded> {
    let mut out = Encoded::with_opcode(spec.code);
    let mut args = Args::new(spec.name, op.column, spec.immediates.len(), tokens);

    for immediate in spec.immediates {
        match immediate {
            Immediate::U8 => out.bytes.push(parse_u8(args.next()?)?),
            Immediate::I8 => out.bytes.push(parse_i8(args.next()?)?),
            Immediate::Field(group) => {
                let token = args.next()?;
                let text = token.text();
                let value = fields::resolve(*group, &text)
                    .ok_or_else(|| (token.column, AsmError::InvalidField(text)))?;
                out.bytes.push(value);
            }
            Immediate::VarUint => put_varuint(&mut out.bytes, parse_uint(args.next()?)?),
            Immediate::Bytes => {
                let bytes = args.byte_constant()?;
                put_varuint(&mut out.bytes, bytes.len() as u64);
                out.bytes.extend(bytes);
            }
            Immediate::Label => out.label(args.next()?)?,
            Immediate::Labels => {
                let targets = args.rest();
                let count = u8::try_from(targets.len()).map_err(|_| {
                    (
                        op.column,
                        AsmError::OutOfRange {
                            value: targets.len() as i128,
                            max: u8::MAX.into(),
                        },
                    )
                })?;
                out.bytes.push(count);
                for target in targets {
                    out.label(target)?;
                }
            }
            Immediate::IntBlock => {
                let values = args
                    .rest()
                    .iter()
                    .map(parse_uint)
                    .collect::<Located<Vec<_>>>()?;
                put_varuint(&mut out.bytes, values.len() as u64);
                for value in values {
                    put_varuint(&mut out.bytes, value);
                }
            }
            Immediate::ByteBlock => {
                let mut constants = Vec::new();
                while !args.is_done() {
                    constants.push(args.byte_constant()?);
                }
                put_varuint(&mut out.bytes, constants.len() as u64);
                for constant in constants {
                    put_varuint(&mut out.bytes, constant.len() as u64);
                    out.bytes.extend(constant);
                }
            }
        }
    }

    args.finish()?;
    Ok(out)
}

fn single<'a>(op: &'static str, column: usize, tokens: &'a [Token]) -> Located<&'a Token> {
    let mut args = Args::new(op, column, 1, tokens);
    let token = args.next()?;
    args.finish()?;
    Ok(token)
}

fn pseudo_int(op: &Token, tokens: &[Token]) -> Located<Encoded> {
    let value = parse_uint(single("int", op.column, tokens)?)?;
    let mut out = Encoded::with_opcode(PUSHINT);
    put_varuint(&mut out.bytes, value);
    Ok(out)
}

fn pseudo_byte(op: &Token, tokens: &[Token]) -> Located<Encoded> {
    let mut args = Args::new("byte", op.column, 1, tokens);
    let bytes = args.byte_constant()?;
    args.finish()?;
    Ok(Encoded::push_bytes(&bytes))
}

fn pseudo_addr(op: &Token, tokens: &[Token]) -> Located<Encoded> {
    let token = single("addr", op.column, tokens)?;
    let text = token.text();
    let public_key = encoding::decode_address(&text)
        .ok_or_else(|| (token.column, AsmError::InvalidAddress(text)))?;
    Ok(Encoded::push_bytes(&public_key))
}

fn pseudo_method(op: &Token, tokens: &[Token]) -> Located<Encoded> {
    let token = single("method", op.column, tokens)?;
    let TokenKind::Str(signature) = &token.kind else {
        return Err((token.column, AsmError::InvalidByteConstant(token.text())));
    };
    Ok(Encoded::push_bytes(&encoding::method_selector(signature)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn only_error(source: &str) -> LineError {
        let assembly = assemble(source);
        assert_eq!(assembly.errors.len(), 1, "{:?}", assembly.errors);
        assert_eq!(assembly.failure, Some(AssembleError::LineErrors(1)));
        assert!(assembly.bytecode.is_empty());
        assembly.errors[0].clone()
    }

    #[test]
    fn test_assemble_clean_program() {
        let assembly = assemble("#pragma version 8\nint 1\nreturn\n");
        assert!(assembly.is_clean());
        assert_eq!(assembly.version, 8);
        assert_eq!(assembly.bytecode, vec![0x08, 0x81, 0x01, 0x43]);
        assert_eq!(assembly.source_map.line_for_pc(1), Some(2));
        assert_eq!(assembly.source_map.line_for_pc(3), Some(3));
    }

    #[test]
    fn test_assemble_forward_branch() {
        let source = "#pragma version 8\nint 1\nbnz done\nerr\ndone:\nint 1\n";
        let assembly = assemble(source);
        assert!(assembly.is_clean(), "{:?}", assembly);
        assert_eq!(
            assembly.bytecode,
            vec![0x08, 0x81, 0x01, 0x40, 0x00, 0x01, 0x00, 0x81, 0x01]
        );
        assert_eq!(assembly.source_map.pcs_for_line(6), vec![7]);
    }

    #[test]
    fn test_assemble_backward_branch() {
        let assembly = assemble("#pragma version 8\nloop:\nb loop\n");
        assert_eq!(assembly.bytecode, vec![0x08, 0x42, 0xff, 0xfd]);
    }

    #[test]
    fn test_assemble_switch_targets() {
        let assembly = assemble("#pragma version 8\nswitch a b\na:\nb:\n");
        assert!(assembly.is_clean(), "{:?}", assembly);
        assert_eq!(assembly.bytecode, vec![0x08, 0x8d, 0x02, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_assemble_undefined_label_position() {
        let err = only_error("#pragma version 8\nint 1\nbnz done");
        assert_eq!((err.line, err.column), (3, 5));
        assert_eq!(err.cause().to_string(), "reference to undefined label \"done\"");
    }

    #[rstest]
    #[case::unknown_opcode("#pragma version 8\nfoo 1", 2, 1, AsmError::UnknownOpcode("foo".to_string()))]
    #[case::extra_immediate("#pragma version 8\npop 1", 2, 1, AsmError::ImmediateCount { op: "pop".to_string(), expected: "0".to_string() })]
    #[case::missing_immediate("#pragma version 8\n  txn", 2, 3, AsmError::ImmediateCount { op: "txn".to_string(), expected: "1".to_string() })]
    #[case::bad_field("#pragma version 8\ntxn Bogus", 2, 5, AsmError::InvalidField("Bogus".to_string()))]
    #[case::bad_integer("#pragma version 8\nint 12ab", 2, 5, AsmError::InvalidInteger("12ab".to_string()))]
    #[case::u8_overflow("#pragma version 8\nload 256", 2, 6, AsmError::OutOfRange { value: 256, max: 255 })]
    #[case::unsupported_version("#pragma version 99", 1, 17, AsmError::UnsupportedVersion("99".to_string()))]
    #[case::pragma_after_code("int 1\n#pragma version 8", 2, 1, AsmError::PragmaAfterInstructions)]
    #[case::duplicate_label("#pragma version 8\na:\na:\nb a", 3, 1, AsmError::DuplicateLabel("a".to_string()))]
    #[case::bad_base64("#pragma version 8\nbyte base64 !!", 2, 13, AsmError::InvalidByteConstant("!!".to_string()))]
    #[case::unsupported_encoding("#pragma version 8\nbyte b58(abc)", 2, 6, AsmError::UnsupportedEncoding("b58".to_string()))]
    fn test_assemble_error_positions(
        #[case] source: &str,
        #[case] line: usize,
        #[case] column: usize,
        #[case] cause: AsmError,
    ) {
        assert_eq!(only_error(source), LineError::new(line, column, cause));
    }

    #[test]
    fn test_errors_are_ordered_by_line() {
        let assembly = assemble("#pragma version 8\nbnz nowhere\nfoo\n");
        let lines = assembly.errors.iter().map(|e| e.line).collect::<Vec<_>>();
        assert_eq!(lines, vec![2, 3]);
        assert_eq!(assembly.failure, Some(AssembleError::LineErrors(2)));
    }

    #[rstest]
    #[case::string(r#"byte "abc""#, vec![0x80, 0x03, b'a', b'b', b'c'])]
    #[case::hex("byte 0x0102", vec![0x80, 0x02, 0x01, 0x02])]
    #[case::base64_word("byte base64 AAEC", vec![0x80, 0x03, 0x00, 0x01, 0x02])]
    #[case::base64_call("byte b64(AAEC)", vec![0x80, 0x03, 0x00, 0x01, 0x02])]
    #[case::base32("byte base32 MZXW6", vec![0x80, 0x03, b'f', b'o', b'o'])]
    #[case::named_int("int appl", vec![0x81, 0x06])]
    #[case::hex_int("int 0x10", vec![0x81, 0x10])]
    #[case::octal_int("int 010", vec![0x81, 0x08])]
    #[case::varuint("pushint 300", vec![0x81, 0xac, 0x02])]
    #[case::negative_frame_dig("frame_dig -1", vec![0x8b, 0xff])]
    #[case::field_by_name("global GroupSize", vec![0x32, 0x04])]
    #[case::gtxna("gtxna 0 ApplicationArgs 1", vec![0x37, 0x00, 0x1a, 0x01])]
    #[case::int_block("intcblock 1 2", vec![0x20, 0x02, 0x01, 0x02])]
    #[case::byte_block(r#"pushbytess "a" 0x02"#, vec![0x82, 0x02, 0x01, b'a', 0x01, 0x02])]
    fn test_assemble_encoding(#[case] line: &str, #[case] expected: Vec<u8>) {
        let assembly = assemble(&format!("#pragma version 8\n{}", line));
        assert!(assembly.errors.is_empty(), "{:?}", assembly.errors);
        assert_eq!(assembly.bytecode.get(1..), Some(expected.as_slice()));
    }

    #[test]
    fn test_addr_and_method_push_bytes() {
        let address = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ";
        let assembly = assemble(&format!(
            "#pragma version 8\naddr {}\nmethod \"add(uint64,uint64)uint64\"",
            address
        ));
        assert!(assembly.errors.is_empty(), "{:?}", assembly.errors);
        assert_eq!(assembly.bytecode.get(1..3), Some([0x80, 0x20].as_slice()));
        assert_eq!(assembly.bytecode.get(35..37), Some([0x80, 0x04].as_slice()));
        assert_eq!(assembly.bytecode.len(), 41);
    }

    #[test]
    fn test_missing_version_warns() {
        let assembly = assemble("int 1");
        assert_eq!(assembly.version, DEFAULT_VERSION);
        assert_eq!(assembly.warnings, vec![Warning::MissingVersion(DEFAULT_VERSION)]);
        assert_eq!(assembly.failure, None);
        assert_eq!(assembly.bytecode, vec![0x01, 0x81, 0x01]);
    }

    #[test]
    fn test_unused_labels_warn_in_definition_order() {
        let assembly = assemble("#pragma version 8\nfirst:\nint 1\nsecond:\n");
        assert_eq!(
            assembly.warnings,
            vec![
                Warning::UnusedLabel("first".to_string()),
                Warning::UnusedLabel("second".to_string())
            ]
        );
    }

    #[test]
    fn test_oversized_program_fails_without_line_errors() {
        let line = format!("pushbytes 0x{}\n", "00".repeat(200));
        let source = format!("#pragma version 8\n{}", line.repeat(50));
        let assembly = assemble(&source);

        assert!(assembly.errors.is_empty());
        assert!(assembly.warnings.is_empty());
        assert_eq!(
            assembly.failure,
            Some(AssembleError::ProgramTooLarge {
                size: 1 + 203 * 50,
                max: MAX_PROGRAM_SIZE
            })
        );
        assert!(assembly.bytecode.is_empty());
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let assembly = assemble("// header\n#pragma version 8\n\n  int 1 // one\n");
        assert!(assembly.is_clean());
        assert_eq!(assembly.source_map.line_for_pc(1), Some(4));
    }
}
