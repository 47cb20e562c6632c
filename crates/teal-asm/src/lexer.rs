use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, tag, take_till1, take_while_m_n},
    character::complete::{char, multispace0},
    combinator::{map, map_res, not, recognize, value},
    multi::{fold_many0, many1},
    sequence::{preceded, terminated},
};
use nom_locate::LocatedSpan;

use crate::error::AsmError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Word(String),
    Str(Vec<u8>),
}

/// A token of a single source line. `column` is 1-based and counted in chars.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub column: usize,
}

impl Token {
    pub fn word(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Word(w) => Some(w.as_str()),
            TokenKind::Str(_) => None,
        }
    }

    pub fn text(&self) -> String {
        match &self.kind {
            TokenKind::Word(w) => w.clone(),
            TokenKind::Str(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

type Span<'a> = LocatedSpan<&'a str>;

enum Piece<'a> {
    Text(Span<'a>),
    Byte(u8),
}

/// Splits one line into tokens, dropping a trailing `//` comment.
pub fn tokenize(line: &str) -> Result<Vec<Token>, (usize, AsmError)> {
    let mut input = Span::new(line);
    let mut tokens = Vec::new();

    loop {
        let Ok((remaining, _)) = multispace0::<_, nom::error::Error<Span>>(input) else {
            break;
        };
        input = remaining;

        if input.fragment().is_empty() || comment(input).is_ok() {
            break;
        }

        let column = input.get_utf8_column();

        let (rest, kind) = if input.fragment().starts_with('"') {
            let (rest, bytes) = quoted(input).map_err(|e| (column, e))?;
            (rest, TokenKind::Str(bytes))
        } else {
            let Ok((rest, text)) = word(input) else {
                break;
            };
            (rest, TokenKind::Word(text.fragment().to_string()))
        };

        tokens.push(Token { kind, column });
        input = rest;
    }

    Ok(tokens)
}

fn comment(input: Span) -> IResult<Span, Span> {
    tag("//").parse(input)
}

/// Runs up to whitespace or a `//` comment. A lone `/` stays part of the word.
fn word(input: Span) -> IResult<Span, Span> {
    recognize(many1(alt((
        take_till1(|c: char| c.is_whitespace() || c == '/'),
        terminated(tag("/"), not(char('/'))),
    ))))
    .parse(input)
}

/// Decodes a string literal starting at the opening quote.
fn quoted(input: Span) -> Result<(Span, Vec<u8>), AsmError> {
    let (rest, bytes) = string_literal(input).map_err(|_| AsmError::UnterminatedString)?;

    match char::<_, nom::error::Error<Span>>('"').parse(rest) {
        Ok((rest, _)) => Ok((rest, bytes)),
        Err(_) => Err(unfinished_literal(rest.fragment())),
    }
}

/// The body of a string literal, stopping at the closing quote or the first
/// escape that does not decode.
fn string_literal(input: Span) -> IResult<Span, Vec<u8>> {
    preceded(
        char('"'),
        fold_many0(piece, Vec::new, |mut bytes: Vec<u8>, piece| {
            match piece {
                Piece::Text(text) => bytes.extend_from_slice(text.fragment().as_bytes()),
                Piece::Byte(byte) => bytes.push(byte),
            }
            bytes
        }),
    )
    .parse(input)
}

fn piece(input: Span) -> IResult<Span, Piece> {
    alt((
        map(is_not("\"\\"), Piece::Text),
        map(preceded(char('\\'), escape), Piece::Byte),
    ))
    .parse(input)
}

fn escape(input: Span) -> IResult<Span, u8> {
    alt((
        value(b'\\', char('\\')),
        value(b'"', char('"')),
        value(b'\r', char('r')),
        value(b'\n', char('n')),
        value(b'\t', char('t')),
        hex_byte,
    ))
    .parse(input)
}

fn hex_byte(input: Span) -> IResult<Span, u8> {
    preceded(
        char('x'),
        map_res(take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()), |hex: Span| {
            u8::from_str_radix(hex.fragment(), 16)
        }),
    )
    .parse(input)
}

/// Explains why a literal stopped before its closing quote.
fn unfinished_literal(rest: &str) -> AsmError {
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some('\\'), Some('x')) => {
            AsmError::InvalidByteConstant(format!("\\x{}", chars.take(2).collect::<String>()))
        }
        (Some('\\'), Some(other)) => AsmError::InvalidByteConstant(format!("\\{}", other)),
        _ => AsmError::UnterminatedString,
    }
}
