//! Conversion of assembler output into protocol diagnostics.
//!
//! Assembler positions are 1-based while protocol positions are 0-based. A
//! coordinate of `0` means "unknown" and is kept as `0`. Assembler columns
//! count chars; protocol columns count UTF-16 code units.

use teal_asm::{Assembly, assemble};
use tower_lsp_server::ls_types::{Diagnostic, DiagnosticSeverity, Position, Range};

/// Produces the diagnostics published for a document's full text.
pub type DiagnosticsHandler = fn(&str) -> Vec<Diagnostic>;

/// Assembles `source` and translates the result, with columns measured in
/// UTF-16 code units of `source`.
pub fn translate(source: &str) -> Vec<Diagnostic> {
    let mut diagnostics = from_assembly(&assemble(source));
    let lines = source.lines().collect::<Vec<_>>();

    for diagnostic in &mut diagnostics {
        let Position { line, character } = diagnostic.range.start;
        let Some(text) = usize::try_from(line).ok().and_then(|l| lines.get(l)) else {
            continue;
        };
        let position = Position::new(line, utf16_column(text, character));
        diagnostic.range = Range::new(position, position);
    }

    diagnostics
}

/// Translates an assembly result into `[fallback?] ++ errors ++ warnings`.
///
/// The fallback is a single error at the document start carrying the top-level
/// failure, emitted only when there is nothing more specific to report.
pub fn from_assembly(assembly: &Assembly) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::with_capacity(assembly.errors.len() + assembly.warnings.len() + 1);

    if let Some(failure) = &assembly.failure
        && assembly.errors.is_empty()
        && assembly.warnings.is_empty()
    {
        diagnostics.push(diagnostic(
            Position::new(0, 0),
            DiagnosticSeverity::ERROR,
            failure.to_string(),
        ));
    }

    diagnostics.extend(assembly.errors.iter().map(|err| {
        diagnostic(
            Position::new(zero_based(err.line), zero_based(err.column)),
            DiagnosticSeverity::ERROR,
            err.cause().to_string(),
        )
    }));

    diagnostics.extend(assembly.warnings.iter().map(|warning| {
        diagnostic(
            Position::new(0, 0),
            DiagnosticSeverity::WARNING,
            warning.to_string(),
        )
    }));

    diagnostics
}

/// Width in UTF-16 code units of the first `chars` chars of `line`.
fn utf16_column(line: &str, chars: u32) -> u32 {
    let width: usize = line
        .chars()
        .take(usize::try_from(chars).unwrap_or(usize::MAX))
        .map(char::len_utf16)
        .sum();
    u32::try_from(width).unwrap_or(u32::MAX)
}

fn zero_based(coordinate: usize) -> u32 {
    u32::try_from(coordinate.saturating_sub(1)).unwrap_or(u32::MAX)
}

fn diagnostic(position: Position, severity: DiagnosticSeverity, message: String) -> Diagnostic {
    let mut diagnostic = Diagnostic::new_simple(Range::new(position, position), message);
    diagnostic.severity = Some(severity);
    diagnostic
}
