//! A line-oriented assembler for TEAL, the assembly language of the Algorand
//! Virtual Machine.
//!
//! [`assemble`] never fails outright. Positioned problems are collected as
//! [`LineError`]s, non-fatal findings as [`Warning`]s, and the overall outcome is
//! summarised by an optional [`AssembleError`].
//!
//! ```
//! let assembly = teal_asm::assemble("#pragma version 8\nint 1\nreturn");
//! assert!(assembly.is_clean());
//! assert_eq!(assembly.bytecode, vec![0x08, 0x81, 0x01, 0x43]);
//! ```
mod assembler;
pub mod encoding;
mod error;
pub mod fields;
pub mod lexer;
pub mod opcodes;
mod source_map;

pub use assembler::{Assembly, DEFAULT_VERSION, MAX_PROGRAM_SIZE, MAX_VERSION, assemble};
pub use error::{AsmError, AssembleError, LineError, Warning};
pub use source_map::SourceMap;
