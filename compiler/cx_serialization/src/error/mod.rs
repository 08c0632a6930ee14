//! Errors raised while reading or writing AST files.
//!
//! Every variant describes a corrupt, truncated or mismatched input (or,
//! for [`SerializationError::UnmappedEntity`], a writer asked to reference
//! something no ID space covers). Structural bugs inside the compiler are
//! panics, not errors.

use std::path::PathBuf;

use cx_diagnostic::{Diagnostic, ErrorCode};
use thiserror::Error;

use crate::ids::IdSpaceKind;

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("not an AST file: expected signature {expected:?}, found {found:?}")]
    BadSignature { expected: [u8; 4], found: Vec<u8> },

    #[error(
        "AST file format {found_major}.{found_minor} is not supported \
         (expected {expected_major}.x)"
    )]
    VersionMismatch {
        expected_major: u32,
        found_major: u32,
        found_minor: u32,
    },

    #[error("unexpected end of AST file at bit {bit}")]
    UnexpectedEof { bit: u64 },

    #[error("malformed AST file: {reason}")]
    MalformedBlock { reason: String },

    #[error("unknown declaration record code {code}")]
    UnknownDeclCode { code: u32 },

    #[error("unknown statement record code {code}")]
    UnknownStmtCode { code: u32 },

    #[error("unknown type record code {code}")]
    UnknownTypeCode { code: u32 },

    #[error("{space} ID {id} does not belong to any loaded module")]
    UnknownGlobalId { space: IdSpaceKind, id: u32 },

    #[error("{space} {index} has no ID in the module being written")]
    UnmappedEntity { space: IdSpaceKind, index: u32 },

    #[error("body of declaration {decl} was never loaded and cannot be written")]
    UnloadedBody { decl: u32 },

    #[error("module `{name}` is already being loaded")]
    DuplicateLoad { name: String },

    #[error("record {code} has {found} fields, expected {expected}")]
    RecordLengthMismatch {
        code: u32,
        expected: usize,
        found: usize,
    },

    #[error("module `{module}` imports `{import}`, which is not loaded")]
    MissingImport { module: String, import: String },

    #[error("module `{name}` not found")]
    ModuleNotFound { name: String },

    #[error("statement record {code} needs more operands than were read")]
    StmtStackUnderflow { code: u32 },

    #[error("failed to access `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed global module index: {reason}")]
    MalformedIndex { reason: String },

    #[error("an earlier load failed partway; the reader serves no further requests")]
    ReaderFailed,
}

impl SerializationError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        SerializationError::MalformedBlock {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            SerializationError::BadSignature { .. } => ErrorCode::E9001,
            SerializationError::VersionMismatch { .. } => ErrorCode::E9002,
            SerializationError::UnexpectedEof { .. } => ErrorCode::E9003,
            SerializationError::MalformedBlock { .. }
            | SerializationError::MalformedIndex { .. }
            | SerializationError::ReaderFailed => ErrorCode::E9004,
            SerializationError::UnknownDeclCode { .. }
            | SerializationError::UnknownStmtCode { .. }
            | SerializationError::UnknownTypeCode { .. } => ErrorCode::E9005,
            SerializationError::UnknownGlobalId { .. }
            | SerializationError::UnmappedEntity { .. }
            | SerializationError::UnloadedBody { .. } => ErrorCode::E9006,
            SerializationError::DuplicateLoad { .. } => ErrorCode::E9007,
            SerializationError::RecordLengthMismatch { .. } => ErrorCode::E9008,
            SerializationError::MissingImport { .. } => ErrorCode::E9009,
            SerializationError::ModuleNotFound { .. } => ErrorCode::E9010,
            SerializationError::StmtStackUnderflow { .. } => ErrorCode::E9011,
            SerializationError::Io { .. } => ErrorCode::E9012,
        }
    }

    /// Convert into a reportable diagnostic. `module` names the file being
    /// processed when the error surfaced.
    pub fn to_diagnostic(&self, module: Option<&str>) -> Diagnostic {
        let diag = Diagnostic::error(self.code()).with_message(self.to_string());
        match module {
            Some(name) => diag.with_note(format!("while processing AST file `{name}`")),
            None => diag,
        }
    }
}
