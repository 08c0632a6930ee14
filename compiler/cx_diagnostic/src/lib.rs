//! Diagnostic system for the cx frontend.
//!
//! Every report carries:
//! - An error code for searchability
//! - A message saying what went wrong
//! - A primary location saying where
//! - Notes giving context
//!
//! Constant evaluation in `cx_ir` produces plain [`PartialDiagnostic`] and
//! [`IceDiag`] values; the conversions in [`eval`] turn them into
//! [`Diagnostic`]s. AST file loading converts its errors the same way.
//!
//! # Error Guarantees
//!
//! [`ErrorGuaranteed`] is type-level proof that at least one error was
//! emitted:
//!
//! ```text
//! let guarantee = queue.emit_error(diagnostic);
//! fn load() -> Result<ModuleIndex, ErrorGuaranteed> { ... }
//! ```
//!
//! [`PartialDiagnostic`]: cx_ir::PartialDiagnostic
//! [`IceDiag`]: cx_ir::IceDiag

mod diagnostic;
mod error_code;
pub mod eval;
mod guarantee;
pub mod queue;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use guarantee::ErrorGuaranteed;
pub use queue::{DiagnosticConfig, DiagnosticQueue};
