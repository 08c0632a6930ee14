//! Error codes for all diagnostics.
//!
//! Each code is a unique identifier (e.g. `E1002`) whose first digit
//! names the subsystem that raised it.

use std::fmt;

/// Error codes for all diagnostics.
///
/// Format: E#### where the first digit indicates the subsystem:
/// - E1xxx: Constant evaluation
/// - E2xxx: Integer constant expression checking
/// - E9xxx: AST file loading and writing
///
/// W#### codes are warnings.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Constant evaluation (E1xxx)
    /// Expression is not a constant expression
    E1001,
    /// Division by zero
    E1002,
    /// Shift count negative or too large
    E1003,
    /// Call to a non-constant function
    E1004,
    /// Expression has side effects
    E1005,
    /// Read of a non-const variable
    E1006,
    /// Value depends on a template parameter
    E1007,
    /// Expression does not have integral type
    E1008,

    // Integer constant expressions (E2xxx)
    /// Not an integer constant expression
    E2001,
    /// Comma operator in an integer constant expression
    E2002,
    /// Floating-point operand in an integer constant expression
    E2003,
    /// Disallowed cast in an integer constant expression
    E2004,

    // AST files (E9xxx)
    /// File does not start with the AST file signature
    E9001,
    /// Unsupported format version
    E9002,
    /// Unexpected end of file
    E9003,
    /// Malformed block structure
    E9004,
    /// Unknown record code
    E9005,
    /// Global ID outside every loaded module
    E9006,
    /// Module loaded twice
    E9007,
    /// Record length does not match its kind
    E9008,
    /// Imported module is missing
    E9009,
    /// Module not found
    E9010,
    /// Statement stream popped more operands than it pushed
    E9011,
    /// I/O failure
    E9012,
    /// Error limit reached
    E9099,

    // Warnings
    /// Expression folded to a constant although it is not an ICE
    W1001,
    /// A module replaced an imported declaration that was already loaded
    W9001,
}

impl ErrorCode {
    /// Every code, in declaration order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E1001,
        ErrorCode::E1002,
        ErrorCode::E1003,
        ErrorCode::E1004,
        ErrorCode::E1005,
        ErrorCode::E1006,
        ErrorCode::E1007,
        ErrorCode::E1008,
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E9001,
        ErrorCode::E9002,
        ErrorCode::E9003,
        ErrorCode::E9004,
        ErrorCode::E9005,
        ErrorCode::E9006,
        ErrorCode::E9007,
        ErrorCode::E9008,
        ErrorCode::E9009,
        ErrorCode::E9010,
        ErrorCode::E9011,
        ErrorCode::E9012,
        ErrorCode::E9099,
        ErrorCode::W1001,
        ErrorCode::W9001,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E1006 => "E1006",
            ErrorCode::E1007 => "E1007",
            ErrorCode::E1008 => "E1008",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E9001 => "E9001",
            ErrorCode::E9002 => "E9002",
            ErrorCode::E9003 => "E9003",
            ErrorCode::E9004 => "E9004",
            ErrorCode::E9005 => "E9005",
            ErrorCode::E9006 => "E9006",
            ErrorCode::E9007 => "E9007",
            ErrorCode::E9008 => "E9008",
            ErrorCode::E9009 => "E9009",
            ErrorCode::E9010 => "E9010",
            ErrorCode::E9011 => "E9011",
            ErrorCode::E9012 => "E9012",
            ErrorCode::E9099 => "E9099",
            ErrorCode::W1001 => "W1001",
            ErrorCode::W9001 => "W9001",
        }
    }

    /// Check if this is a constant evaluation error (E1xxx range).
    pub fn is_eval_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E1001
                | ErrorCode::E1002
                | ErrorCode::E1003
                | ErrorCode::E1004
                | ErrorCode::E1005
                | ErrorCode::E1006
                | ErrorCode::E1007
                | ErrorCode::E1008
        )
    }

    /// Check if this is an integer constant expression error (E2xxx range).
    pub fn is_ice_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::E2001 | ErrorCode::E2002 | ErrorCode::E2003 | ErrorCode::E2004
        )
    }

    /// Check if this is an AST file error (E9xxx range).
    pub fn is_serialization_error(&self) -> bool {
        self.as_str().starts_with("E9")
    }

    /// Check if this is a warning code (Wxxxx range).
    pub fn is_warning(&self) -> bool {
        matches!(self, ErrorCode::W1001 | ErrorCode::W9001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse an error code string like `"E9001"`. Case-insensitive.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .find(|code| code.as_str() == upper)
            .copied()
            .ok_or(())
    }
}

#[cfg(test)]
mod tests;
