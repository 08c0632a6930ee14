//! Target and language configuration consumed by layout and evaluation.

/// Sizes and alignments of the builtin types, in bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetInfo {
    pub triple: &'static str,
    pub pointer_width: u32,
    pub pointer_align: u32,
    pub bool_width: u32,
    pub char_width: u32,
    pub short_width: u32,
    pub int_width: u32,
    pub long_width: u32,
    pub long_long_width: u32,
    pub long_long_align: u32,
    pub float_width: u32,
    pub double_width: u32,
    pub double_align: u32,
    pub long_double_width: u32,
    pub long_double_align: u32,
    /// Whether plain `char` is signed.
    pub char_is_signed: bool,
}

impl TargetInfo {
    pub fn x86_64() -> Self {
        TargetInfo {
            triple: "x86_64-unknown-linux-gnu",
            pointer_width: 64,
            pointer_align: 64,
            bool_width: 8,
            char_width: 8,
            short_width: 16,
            int_width: 32,
            long_width: 64,
            long_long_width: 64,
            long_long_align: 64,
            float_width: 32,
            double_width: 64,
            double_align: 64,
            long_double_width: 128,
            long_double_align: 128,
            char_is_signed: true,
        }
    }

    /// 32-bit x86: 4-byte pointers and 4-byte alignment for `long long`
    /// and `double` inside structs.
    pub fn i386() -> Self {
        TargetInfo {
            triple: "i386-unknown-linux-gnu",
            pointer_width: 32,
            pointer_align: 32,
            long_width: 32,
            long_long_align: 32,
            double_align: 32,
            long_double_width: 96,
            long_double_align: 32,
            ..Self::x86_64()
        }
    }
}

impl Default for TargetInfo {
    fn default() -> Self {
        Self::x86_64()
    }
}

/// Language dialect switches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LangOptions {
    pub cplusplus: bool,
    pub c99: bool,
    pub gnu_mode: bool,
    /// Allow assignment through a cast to an lvalue (`(int)x = 1`), a GNU
    /// extension that makes such casts modifiable.
    pub lvalue_cast_extension: bool,
}

impl Default for LangOptions {
    fn default() -> Self {
        LangOptions {
            cplusplus: true,
            c99: true,
            gnu_mode: false,
            lvalue_cast_extension: false,
        }
    }
}

impl LangOptions {
    /// Plain C99.
    pub fn c99() -> Self {
        LangOptions {
            cplusplus: false,
            ..Self::default()
        }
    }
}
