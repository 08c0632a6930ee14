/// Declare a `#[repr(u8)]` field-level enum with a dense raw encoding.
///
/// Generates `ALL`, `raw()` and `from_raw()` so the AST file can store the
/// value as a single small integer and reject anything out of range.
macro_rules! raw_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident,)* }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            #[inline]
            pub const fn raw(self) -> u8 {
                self as u8
            }

            #[inline]
            pub fn from_raw(raw: u64) -> Option<Self> {
                usize::try_from(raw).ok().and_then(|i| Self::ALL.get(i).copied())
            }
        }
    };
}
