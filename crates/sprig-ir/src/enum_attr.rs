//! Enumerated attribute support.
//!
//! Dialects often carry a closed set of choices in an attribute, like the
//! kind of a binary operation. The [`enum_attr!`] macro defines a Rust enum
//! together with its textual mnemonics and stable numeric discriminants, plus
//! total conversions in both directions. Decoding is fail-closed: an unknown
//! mnemonic or discriminant is an error, never a silent default.

use derive_more::{Display, Error};

/// Decoding failure for an enumerated attribute.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum EnumAttrError {
    /// Mnemonic does not name any case of the enum.
    #[display("unknown mnemonic '{mnemonic}' for {enum_name}")]
    UnknownMnemonic {
        enum_name: &'static str,
        mnemonic: String,
    },
    /// Numeric discriminant does not map to any case of the enum.
    #[display("invalid discriminant {discriminant} for {enum_name}")]
    InvalidDiscriminant {
        enum_name: &'static str,
        discriminant: u64,
    },
    /// Attribute is neither a symbol nor an integer.
    #[display("attribute is not a valid {enum_name} encoding")]
    WrongAttributeKind { enum_name: &'static str },
}

/// Define an enumerated attribute.
///
/// Each case carries a numeric discriminant and a textual mnemonic:
///
/// ```
/// # use sprig_ir::enum_attr;
/// enum_attr! {
///     /// Comparison direction.
///     pub enum CmpKind {
///         Lt = 0 => "lt",
///         Gt = 1 => "gt",
///     }
/// }
/// ```
///
/// The generated enum converts to and from [`Attribute`](crate::Attribute)
/// values, stores as `Attribute::Symbol` of the mnemonic, and decodes either
/// a symbol or an integer discriminant.
#[macro_export]
macro_rules! enum_attr {
    (
        $(#[doc = $doc:literal])*
        $vis:vis enum $name:ident {
            $($case:ident = $disc:literal => $mnemonic:literal),+ $(,)?
        }
    ) => {
        $(#[doc = $doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u64)]
        $vis enum $name {
            $($case = $disc),+
        }

        impl $name {
            /// Every case, in declaration order.
            pub const CASES: &'static [$name] = &[$($name::$case),+];

            /// Every mnemonic, in declaration order.
            pub const MNEMONICS: &'static [&'static str] = &[$($mnemonic),+];

            /// The Rust-facing case name.
            pub fn symbolic_name(self) -> &'static str {
                match self {
                    $($name::$case => stringify!($case)),+
                }
            }

            /// The textual mnemonic used in printed IR.
            pub fn mnemonic(self) -> &'static str {
                match self {
                    $($name::$case => $mnemonic),+
                }
            }

            /// The stable numeric encoding.
            pub fn discriminant(self) -> u64 {
                self as u64
            }

            /// Decode from a mnemonic. Unknown mnemonics are rejected.
            pub fn from_mnemonic(mnemonic: &str) -> Result<Self, $crate::EnumAttrError> {
                match mnemonic {
                    $($mnemonic => Ok($name::$case),)+
                    _ => Err($crate::EnumAttrError::UnknownMnemonic {
                        enum_name: stringify!($name),
                        mnemonic: mnemonic.to_string(),
                    }),
                }
            }

            /// Decode from a numeric discriminant. Unknown values are rejected.
            pub fn from_discriminant(discriminant: u64) -> Result<Self, $crate::EnumAttrError> {
                match discriminant {
                    $($disc => Ok($name::$case),)+
                    _ => Err($crate::EnumAttrError::InvalidDiscriminant {
                        enum_name: stringify!($name),
                        discriminant,
                    }),
                }
            }

            /// Encode as an attribute value.
            pub fn to_attr<'db>(self) -> $crate::Attribute<'db> {
                $crate::Attribute::Symbol($crate::Symbol::new(self.mnemonic()))
            }

            /// Decode from an attribute value. Accepts either the symbol
            /// mnemonic or the integer discriminant.
            pub fn from_attr(attr: &$crate::Attribute<'_>) -> Result<Self, $crate::EnumAttrError> {
                match attr {
                    $crate::Attribute::Symbol(sym) => {
                        sym.with_str(|s| Self::from_mnemonic(s))
                    }
                    $crate::Attribute::IntBits(bits) => Self::from_discriminant(*bits),
                    _ => Err($crate::EnumAttrError::WrongAttributeKind {
                        enum_name: stringify!($name),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.mnemonic())
            }
        }
    };
}
