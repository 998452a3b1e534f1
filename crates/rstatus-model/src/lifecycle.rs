//! Enum plumbing shared by every lifecycle and auxiliary enum.
//!
//! Enums carry explicit `i32` discriminants with zero reserved for the
//! `*_UNSPECIFIED` sentinel. They serialize as their wire name and
//! deserialize from either the wire name or the discriminant.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Visitor};

/// Errors converting to or from an enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnumError {
    #[error("unknown {enum_name} name: {name}")]
    UnknownName {
        enum_name: &'static str,
        name: String,
    },

    #[error("unknown {enum_name} value: {value}")]
    UnknownValue { enum_name: &'static str, value: i64 },
}

/// Discriminant and wire-name conversions.
pub trait ProtoEnum: Copy + Default + PartialEq + fmt::Debug + 'static {
    /// Rust type name, used in error messages.
    const NAME: &'static str;

    /// Every variant in discriminant order.
    const ALL: &'static [Self];

    fn as_i32(self) -> i32;

    fn from_i32(value: i32) -> Option<Self>;

    fn as_str_name(self) -> &'static str;

    fn from_str_name(name: &str) -> Option<Self>;

    /// Lenient lookup for human input: exact wire name first, then
    /// upper-cased. Plain `unspecified` names the zero variant.
    fn parse_name(name: &str) -> Result<Self, EnumError> {
        let upper = name.trim().to_ascii_uppercase();
        Self::from_str_name(name)
            .or_else(|| Self::from_str_name(&upper))
            .or_else(|| (upper == "UNSPECIFIED").then(Self::default))
            .ok_or_else(|| EnumError::UnknownName {
                enum_name: Self::NAME,
                name: name.to_string(),
            })
    }
}

/// Lifecycle rules on top of a state enum.
///
/// Terminal states are absorbing: no transition leaves them.
/// `UNSPECIFIED` may move to any specified state, since the first
/// observation can land anywhere in the lifecycle.
pub trait Lifecycle: ProtoEnum {
    /// States after which no further transition occurs.
    const TERMINAL: &'static [Self];

    /// States on an exit path that are neither steady nor final.
    const TRANSIENT: &'static [Self];

    /// Allowed targets from a specified, non-terminal state.
    fn successors(self) -> &'static [Self];

    fn is_terminal(self) -> bool {
        Self::TERMINAL.contains(&self)
    }

    fn is_transient(self) -> bool {
        Self::TRANSIENT.contains(&self)
    }

    fn is_unspecified(self) -> bool {
        self.as_i32() == 0
    }

    /// Check if transition from this state to target is valid
    fn can_transition_to(self, target: Self) -> bool {
        if self.is_terminal() || target.is_unspecified() {
            return false;
        }
        if self.is_unspecified() {
            return true;
        }
        self.successors().contains(&target)
    }
}

/// Serde visitor accepting a wire name or a discriminant.
pub(crate) struct ProtoEnumVisitor<T>(pub(crate) PhantomData<T>);

impl<'de, T: ProtoEnum> Visitor<'de> for ProtoEnumVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a {} name or number", T::NAME)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        T::from_str_name(v).ok_or_else(|| {
            E::custom(EnumError::UnknownName {
                enum_name: T::NAME,
                name: v.to_string(),
            })
        })
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
        i32::try_from(v)
            .ok()
            .and_then(T::from_i32)
            .ok_or_else(|| {
                E::custom(EnumError::UnknownValue {
                    enum_name: T::NAME,
                    value: v,
                })
            })
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
        match i64::try_from(v) {
            Ok(v) => self.visit_i64(v),
            Err(_) => Err(E::custom(EnumError::UnknownValue {
                enum_name: T::NAME,
                value: i64::MAX,
            })),
        }
    }
}

/// Declare a wire enum. The first variant must be the zero sentinel.
macro_rules! proto_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(#[$zmeta:meta])*
            $zero:ident = 0 => $zwire:literal,
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:literal => $wire:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        #[repr(i32)]
        $vis enum $name {
            $(#[$zmeta])*
            #[default]
            $zero = 0,
            $(
                $(#[$vmeta])*
                $variant = $value,
            )+
        }

        impl $crate::lifecycle::ProtoEnum for $name {
            const NAME: &'static str = stringify!($name);

            const ALL: &'static [Self] = &[Self::$zero, $(Self::$variant,)+];

            fn as_i32(self) -> i32 {
                self as i32
            }

            fn from_i32(value: i32) -> Option<Self> {
                match value {
                    0 => Some(Self::$zero),
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn as_str_name(self) -> &'static str {
                match self {
                    Self::$zero => $zwire,
                    $(Self::$variant => $wire,)+
                }
            }

            fn from_str_name(name: &str) -> Option<Self> {
                match name {
                    $zwire => Some(Self::$zero),
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::lifecycle::ProtoEnum::as_str_name(*self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::lifecycle::EnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as $crate::lifecycle::ProtoEnum>::parse_name(s)
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str($crate::lifecycle::ProtoEnum::as_str_name(*self))
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any($crate::lifecycle::ProtoEnumVisitor::<Self>(
                    ::std::marker::PhantomData,
                ))
            }
        }
    };
}

pub(crate) use proto_enum;
