//! Positional argument decoding for proxies and property setters

use crate::array::{ArrayElement, TypedArray};
use crate::class::GodotEnum;
use crate::variant::{FromVariant, Variant, VariantConversionError};

/// Why an argument could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    #[error("missing argument {index}")]
    Missing { index: usize },

    #[error("argument {index}: {source}")]
    Conversion {
        index: usize,
        #[source]
        source: VariantConversionError,
    },

    #[error("argument {index}: {value} does not fit in a {bits}-bit enum")]
    EnumOutOfRange { index: usize, value: i64, bits: u32 },

    #[error("argument {index}: unknown enum value {value}")]
    UnknownEnumValue { index: usize, value: i64 },
}

/// The argument list of one call
#[derive(Debug, Clone, Copy)]
pub struct Arguments<'a> {
    values: &'a [Variant],
}

impl<'a> Arguments<'a> {
    pub fn new(values: &'a [Variant]) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a Variant> {
        self.values.get(index)
    }

    fn require(&self, index: usize) -> Result<&'a Variant, ArgumentError> {
        self.get(index).ok_or(ArgumentError::Missing { index })
    }

    /// Decode argument `index` as `T`
    pub fn value<T: FromVariant>(&self, index: usize) -> Result<T, ArgumentError> {
        T::from_variant(self.require(index)?)
            .map_err(|source| ArgumentError::Conversion { index, source })
    }

    /// Decode a typed array argument; the element constraint must match exactly
    pub fn typed_array<T: ArrayElement>(&self, index: usize) -> Result<TypedArray<T>, ArgumentError> {
        self.value(index)
    }

    fn raw_enum(&self, index: usize, bits: u32) -> Result<i64, ArgumentError> {
        let raw: i64 = self.value(index)?;
        if bits == 32 && i32::try_from(raw).is_err() {
            return Err(ArgumentError::EnumOutOfRange {
                index,
                value: raw,
                bits,
            });
        }
        Ok(raw)
    }

    /// Decode a 32-bit enum; `Ok(None)` when the raw value names no case
    pub fn try_enum32<E: GodotEnum>(&self, index: usize) -> Result<Option<E>, ArgumentError> {
        self.raw_enum(index, 32).map(E::from_raw)
    }

    /// Decode a 64-bit enum; `Ok(None)` when the raw value names no case
    pub fn try_enum64<E: GodotEnum>(&self, index: usize) -> Result<Option<E>, ArgumentError> {
        self.raw_enum(index, 64).map(E::from_raw)
    }

    /// Decode a 32-bit enum, rejecting unknown raw values
    pub fn enum32<E: GodotEnum>(&self, index: usize) -> Result<E, ArgumentError> {
        let raw = self.raw_enum(index, 32)?;
        E::from_raw(raw).ok_or(ArgumentError::UnknownEnumValue { index, value: raw })
    }

    /// Decode a 64-bit enum, rejecting unknown raw values
    pub fn enum64<E: GodotEnum>(&self, index: usize) -> Result<E, ArgumentError> {
        let raw = self.raw_enum(index, 64)?;
        E::from_raw(raw).ok_or(ArgumentError::UnknownEnumValue { index, value: raw })
    }
}
