//! Variant arrays, optionally constrained to one element type

use std::fmt;
use std::marker::PhantomData;

use gdbind_schema::VariantType;

use crate::variant::{FromVariant, ToVariant, Variant, VariantConversionError};

/// Values that can be elements of a [`TypedArray`]
pub trait ArrayElement: ToVariant + FromVariant {
    fn element_type() -> VariantType;

    /// Class constraint for object elements
    fn element_class() -> Option<&'static str> {
        None
    }

    fn typing() -> ArrayTyping {
        ArrayTyping {
            element_type: Self::element_type(),
            class_name: Self::element_class().map(str::to_string),
        }
    }
}

/// Element constraint carried by a typed array
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayTyping {
    pub element_type: VariantType,
    pub class_name: Option<String>,
}

impl fmt::Display for ArrayTyping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.class_name {
            Some(class) => f.write_str(class),
            None => write!(f, "{}", self.element_type),
        }
    }
}

/// Typed-array assignment failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArrayTypeError {
    #[error("expected Array[{expected}], got an untyped Array")]
    Untyped { expected: ArrayTyping },

    #[error("expected Array[{expected}], got Array[{found}]")]
    Mismatch {
        expected: ArrayTyping,
        found: ArrayTyping,
    },

    #[error("element {index} is {found}, expected {expected}")]
    Element {
        index: usize,
        expected: ArrayTyping,
        found: VariantType,
    },
}

/// The engine's array value; untyped unless `typing` is set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantArray {
    items: Vec<Variant>,
    typing: Option<ArrayTyping>,
}

impl VariantArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty array constrained to `typing`
    pub fn typed(typing: ArrayTyping) -> Self {
        Self {
            items: Vec::new(),
            typing: Some(typing),
        }
    }

    pub fn typing(&self) -> Option<&ArrayTyping> {
        self.typing.as_ref()
    }

    /// Append a value. Typed arrays refuse values of the wrong kind.
    pub fn push(&mut self, value: Variant) -> Result<(), ArrayTypeError> {
        if let Some(typing) = &self.typing {
            if value.variant_type() != typing.element_type {
                return Err(ArrayTypeError::Element {
                    index: self.items.len(),
                    expected: typing.clone(),
                    found: value.variant_type(),
                });
            }
        }
        self.items.push(value);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&Variant> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variant> {
        self.items.iter()
    }
}

impl FromIterator<Variant> for VariantArray {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
            typing: None,
        }
    }
}

impl ToVariant for VariantArray {
    fn to_variant(&self) -> Variant {
        Variant::Array(self.clone())
    }
}

impl FromVariant for VariantArray {
    fn from_variant(variant: &Variant) -> Result<Self, VariantConversionError> {
        match variant {
            Variant::Array(array) => Ok(array.clone()),
            other => Err(VariantConversionError::mismatch(VariantType::Array, other)),
        }
    }
}

/// An array whose elements are all `T`
pub struct TypedArray<T: ArrayElement> {
    inner: VariantArray,
    _marker: PhantomData<T>,
}

impl<T: ArrayElement> TypedArray<T> {
    pub fn new() -> Self {
        Self {
            inner: VariantArray::typed(T::typing()),
            _marker: PhantomData,
        }
    }

    /// Accept `array` only if it is typed with exactly `T`'s element constraint
    pub fn try_from_array(array: VariantArray) -> Result<Self, ArrayTypeError> {
        let expected = T::typing();
        match &array.typing {
            None => Err(ArrayTypeError::Untyped { expected }),
            Some(found) if *found != expected => Err(ArrayTypeError::Mismatch {
                expected,
                found: found.clone(),
            }),
            Some(_) => Ok(Self {
                inner: array,
                _marker: PhantomData,
            }),
        }
    }

    pub fn push(&mut self, value: T) {
        // The element type always matches the array's own constraint
        self.inner.items.push(value.to_variant());
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.get(index).and_then(|v| T::from_variant(v).ok())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.inner.iter().filter_map(|v| T::from_variant(v).ok())
    }

    pub fn as_variant_array(&self) -> &VariantArray {
        &self.inner
    }
}

impl<T: ArrayElement> Default for TypedArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ArrayElement> Clone for TypedArray<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ArrayElement> PartialEq for TypedArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: ArrayElement> fmt::Debug for TypedArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedArray")
            .field("typing", &self.inner.typing)
            .field("items", &self.inner.items)
            .finish()
    }
}

impl<T: ArrayElement> FromIterator<T> for TypedArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        for value in iter {
            array.push(value);
        }
        array
    }
}

impl<T: ArrayElement> ToVariant for TypedArray<T> {
    fn to_variant(&self) -> Variant {
        Variant::Array(self.inner.clone())
    }
}

impl<T: ArrayElement> FromVariant for TypedArray<T> {
    fn from_variant(variant: &Variant) -> Result<Self, VariantConversionError> {
        let array = VariantArray::from_variant(variant)?;
        Ok(Self::try_from_array(array)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::GString;

    #[test]
    fn test_typed_round_trip() {
        let array: TypedArray<i64> = [1, 2, 3].into_iter().collect();
        let variant = array.to_variant();
        let back = TypedArray::<i64>::from_variant(&variant).unwrap();
        assert_eq!(back, array);
        assert_eq!(back.iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_element_mismatch_rejected() {
        let array: TypedArray<i64> = [1].into_iter().collect();
        let err = TypedArray::<GString>::from_variant(&array.to_variant()).unwrap_err();
        assert!(matches!(
            err,
            VariantConversionError::ArrayType(ArrayTypeError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_untyped_rejected() {
        let untyped: VariantArray = vec![Variant::Int(1)].into_iter().collect();
        assert!(matches!(
            TypedArray::<i64>::try_from_array(untyped),
            Err(ArrayTypeError::Untyped { .. })
        ));
    }

    #[test]
    fn test_typed_variant_array_refuses_wrong_kind() {
        let mut array = VariantArray::typed(i64::typing());
        array.push(Variant::Int(1)).unwrap();
        assert!(array.push(Variant::Bool(true)).is_err());
        assert_eq!(array.len(), 1);
    }
}
