//! Positional bind parameters
//!
//! A [`ParameterList`] is append-only until cleared: the order of the bind
//! calls defines the 1-based position of each parameter.

use std::slice;

use crate::constants::FieldType;
use crate::value::Value;

/// A bound parameter: a value plus its declared maximum field width
///
/// The width is sent in the request metadata exactly as declared, with 0
/// meaning no hint. It never truncates: a payload longer than the hint is
/// sent in full.
///
/// # Examples
///
/// ```rust
/// use edb_rs::{BindParam, Value};
///
/// let param = BindParam::new(Value::from("abc"));
/// assert_eq!(param.max_size, 0);
///
/// let wide = BindParam::with_max_size("abc", 64);
/// assert_eq!(wide.max_size, 64);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BindParam {
    /// The bound value
    pub value: Value,
    /// Declared maximum field width (0 = default)
    pub max_size: u32,
}

impl BindParam {
    /// Create a parameter with the default field width
    pub fn new(value: impl Into<Value>) -> Self {
        Self::with_max_size(value, 0)
    }

    /// Create a parameter with a declared field width
    pub fn with_max_size(value: impl Into<Value>, max_size: u32) -> Self {
        Self {
            value: value.into(),
            max_size,
        }
    }

    /// An explicit NULL
    pub fn null() -> Self {
        Self::new(Value::Null)
    }

    /// The wire type tag of the value
    pub fn field_type(&self) -> FieldType {
        self.value.field_type()
    }
}

impl From<Value> for BindParam {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Ordered sequence of bound parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterList {
    params: Vec<BindParam>,
}

impl ParameterList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, returning its 1-based position
    pub fn push(&mut self, param: BindParam) -> usize {
        self.params.push(param);
        self.params.len()
    }

    /// Append an explicit NULL, returning its 1-based position
    pub fn push_null(&mut self) -> usize {
        self.push(BindParam::null())
    }

    /// Remove every parameter
    pub fn clear(&mut self) {
        self.params.clear();
    }

    /// Number of bound parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if no parameter is bound
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Get the parameter at a 1-based position
    pub fn get(&self, position: usize) -> Option<&BindParam> {
        position.checked_sub(1).and_then(|i| self.params.get(i))
    }

    /// Iterate over `(position, parameter)` pairs in bind order
    ///
    /// Positions start at 1. Each call starts a fresh pass over the list.
    pub fn iter(&self) -> Positions<'_> {
        Positions {
            inner: self.params.iter().enumerate(),
        }
    }

    /// The parameters as a slice, in bind order
    pub fn as_slice(&self) -> &[BindParam] {
        &self.params
    }
}

impl<'a> IntoIterator for &'a ParameterList {
    type Item = (usize, &'a BindParam);
    type IntoIter = Positions<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<BindParam> for ParameterList {
    fn from_iter<I: IntoIterator<Item = BindParam>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

/// Iterator over 1-based `(position, parameter)` pairs
#[derive(Debug, Clone)]
pub struct Positions<'a> {
    inner: std::iter::Enumerate<slice::Iter<'a, BindParam>>,
}

impl<'a> Iterator for Positions<'a> {
    type Item = (usize, &'a BindParam);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(i, p)| (i + 1, p))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Positions<'_> {}
