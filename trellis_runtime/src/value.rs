// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Datum scalars and data rows.

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::format::format_value;

/// A single datum scalar.
///
/// Rows hold `FieldValue`s; channel encodings read them; scales map them.
/// `Null` marks an absent or undefined value, which excludes the row from
/// positional encoding.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// Absent or undefined value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// String value.
    Str(Arc<str>),
}

impl FieldValue {
    /// Whether this value is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The numeric content, if this is a `Number`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// The string content, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean content, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Display form: `Null` is empty, numbers drop a trailing `.0`.
    pub fn label(&self) -> String {
        format_value(self)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Str(Arc::from(v))
    }
}

impl From<Arc<str>> for FieldValue {
    fn from(v: Arc<str>) -> Self {
        Self::Str(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Str(Arc::from(v.as_str()))
    }
}

/// One data row: ordered `(field, value)` pairs with by-name lookup.
///
/// Field order is preserved so derived output (tooltips, titles) follows the
/// order rows were authored in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: Vec<(Arc<str>, FieldValue)>,
}

impl Record {
    /// An empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, consuming and returning the row.
    pub fn with(mut self, field: impl Into<Arc<str>>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((field.into(), value.into()));
        self
    }

    /// Look up a field by name.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| &**name == field)
            .map(|(_, value)| value)
    }

    /// Overwrite a field in place, appending it when absent.
    pub fn set(&mut self, field: impl Into<Arc<str>>, value: impl Into<FieldValue>) {
        let field = field.into();
        let value = value.into();
        if let Some(slot) = self.fields.iter_mut().find(|(name, _)| *name == field) {
            slot.1 = value;
        } else {
            self.fields.push((field, value));
        }
    }

    /// Iterate fields in authored order.
    pub fn fields(&self) -> impl Iterator<Item = (&Arc<str>, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name, value))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
