//! Binding tables: which request parts populate which model fields.
//!
//! A request model lists one [`FieldBinding`] per field that is read from a
//! path segment, query parameter or header. Each binding names the source,
//! the tag the value is found under, and a typed setter. The raw text is
//! coerced to the setter's kind before it is assigned.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Request part a binding reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingSource {
    Path,
    Query,
    Header,
}

impl BindingSource {
    /// Lower-case name used in error details.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
        }
    }
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed assignment of a coerced value into a model field.
pub enum Setter<M> {
    Text(fn(&mut M, String)),
    Integer(fn(&mut M, i64)),
    Boolean(fn(&mut M, bool)),
    Uuid(fn(&mut M, Uuid)),
}

impl<M> Setter<M> {
    /// Name of the expected kind, as reported to clients.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "string",
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
            Self::Uuid(_) => "uuid",
        }
    }
}

impl<M> Clone for Setter<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for Setter<M> {}

impl<M> fmt::Debug for Setter<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Setter").field(&self.kind()).finish()
    }
}

/// A raw value could not be coerced to its field's kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldBindingError {
    #[error("{location} parameter '{field}' must be a valid {expected}, got '{value}'")]
    Malformed {
        location: BindingSource,
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// One row of a model's binding table.
pub struct FieldBinding<M> {
    pub source: BindingSource,
    pub tag: &'static str,
    pub setter: Setter<M>,
}

impl<M> Clone for FieldBinding<M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M> Copy for FieldBinding<M> {}

impl<M> fmt::Debug for FieldBinding<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("source", &self.source)
            .field("tag", &self.tag)
            .field("setter", &self.setter)
            .finish()
    }
}

impl<M> FieldBinding<M> {
    /// Bind the path segment named `tag`.
    pub const fn path(tag: &'static str, setter: Setter<M>) -> Self {
        Self {
            source: BindingSource::Path,
            tag,
            setter,
        }
    }

    /// Bind the query parameter named `tag`.
    pub const fn query(tag: &'static str, setter: Setter<M>) -> Self {
        Self {
            source: BindingSource::Query,
            tag,
            setter,
        }
    }

    /// Bind the header named `tag`.
    pub const fn header(tag: &'static str, setter: Setter<M>) -> Self {
        Self {
            source: BindingSource::Header,
            tag,
            setter,
        }
    }

    /// Coerce `raw` and assign it. Empty input leaves the field untouched.
    ///
    /// # Errors
    /// [`FieldBindingError::Malformed`] when `raw` does not parse as the
    /// setter's kind.
    pub fn bind(&self, model: &mut M, raw: &str) -> Result<(), FieldBindingError> {
        if raw.is_empty() {
            return Ok(());
        }
        let malformed = || FieldBindingError::Malformed {
            location: self.source,
            field: self.tag,
            value: raw.to_owned(),
            expected: self.setter.kind(),
        };
        match self.setter {
            Setter::Text(set) => set(model, raw.to_owned()),
            Setter::Integer(set) => set(model, raw.parse().map_err(|_| malformed())?),
            Setter::Boolean(set) => set(model, parse_bool(raw).ok_or_else(malformed)?),
            Setter::Uuid(set) => set(model, parse_uuid(raw).ok_or_else(malformed)?),
        }
        Ok(())
    }
}

/// Hyphenated identifiers only; the simple, braced and URN forms are refused.
#[must_use]
pub fn parse_uuid(raw: &str) -> Option<Uuid> {
    if raw.len() != 36 {
        return None;
    }
    Uuid::try_parse(raw).ok()
}

/// Boolean spellings accepted in paths, queries and headers.
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
