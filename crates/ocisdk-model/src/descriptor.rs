//! Declared payload types.
//!
//! Call sites describe the expected shape of a response with a
//! [`TypeDescriptor`], either built directly or parsed from the descriptor
//! strings used throughout the service definitions:
//!
//! ```text
//! String  Integer  Float  Boolean  DateTime  Object  Stream
//! Array<T>  Map<String, T>  <ModelName>
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, ModelResult};

/// The declared type of a payload or field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// A JSON string.
    String,
    /// A JSON integer.
    Integer,
    /// A JSON number.
    Float,
    /// A JSON boolean.
    Boolean,
    /// An RFC 3339 timestamp string.
    DateTime,
    /// Free-form JSON, passed through untouched.
    Object,
    /// A JSON array of the inner type.
    Array(Box<TypeDescriptor>),
    /// A JSON object with string keys and values of the inner type.
    Map(Box<TypeDescriptor>),
    /// A model registered under the given name.
    Model(String),
    /// The raw response body, returned verbatim.
    RawStream,
}

impl TypeDescriptor {
    /// `Array<inner>`.
    #[must_use]
    pub fn array(inner: Self) -> Self {
        Self::Array(Box::new(inner))
    }

    /// `Map<String, inner>`.
    #[must_use]
    pub fn map(inner: Self) -> Self {
        Self::Map(Box::new(inner))
    }

    /// A named model.
    #[must_use]
    pub fn model(name: impl Into<String>) -> Self {
        Self::Model(name.into())
    }

    /// Parse a descriptor string.
    ///
    /// # Examples
    ///
    /// ```
    /// use ocisdk_model::TypeDescriptor;
    ///
    /// let d = TypeDescriptor::parse("Array<Map<String, Alarm>>").unwrap();
    /// assert_eq!(
    ///     d,
    ///     TypeDescriptor::array(TypeDescriptor::map(TypeDescriptor::model("Alarm")))
    /// );
    /// ```
    pub fn parse(input: &str) -> ModelResult<Self> {
        let input = input.trim();
        let invalid = || ModelError::InvalidDescriptor(input.to_owned());

        if let Some(inner) = strip_generic(input, "Array") {
            return Ok(Self::array(Self::parse(inner)?));
        }
        if let Some(inner) = strip_generic(input, "Map").or_else(|| strip_generic(input, "Hash")) {
            let value = match split_top_level_comma(inner) {
                Some((key, value)) => {
                    if key.trim() != "String" {
                        return Err(invalid());
                    }
                    value
                }
                None => inner,
            };
            return Ok(Self::map(Self::parse(value)?));
        }

        match input {
            "String" => Ok(Self::String),
            "Integer" => Ok(Self::Integer),
            "Float" => Ok(Self::Float),
            "Boolean" | "BOOLEAN" => Ok(Self::Boolean),
            "DateTime" | "Date" => Ok(Self::DateTime),
            "Object" => Ok(Self::Object),
            "Stream" | "RawStream" => Ok(Self::RawStream),
            name if is_identifier(name) => Ok(Self::model(name)),
            _ => Err(invalid()),
        }
    }

    /// Whether this is the raw body sentinel.
    #[must_use]
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::RawStream)
    }
}

impl FromStr for TypeDescriptor {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("String"),
            Self::Integer => f.write_str("Integer"),
            Self::Float => f.write_str("Float"),
            Self::Boolean => f.write_str("Boolean"),
            Self::DateTime => f.write_str("DateTime"),
            Self::Object => f.write_str("Object"),
            Self::Array(inner) => write!(f, "Array<{inner}>"),
            Self::Map(inner) => write!(f, "Map<String, {inner}>"),
            Self::Model(name) => f.write_str(name),
            Self::RawStream => f.write_str("Stream"),
        }
    }
}

fn strip_generic<'a>(input: &'a str, name: &str) -> Option<&'a str> {
    input
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('<')?
        .strip_suffix('>')
}

fn split_top_level_comma(input: &str) -> Option<(&str, &str)> {
    let mut depth = 0_i32;
    for (i, c) in input.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => return Some((&input[..i], &input[i + 1..])),
            _ => {}
        }
    }
    None
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
