use std::cmp::Ordering;
use std::fmt;

use crate::types::{LabelId, PropId, Result, SombraError};

/// Logical type of a property value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TypeTag {
    Null,
    Bool,
    Int,
    Float,
    String,
    Bytes,
    Date,
    DateTime,
}

impl TypeTag {
    /// Leading byte written by [`encode_value`].
    pub const fn as_u8(self) -> u8 {
        match self {
            TypeTag::Null => 0,
            TypeTag::Bool => 1,
            TypeTag::Int => 2,
            TypeTag::Float => 3,
            TypeTag::String => 4,
            TypeTag::Bytes => 5,
            TypeTag::Date => 6,
            TypeTag::DateTime => 7,
        }
    }
}

/// Property value with owned data.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValueOwned {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// Owned string.
    Str(String),
    /// Owned byte vector.
    Bytes(Vec<u8>),
    /// Date value represented as Unix timestamp (days since epoch).
    Date(i64),
    /// DateTime value represented as Unix timestamp (milliseconds since epoch).
    DateTime(i64),
}

impl PropValueOwned {
    /// Returns the logical type of this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            PropValueOwned::Null => TypeTag::Null,
            PropValueOwned::Bool(_) => TypeTag::Bool,
            PropValueOwned::Int(_) => TypeTag::Int,
            PropValueOwned::Float(_) => TypeTag::Float,
            PropValueOwned::Str(_) => TypeTag::String,
            PropValueOwned::Bytes(_) => TypeTag::Bytes,
            PropValueOwned::Date(_) => TypeTag::Date,
            PropValueOwned::DateTime(_) => TypeTag::DateTime,
        }
    }
}

impl fmt::Display for PropValueOwned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValueOwned::Null => write!(f, "null"),
            PropValueOwned::Bool(v) => write!(f, "{v}"),
            PropValueOwned::Int(v) => write!(f, "{v}"),
            PropValueOwned::Float(v) => write!(f, "{v}"),
            PropValueOwned::Str(v) => write!(f, "{v}"),
            PropValueOwned::Bytes(v) => write!(f, "bytes(len={})", v.len()),
            PropValueOwned::Date(v) => write!(f, "date({v})"),
            PropValueOwned::DateTime(v) => write!(f, "datetime({v})"),
        }
    }
}

impl From<&str> for PropValueOwned {
    fn from(value: &str) -> Self {
        PropValueOwned::Str(value.to_owned())
    }
}

impl From<String> for PropValueOwned {
    fn from(value: String) -> Self {
        PropValueOwned::Str(value)
    }
}

impl From<i64> for PropValueOwned {
    fn from(value: i64) -> Self {
        PropValueOwned::Int(value)
    }
}

impl From<bool> for PropValueOwned {
    fn from(value: bool) -> Self {
        PropValueOwned::Bool(value)
    }
}

/// Committed state of a node as seen by the store read layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeData {
    /// Node labels.
    pub labels: Vec<LabelId>,
    /// Node properties as (property ID, value) pairs.
    pub props: Vec<(PropId, PropValueOwned)>,
}

impl NodeData {
    /// Returns `true` when the node carries `label`.
    pub fn has_label(&self, label: LabelId) -> bool {
        self.labels.contains(&label)
    }

    /// Returns the committed value of `prop`, if set.
    pub fn property(&self, prop: PropId) -> Option<&PropValueOwned> {
        self.props
            .iter()
            .find(|(id, _)| *id == prop)
            .map(|(_, value)| value)
    }
}

/// Encodes a value as a type-tagged, order-preserving byte key.
///
/// Numeric and temporal values of the same type sort by their natural order;
/// strings and byte arrays are length-prefixed. Values of different types sort
/// by [`TypeTag`]. NaN floats have no stable position and are rejected.
pub fn encode_value(value: &PropValueOwned) -> Result<Vec<u8>> {
    use PropValueOwned::*;
    let mut out = vec![value.type_tag().as_u8()];
    match value {
        Null => {}
        Bool(v) => out.push(u8::from(*v)),
        Int(v) | Date(v) | DateTime(v) => out.extend_from_slice(&encode_i64_key(*v)),
        Float(v) => out.extend_from_slice(&encode_f64_key(*v)?),
        Str(s) => encode_bytes_key(s.as_bytes(), &mut out)?,
        Bytes(b) => encode_bytes_key(b, &mut out)?,
    }
    Ok(out)
}

fn encode_i64_key(value: i64) -> [u8; 8] {
    ((value as u64) ^ 0x8000_0000_0000_0000).to_be_bytes()
}

fn encode_f64_key(value: f64) -> Result<[u8; 8]> {
    if value.is_nan() {
        return Err(SombraError::Invalid("NaN values cannot be indexed"));
    }
    let bits = value.to_bits();
    let normalized = if bits & 0x8000_0000_0000_0000 != 0 {
        !bits
    } else {
        bits ^ 0x8000_0000_0000_0000
    };
    Ok(normalized.to_be_bytes())
}

fn encode_bytes_key(bytes: &[u8], out: &mut Vec<u8>) -> Result<()> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| SombraError::Invalid("property value exceeds maximum length"))?;
    out.reserve(4 + bytes.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

/// Compares two values of the same type.
///
/// Returns `None` when the types differ or a float comparison involves NaN.
pub fn compare_values(a: &PropValueOwned, b: &PropValueOwned) -> Option<Ordering> {
    use PropValueOwned::*;
    match (a, b) {
        (Null, Null) => Some(Ordering::Equal),
        (Bool(a), Bool(b)) => Some(a.cmp(b)),
        (Int(a), Int(b)) => Some(a.cmp(b)),
        (Float(a), Float(b)) => a.partial_cmp(b),
        (Str(a), Str(b)) => Some(a.cmp(b)),
        (Bytes(a), Bytes(b)) => Some(a.cmp(b)),
        (Date(a), Date(b)) => Some(a.cmp(b)),
        (DateTime(a), DateTime(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
