//! The binary consensus value domain.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A consensus value: `0`, `1`, or "no estimate".
///
/// [`Value::Unknown`] is the permanent observable value of a crash-faulty
/// node. It is never produced by the decision logic of a non-faulty node
/// and must never be selected as a decided value. It is deliberately a
/// distinct variant rather than an `Option<bool>` so that every boundary
/// has to handle it explicitly.
///
/// On the wire (JSON) a value serializes as `0`, `1`, or `null`, matching
/// the control-surface shape observers expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Value {
    /// The binary value 0.
    Zero,
    /// The binary value 1.
    One,
    /// No estimate. Permanent for faulty nodes.
    #[default]
    Unknown,
}

impl Value {
    /// True for `Zero` and `One`, false for `Unknown`.
    pub fn is_known(self) -> bool {
        !matches!(self, Value::Unknown)
    }

    /// Numeric form, if known.
    pub fn as_bit(self) -> Option<u8> {
        match self {
            Value::Zero => Some(0),
            Value::One => Some(1),
            Value::Unknown => None,
        }
    }

    /// Build from a bit.
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Value::One
        } else {
            Value::Zero
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Zero => write!(f, "0"),
            Value::One => write!(f, "1"),
            Value::Unknown => write!(f, "?"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_bit() {
            Some(bit) => serializer.serialize_u8(bit),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<u8> = Option::deserialize(deserializer)?;
        match raw {
            Some(0) => Ok(Value::Zero),
            Some(1) => Ok(Value::One),
            Some(other) => Err(serde::de::Error::custom(format!(
                "value must be 0, 1 or null, got {other}"
            ))),
            None => Ok(Value::Unknown),
        }
    }
}
