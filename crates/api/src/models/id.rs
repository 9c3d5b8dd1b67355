use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Identifier of a remote resource.
///
/// Depending on the endpoint the backend hands out either numeric or string
/// identifiers; both are normalised to their textual form. Numeric ids are
/// written back as JSON numbers so payloads round-trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn as_number(&self) -> Option<u64> {
        // Leading zeros would not survive a trip through a JSON number.
        match self.0.starts_with('0') && self.0.len() > 1 {
            true => None,
            false => self.0.parse().ok(),
        }
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ResourceId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_number() {
            Some(number) => serializer.serialize_u64(number),
            None => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Unsigned(u64),
            Signed(i64),
            Text(String),
        }
        Ok(match Wire::deserialize(deserializer)? {
            Wire::Unsigned(id) => Self(id.to_string()),
            Wire::Signed(id) => Self(id.to_string()),
            Wire::Text(id) => Self(id),
        })
    }
}
