//! External-facing object identifier: 24 lowercase-hex characters.

use std::fmt;

/// A 24-lowercase-hex identifier, the external shape for Topic/Idea/Draft/Prompt ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse a string, rejecting anything that isn't 24 lowercase-hex characters.
    pub fn parse(s: &str) -> Result<Self, String> {
        if s.len() == 24 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
            Ok(Self(s.to_string()))
        } else {
            Err(format!("'{s}' is not a valid ObjectID (24 lowercase-hex chars)"))
        }
    }

    /// Generate a new random ObjectID.
    pub fn generate() -> Self {
        let bytes: [u8; 12] = rand::random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}
