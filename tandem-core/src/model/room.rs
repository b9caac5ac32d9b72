use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_ROOM_ID_LEN: usize = 128;

/// Opaque rendezvous key. Supplied by the user, never generated here.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            return Err(ValidationError::EmptyRoomId);
        }
        if self.0.len() > MAX_ROOM_ID_LEN {
            return Err(ValidationError::RoomIdTooLong(self.0.len()));
        }
        if self.0.chars().any(char::is_control) {
            return Err(ValidationError::RoomIdControlChars);
        }
        Ok(())
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
