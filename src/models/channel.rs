use serde::{Deserialize, Serialize};

/// A named slot in the rotation. Carries identity only; the directory
/// resolves which segment is currently airing on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: i64,
    pub name: String,
}

impl Channel {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
