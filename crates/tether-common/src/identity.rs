use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable address of a window across every runtime instance.
///
/// An identity carries no ownership; it is looked up fresh whenever an
/// operation needs the window behind it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub owner_id: String,
    pub window_name: String,
}

impl Identity {
    pub fn new(owner_id: impl Into<String>, window_name: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            window_name: window_name.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner_id, self.window_name)
    }
}

/// Parses the `owner/window` form produced by `Display`.
impl FromStr for Identity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {
                Ok(Identity::new(owner, name))
            }
            _ => Err(format!("expected <owner>/<window>, got '{s}'")),
        }
    }
}
