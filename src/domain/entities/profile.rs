use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Portfolio profile. Only the owner flag matters to the education form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub is_owner: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Explicit owner-mode toggle.
///
/// `Deferred` lets the profile decide; the forced variants override it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerMode {
    ForcedOn,
    ForcedOff,
    #[default]
    Deferred,
}

impl OwnerMode {
    /// Reads the stored toggle value: only the exact strings `"true"` and
    /// `"false"` force a mode.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("true") => OwnerMode::ForcedOn,
            Some("false") => OwnerMode::ForcedOff,
            _ => OwnerMode::Deferred,
        }
    }

    pub fn resolve(&self, profile: Option<&Profile>) -> bool {
        match self {
            OwnerMode::ForcedOn => true,
            OwnerMode::ForcedOff => false,
            OwnerMode::Deferred => profile.and_then(|p| p.is_owner).unwrap_or(false),
        }
    }
}

impl From<Option<bool>> for OwnerMode {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => OwnerMode::ForcedOn,
            Some(false) => OwnerMode::ForcedOff,
            None => OwnerMode::Deferred,
        }
    }
}
