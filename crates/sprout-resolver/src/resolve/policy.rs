use serde::{Deserialize, Serialize};

/// What the resolver is allowed to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolutionPolicy {
    /// Apply steps instead of only planning them
    pub automatic_resolution: bool,
    /// Plan only, so a user can confirm before anything changes
    pub require_user_confirmation: bool,
    /// Permit substituting tools with declared alternatives
    pub allow_breaking_changes: bool,
    /// Permit demoting required edges as a last resort
    pub allow_edge_relaxation: bool,
    /// Pin to the highest compromise version rather than the lowest
    pub prefer_latest_versions: bool,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            automatic_resolution: true,
            require_user_confirmation: false,
            allow_breaking_changes: false,
            allow_edge_relaxation: true,
            prefer_latest_versions: true,
        }
    }
}

impl ResolutionPolicy {
    /// Whether resolution stops at a plan
    pub fn plans_only(&self) -> bool {
        !self.automatic_resolution || self.require_user_confirmation
    }
}
