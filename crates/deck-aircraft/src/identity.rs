//! Aircraft identity as reported by the simulator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The `(icao, author)` pair identifying a simulator aircraft model.
///
/// Both fields come from the simulator's identity datarefs verbatim;
/// matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AircraftIdentity {
    pub icao: String,
    pub author: String,
}

impl AircraftIdentity {
    pub fn new(icao: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            icao: icao.into(),
            author: author.into(),
        }
    }

    /// Registry key, `ICAO::author`.
    pub fn key(&self) -> String {
        format!("{}::{}", self.icao, self.author)
    }
}

impl fmt::Display for AircraftIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.icao, self.author)
    }
}
