//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a vehicle (partition key of the vehicle table).
///
/// Records that do not carry a usable identifier are filed under
/// [`VehicleId::UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(String);

impl VehicleId {
    /// Sentinel used when a record has no `vehicleId`.
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for VehicleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for VehicleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for VehicleId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DomainError::validation("VehicleId: must not be empty"));
        }
        Ok(Self(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sentinel() {
        let id = VehicleId::unknown();
        assert_eq!(id.as_str(), "unknown");
        assert!(id.is_unknown());
        assert!(!VehicleId::from("V1").is_unknown());
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(matches!(
            "".parse::<VehicleId>(),
            Err(DomainError::Validation(_))
        ));
        assert_eq!("V7".parse::<VehicleId>().unwrap(), VehicleId::from("V7"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&VehicleId::from("V1")).unwrap();
        assert_eq!(json, "\"V1\"");
    }
}
