//! Platform user roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Role a user holds on the DevX platform.
///
/// Serialized in SCREAMING_SNAKE_CASE on the wire and in storage
/// (e.g. "SUPER_ADMIN", "JUDGE").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    SuperAdmin,
    Organizer,
    Participant,
    Judge,
}

impl UserRole {
    /// Returns the wire representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::SuperAdmin => "SUPER_ADMIN",
            UserRole::Organizer => "ORGANIZER",
            UserRole::Participant => "PARTICIPANT",
            UserRole::Judge => "JUDGE",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUPER_ADMIN" => Ok(UserRole::SuperAdmin),
            "ORGANIZER" => Ok(UserRole::Organizer),
            "PARTICIPANT" => Ok(UserRole::Participant),
            "JUDGE" => Ok(UserRole::Judge),
            other => Err(ValidationError::invalid_format(
                "userRole",
                format!("unknown role '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&UserRole::SuperAdmin).unwrap();
        assert_eq!(json, "\"SUPER_ADMIN\"");

        let json = serde_json::to_string(&UserRole::Judge).unwrap();
        assert_eq!(json, "\"JUDGE\"");
    }

    #[test]
    fn role_deserializes_from_wire_form() {
        let role: UserRole = serde_json::from_str("\"ORGANIZER\"").unwrap();
        assert_eq!(role, UserRole::Organizer);
    }

    #[test]
    fn role_parses_and_displays_symmetrically() {
        for role in [
            UserRole::SuperAdmin,
            UserRole::Organizer,
            UserRole::Participant,
            UserRole::Judge,
        ] {
            let parsed: UserRole = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
            assert_eq!(format!("{}", role), role.as_str());
        }
    }

    #[test]
    fn role_rejects_unknown_value() {
        assert!("ADMIN".parse::<UserRole>().is_err());
        assert!("judge".parse::<UserRole>().is_err());
    }
}
