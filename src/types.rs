/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access level the host platform grants a user on an experience or company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Admin,
    Customer,
    NoAccess,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Admin => "admin",
            AccessLevel::Customer => "customer",
            AccessLevel::NoAccess => "no_access",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(AccessLevel::Admin),
            "customer" => Ok(AccessLevel::Customer),
            "no_access" => Ok(AccessLevel::NoAccess),
            other => Err(format!("unknown access level '{}'", other)),
        }
    }
}

/// Which side of the marketplace a profile belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Founder,
    Investor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Founder => "FOUNDER",
            Role::Investor => "INVESTOR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FOUNDER" => Ok(Role::Founder),
            "INVESTOR" => Ok(Role::Investor),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_level_wire_names() {
        assert_eq!(serde_json::to_value(AccessLevel::NoAccess).unwrap(), "no_access");
        assert_eq!("admin".parse::<AccessLevel>().unwrap(), AccessLevel::Admin);
        assert!("root".parse::<AccessLevel>().is_err());
    }

    #[test]
    fn role_wire_names() {
        assert_eq!(serde_json::to_value(Role::Founder).unwrap(), "FOUNDER");
        let role: Role = serde_json::from_value(serde_json::json!("INVESTOR")).unwrap();
        assert_eq!(role, Role::Investor);
        assert!(serde_json::from_value::<Role>(serde_json::json!("founder")).is_err());
    }
}
