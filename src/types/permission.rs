use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Permission is the ordered level an actor holds on a project.
/// Admin implies write implies read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Permission {
    Read = 0,
    Write = 1,
    Admin = 2,
}

impl Permission {
    /// Returns true if this level satisfies the required one.
    #[must_use]
    pub fn has(self, required: Permission) -> bool {
        self >= required
    }

    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self as i64
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i64> for Permission {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Read),
            1 => Ok(Self::Write),
            2 => Ok(Self::Admin),
            other => Err(Error::InvalidPermission(other.to_string())),
        }
    }
}

impl From<Permission> for i64 {
    fn from(p: Permission) -> Self {
        p.as_i64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_order() {
        assert!(Permission::Read < Permission::Write);
        assert!(Permission::Write < Permission::Admin);
        assert_eq!(
            [Permission::Write, Permission::Admin, Permission::Read]
                .into_iter()
                .max(),
            Some(Permission::Admin)
        );
    }

    #[test]
    fn test_permission_has() {
        assert!(Permission::Admin.has(Permission::Write));
        assert!(Permission::Write.has(Permission::Read));
        assert!(!Permission::Read.has(Permission::Write));
        assert!(!Permission::Write.has(Permission::Admin));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(matches!(
            Permission::try_from(3),
            Err(Error::InvalidPermission(_))
        ));
        assert!(Permission::try_from(-1).is_err());
    }

    #[test]
    fn test_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Permission::Write).unwrap(), "1");
        let parsed: Permission = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, Permission::Admin);
        assert!(serde_json::from_str::<Permission>("7").is_err());
    }
}
