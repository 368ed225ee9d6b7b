//! User Account Type Value Object

use serde::{Deserialize, Serialize};
use std::fmt;

/// User account type
///
/// `Root` is the distinguished administrative type: a root account with
/// no password digest set is a legitimate passwordless account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(i16)]
pub enum UserType {
    Root = 0,
    Admin = 1,
    #[default]
    User = 2,
    Guest = 3,
}

impl UserType {
    /// Numeric ID for database storage
    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    /// String code for serialization/API
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Admin => "admin",
            Self::User => "user",
            Self::Guest => "guest",
        }
    }

    #[inline]
    pub const fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    /// Create from numeric ID
    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Self::Root),
            1 => Some(Self::Admin),
            2 => Some(Self::User),
            3 => Some(Self::Guest),
            _ => None,
        }
    }

    /// Create from string code
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "root" => Some(Self::Root),
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            "guest" => Some(Self::Guest),
            _ => None,
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id() {
        assert_eq!(UserType::from_id(0), Some(UserType::Root));
        assert_eq!(UserType::from_id(1), Some(UserType::Admin));
        assert_eq!(UserType::from_id(2), Some(UserType::User));
        assert_eq!(UserType::from_id(3), Some(UserType::Guest));
        assert_eq!(UserType::from_id(99), None);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(UserType::from_code("root"), Some(UserType::Root));
        assert_eq!(UserType::from_code("admin"), Some(UserType::Admin));
        assert_eq!(UserType::from_code("user"), Some(UserType::User));
        assert_eq!(UserType::from_code("guest"), Some(UserType::Guest));
        assert_eq!(UserType::from_code("invalid"), None);
    }

    #[test]
    fn test_is_root() {
        assert!(UserType::Root.is_root());
        assert!(!UserType::Admin.is_root());
        assert!(!UserType::User.is_root());
        assert!(!UserType::Guest.is_root());
    }

    #[test]
    fn test_display() {
        assert_eq!(UserType::Root.to_string(), "root");
        assert_eq!(UserType::User.to_string(), "user");
    }
}
