use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of an authenticated user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<UserId> for Uuid {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// Resolved user record for an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: UserId,
    pub username: String,
    /// Elevated-privilege flag checked by staff-gated routes.
    pub staff: bool,
}

impl UserInfo {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            staff: false,
        }
    }

    pub fn staff(username: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            staff: true,
        }
    }
}

/// The identity associated with one request: an explicit anonymous marker,
/// or a resolved user.
///
/// Resolved once per request and cached; the variants make "not logged in"
/// a normal value rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Principal {
    Anonymous,
    User(UserInfo),
}

impl Principal {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::User(_))
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Principal::User(user) if user.staff)
    }

    pub fn user(&self) -> Option<&UserInfo> {
        match self {
            Principal::Anonymous => None,
            Principal::User(user) => Some(user),
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.user().map(|user| user.username.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_is_not_authenticated() {
        let principal = Principal::Anonymous;
        assert!(!principal.is_authenticated());
        assert!(!principal.is_staff());
        assert_eq!(principal.username(), None);
    }

    #[test]
    fn user_without_staff_flag() {
        let principal = Principal::User(UserInfo::new("user"));
        assert!(principal.is_authenticated());
        assert!(!principal.is_staff());
        assert_eq!(principal.username(), Some("user"));
    }

    #[test]
    fn staff_user() {
        let principal = Principal::User(UserInfo::staff("root"));
        assert!(principal.is_authenticated());
        assert!(principal.is_staff());
    }
}
