//! User entity.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId, UserRole};

/// A platform user.
///
/// Users are created lazily the first time an unseen id sends a message;
/// this flow never deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: Timestamp,
}

impl User {
    /// Creates a new user record.
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        name: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            name: name.into(),
            role,
            created_at: Timestamp::now(),
        }
    }

    /// Materializes the demo identity used for lazily-created users:
    /// email `<id>@demo.com`, display name "Demo User".
    pub fn demo(id: UserId, role: UserRole) -> Self {
        let email = format!("{}@demo.com", id);
        Self::new(id, email, "Demo User", role)
    }
}
