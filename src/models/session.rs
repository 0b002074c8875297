use serde::{Deserialize, Serialize};

use crate::models::user::{User, UserRole};

/// The authenticated viewer. Every service takes it explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub display_name: String,
    pub role: UserRole,
    pub avatar_seed: Option<String>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            avatar_seed: user.avatar_seed.clone(),
        }
    }
}
