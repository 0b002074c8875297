use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use crate::utils::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SalesProfessional,
    Investor,
    Corporation,
    Admin,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::SalesProfessional,
        UserRole::Investor,
        UserRole::Corporation,
        UserRole::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::SalesProfessional => "sales_professional",
            UserRole::Investor => "investor",
            UserRole::Corporation => "corporation",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sales_professional" => Some(UserRole::SalesProfessional),
            "investor" => Some(UserRole::Investor),
            "corporation" => Some(UserRole::Corporation),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub role: UserRole,
    pub avatar_seed: Option<String>,
    pub blocked_users: Vec<String>,
    pub created_at: String,
}

impl User {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role,
            avatar_seed: None,
            blocked_users: Vec::new(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn with_avatar_seed(mut self, seed: impl Into<String>) -> Self {
        self.avatar_seed = Some(seed.into());
        self
    }

    pub fn has_blocked(&self, user_id: &str) -> bool {
        self.blocked_users.iter().any(|id| id == user_id)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Row shape of the `users` table. The block list is stored as a JSON array.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub display_name: String,
    pub role: String,
    pub avatar_seed: Option<String>,
    pub blocked_users: String,
    pub created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> AppResult<Self> {
        let role = UserRole::parse(&row.role)
            .ok_or_else(|| AppError::Internal(format!("Unknown user role: {}", row.role)))?;
        let blocked_users: Vec<String> = serde_json::from_str(&row.blocked_users)?;

        Ok(Self {
            id: row.id,
            display_name: row.display_name,
            role,
            avatar_seed: row.avatar_seed,
            blocked_users,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_strings_round_trip() {
        for role in UserRole::ALL {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::parse("startup"), None);
    }

    #[test]
    fn row_with_bad_block_list_is_rejected() {
        let row = UserRow {
            id: "u1".to_string(),
            display_name: "Ada".to_string(),
            role: "investor".to_string(),
            avatar_seed: None,
            blocked_users: "not json".to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        assert!(User::try_from(row).is_err());
    }
}
