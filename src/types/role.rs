//! User role types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Agent,
    ProjectUser,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Agent => "agent",
            UserRole::ProjectUser => "project_user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "agent" => Some(UserRole::Agent),
            "project_user" | "project user" | "client" => Some(UserRole::ProjectUser),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            UserRole::Admin => "Administrator",
            UserRole::Agent => "Agent",
            UserRole::ProjectUser => "Project User",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::ProjectUser
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleResponse {
    pub user_id: Uuid,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRoleRequest {
    pub role: UserRole,
}
