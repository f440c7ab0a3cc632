//! Project and appointment tag types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_TAG_COLOR: &str = "#3B82F6";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectTag {
    pub id: Uuid,
    pub project_id: Uuid,
    pub tag_name: String,
    pub tag_color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTagRequest {
    pub tag_name: String,
    #[serde(default)]
    pub tag_color: Option<String>,
}

/// `#RGB` or `#RRGGBB`
pub fn is_valid_color(color: &str) -> bool {
    let Some(hex) = color.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_hex_colors() {
        assert!(is_valid_color("#fff"));
        assert!(is_valid_color(DEFAULT_TAG_COLOR));
        assert!(!is_valid_color("3B82F6"));
        assert!(!is_valid_color("#3B82FZ"));
    }
}
