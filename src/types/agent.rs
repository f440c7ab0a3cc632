//! Call-center agent types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Agent {
    pub id: Uuid,
    pub agent_number: String,
    pub agent_name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    /// Whether a free-text agent reference from a call or appointment
    /// points at this agent (by number, or by name ignoring case).
    pub fn matches(&self, reference: &str) -> bool {
        let reference = reference.trim();
        !reference.is_empty()
            && (reference == self.agent_number.trim()
                || reference.eq_ignore_ascii_case(self.agent_name.trim()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAgentRequest {
    pub agent_number: String,
    pub agent_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAgentRequest {
    pub agent_number: Option<String>,
    pub agent_name: Option<String>,
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> Agent {
        Agent {
            id: Uuid::new_v4(),
            agent_number: "A-17".into(),
            agent_name: "Dana Lopez".into(),
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn matches_by_number_or_name() {
        let a = agent();
        assert!(a.matches("A-17"));
        assert!(a.matches(" dana lopez "));
        assert!(!a.matches("Dana"));
        assert!(!a.matches(""));
    }
}
