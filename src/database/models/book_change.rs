use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Kind of mutation recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Error)]
#[error("Unknown change action: {0}")]
pub struct UnknownAction(pub String);

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "create",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
        }
    }
}

impl TryFrom<String> for ChangeAction {
    type Error = UnknownAction;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "create" => Ok(ChangeAction::Create),
            "update" => Ok(ChangeAction::Update),
            "delete" => Ok(ChangeAction::Delete),
            _ => Err(UnknownAction(value)),
        }
    }
}

/// Append-only audit row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BookChange {
    pub id: Uuid,
    pub book_id: Option<Uuid>,
    pub admin_id: Option<Uuid>,
    #[sqlx(try_from = "String")]
    pub action: ChangeAction,
    pub changes: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBookChange {
    pub book_id: Uuid,
    pub admin_id: Uuid,
    pub action: ChangeAction,
    pub changes: Value,
}
