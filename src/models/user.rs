use serde::{Deserialize, Serialize};
use strum_macros::AsRefStr;
use surrealdb::sql::Thing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Normal,
    Banned,
}

/// The slice of an account the ledger reads from the identity collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: Thing,
    pub username: String,
    #[serde(default)]
    pub status: UserStatus,
}

impl UserRecord {
    pub fn is_banned(&self) -> bool {
        self.status == UserStatus::Banned
    }
}
