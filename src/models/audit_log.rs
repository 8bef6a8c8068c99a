use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::AsRefStr;
use surrealdb::sql::{Datetime, Thing};

use crate::helpers::thing_helpers::record_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuditResult {
    Success,
    Fail,
}

/// One entry to append to the ledger.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub action: String,
    pub target_table: Option<&'static str>,
    pub target_id: Option<String>,
    pub result: AuditResult,
}

impl AuditEntry {
    pub fn new(action: impl Into<String>, result: AuditResult) -> Self {
        Self {
            action: action.into(),
            target_table: None,
            target_id: None,
            result,
        }
    }

    pub fn on(mut self, table: &'static str, id: impl Into<String>) -> Self {
        self.target_table = Some(table);
        self.target_id = Some(id.into());
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct AuditLogRecord {
    pub id: Thing,
    pub action: String,
    #[serde(default)]
    pub target_table: Option<String>,
    #[serde(default)]
    pub target_id: Option<String>,
    pub result: AuditResult,
    pub action_time: Datetime,
}

#[derive(Debug, Serialize)]
pub struct AuditLogView {
    pub log_id: String,
    pub action: String,
    pub target_table: Option<String>,
    pub target_id: Option<String>,
    pub result: AuditResult,
    pub action_time: DateTime<Utc>,
}

impl From<AuditLogRecord> for AuditLogView {
    fn from(record: AuditLogRecord) -> Self {
        Self {
            log_id: record_key(&record.id),
            action: record.action,
            target_table: record.target_table,
            target_id: record.target_id,
            result: record.result,
            action_time: record.action_time.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQuery {
    pub result: Option<AuditResult>,
    pub target_table: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}
