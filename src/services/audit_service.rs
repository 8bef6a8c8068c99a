use chrono::Utc;
use surrealdb::{engine::any::Any, sql::Datetime, Surreal};

use crate::{
    models::{
        analytics::{DateRange, RangeSpan},
        audit_log::{AuditEntry, AuditLogQuery, AuditLogRecord, AuditLogView},
        database_helpers::CountResult,
        pagination::{Page, PaginatedResponse, PaginationInfo},
    },
    Error, Result,
};

/// Outcome of a ledger write. It is reported, never propagated: the business
/// operation that triggered it has already succeeded or failed on its own.
#[must_use = "call .log() so failed audit writes are reported"]
#[derive(Debug)]
pub enum AuditWrite {
    Recorded,
    Failed(Error),
}

impl AuditWrite {
    pub fn log(self) {
        if let AuditWrite::Failed(err) = self {
            tracing::warn!(error = %err, "audit ledger write failed");
        }
    }
}

pub struct AuditService;

impl AuditService {
    pub async fn append(db: &Surreal<Any>, entry: AuditEntry) -> AuditWrite {
        let written = db
            .query(
                "CREATE system_log SET action = $action, target_table = $table, \
                 target_id = $id, result = $result, action_time = time::now()",
            )
            .bind(("action", entry.action))
            .bind(("table", entry.target_table))
            .bind(("id", entry.target_id))
            .bind(("result", entry.result))
            .await
            .and_then(|response| response.check());

        match written {
            Ok(_) => AuditWrite::Recorded,
            Err(err) => AuditWrite::Failed(err.into()),
        }
    }

    /// Appends and reports a failure on the operational log.
    pub async fn record(db: &Surreal<Any>, entry: AuditEntry) {
        Self::append(db, entry).await.log();
    }

    pub async fn list(
        db: &Surreal<Any>,
        query: &AuditLogQuery,
    ) -> Result<PaginatedResponse<AuditLogView>> {
        let range = DateRange::resolve(
            query.start_date.as_deref(),
            query.end_date.as_deref(),
            RangeSpan::All,
            Utc::now(),
        )?;
        let page = Page::resolve(query.page, query.page_size);

        let mut conditions = vec!["action_time >= $start", "action_time <= $end"];
        if query.result.is_some() {
            conditions.push("result = $result");
        }
        if query.target_table.is_some() {
            conditions.push("target_table = $table");
        }
        let where_clause = conditions.join(" AND ");

        let sql = format!(
            r#"
            SELECT count() AS total FROM system_log WHERE {where_clause} GROUP ALL;
            SELECT * FROM system_log WHERE {where_clause}
                ORDER BY action_time DESC
                LIMIT {} START {};
            "#,
            page.size,
            page.offset()
        );

        let mut response = db
            .query(sql)
            .bind(("start", Datetime::from(range.start)))
            .bind(("end", Datetime::from(range.end)))
            .bind(("result", query.result))
            .bind(("table", query.target_table.clone()))
            .await?;

        let total: Option<CountResult> = response.take(0)?;
        let records: Vec<AuditLogRecord> = response.take(1)?;

        Ok(PaginatedResponse {
            data: records.into_iter().map(AuditLogView::from).collect(),
            pagination: PaginationInfo::new(page, total.map(|t| t.total).unwrap_or(0)),
        })
    }
}
