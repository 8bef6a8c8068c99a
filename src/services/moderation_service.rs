use surrealdb::{engine::any::Any, Surreal};

use crate::{
    helpers::thing_helpers::record_key,
    models::{
        audit_log::{AuditEntry, AuditResult},
        comment::{CommentRecord, CommentStatus, CommentView, ModerationOutcome},
        database_helpers::{CountResult, CreatedRecord},
        moderation::{AuditCommentRequest, AuditVerdict},
        pagination::{Page, PaginatedResponse, PaginationInfo, PaginationQuery},
    },
    services::{audit_service::AuditService, comment_service::CommentService},
    validators::required,
    Error, Result,
};

pub struct ModerationService;

impl ModerationService {
    /// Comments awaiting an admin decision, oldest first.
    pub async fn pending(
        db: &Surreal<Any>,
        query: &PaginationQuery,
    ) -> Result<PaginatedResponse<CommentView>> {
        let page = Page::resolve(query.page, query.page_size);

        let sql = format!(
            r#"
            SELECT count() AS total FROM comment WHERE status IN $states GROUP ALL;
            SELECT id, author, author.username AS author_name, target_type, target,
                   content, parent, status, like_count, created_at
                FROM comment WHERE status IN $states
                ORDER BY created_at ASC
                LIMIT {} START {};
            "#,
            page.size,
            page.offset()
        );
        let mut response = db
            .query(sql)
            .bind(("states", CommentStatus::AWAITING_REVIEW))
            .await?;

        let total: Option<CountResult> = response.take(0)?;
        let records: Vec<CommentRecord> = response.take(1)?;

        Ok(PaginatedResponse {
            data: records.into_iter().map(CommentView::from).collect(),
            pagination: PaginationInfo::new(page, total.map(|t| t.total).unwrap_or(0)),
        })
    }

    pub async fn audit_decision(
        db: &Surreal<Any>,
        request: &AuditCommentRequest,
    ) -> Result<ModerationOutcome> {
        let comment_id = required(request.comment_id.as_deref(), "comment_id")?;
        let verdict = AuditVerdict::parse(
            &required(request.result.as_deref(), "result")?,
            request.ban_user,
        )?;

        let comment = CommentService::get_record(db, &comment_id)
            .await?
            .ok_or_else(|| Error::CommentNotFound {
                id: comment_id.clone(),
            })?;
        let outcome = comment.status.apply(verdict.event())?;

        let written = match verdict {
            AuditVerdict::Pass => Self::pass(db, &comment).await,
            AuditVerdict::Reject { ban_author } => Self::reject(db, &comment, ban_author).await,
        };

        let key = record_key(&comment.id);
        let action = match verdict {
            AuditVerdict::Pass => "audit comment: pass".to_string(),
            AuditVerdict::Reject { ban_author: false } => "audit comment: reject".to_string(),
            AuditVerdict::Reject { ban_author: true } => format!(
                "audit comment: reject and ban user {}",
                record_key(&comment.author)
            ),
        };
        let result = if written.is_ok() {
            AuditResult::Success
        } else {
            AuditResult::Fail
        };
        AuditService::record(db, AuditEntry::new(action, result).on("comment", &key)).await;

        written?;
        tracing::info!(comment_id = %key, outcome = ?outcome, "moderation decision applied");
        Ok(outcome)
    }

    /// Only flips a comment that is still awaiting review.
    async fn pass(db: &Surreal<Any>, comment: &CommentRecord) -> Result<()> {
        let mut response = db
            .query("UPDATE $comment SET status = $normal WHERE status IN $states RETURN id")
            .bind(("comment", comment.id.clone()))
            .bind(("normal", CommentStatus::Normal))
            .bind(("states", CommentStatus::AWAITING_REVIEW))
            .await?;
        let updated: Option<CreatedRecord> = response.take(0)?;

        updated
            .map(|_| ())
            .ok_or_else(|| Error::invalid("comment is no longer awaiting review"))
    }

    /// Removes the single comment; its replies stay. Optionally bans the author
    /// in the same transaction.
    async fn reject(db: &Surreal<Any>, comment: &CommentRecord, ban_author: bool) -> Result<()> {
        let ban = if ban_author {
            "UPDATE $author SET status = 'banned';"
        } else {
            ""
        };
        let sql = format!(
            r#"
            BEGIN TRANSACTION;
            LET $removed = (DELETE $comment WHERE status IN $states RETURN BEFORE);
            IF $removed = [] {{
                THROW "comment is no longer awaiting review";
            }};
            {ban}
            COMMIT TRANSACTION;
            "#
        );

        db.query(sql)
            .bind(("comment", comment.id.clone()))
            .bind(("author", comment.author.clone()))
            .bind(("states", CommentStatus::AWAITING_REVIEW))
            .await?
            .check()?;

        if ban_author {
            tracing::info!(user_id = %record_key(&comment.author), "author banned by moderation");
        }
        Ok(())
    }
}
