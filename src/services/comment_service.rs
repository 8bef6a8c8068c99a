use std::collections::{HashMap, HashSet};

use surrealdb::{engine::any::Any, sql::Thing, Surreal};

use crate::{
    config::LedgerConfig,
    helpers::{
        catalog_helpers::{ensure_target_exists, songlist_owner},
        thing_helpers::{create_comment_thing, create_user_thing, parse_id_part, record_key},
        user_helpers::get_user,
    },
    models::{
        audit_log::{AuditEntry, AuditResult},
        comment::*,
        database_helpers::{CountResult, CreatedRecord},
        target::{Target, TargetKind},
    },
    services::audit_service::AuditService,
    validators::{comment_validator::CommentValidator, required},
    Error, Result,
};

/// Columns every comment read returns, with the author's name resolved.
const COMMENT_FIELDS: &str = "id, author, author.username AS author_name, target_type, target, \
                              content, parent, status, like_count, created_at";

pub struct CommentService;

impl CommentService {
    pub async fn publish(
        db: &Surreal<Any>,
        config: &LedgerConfig,
        author_id: &str,
        request: &PublishCommentRequest,
    ) -> Result<String> {
        let target =
            Target::from_request(request.target_type.as_deref(), request.target_id.as_deref())?;
        let content =
            CommentValidator::validate_content(request.content.as_deref(), config.comment_max_length)?;

        let author = get_user(db, author_id).await?.ok_or_else(|| Error::UserNotFound {
            id: author_id.to_string(),
        })?;
        if author.is_banned() {
            return Err(Error::UserBanned {
                user_id: record_key(&author.id),
            });
        }

        ensure_target_exists(db, &target).await?;

        let parent = match request.parent_id.as_deref().map(str::trim) {
            Some(parent_id) if !parent_id.is_empty() => {
                let parent = create_comment_thing(parent_id);
                if !Self::exists_on_target(db, &parent, &target).await? {
                    return Err(Error::ParentCommentNotFound {
                        id: parent_id.to_string(),
                    });
                }
                Some(parent)
            }
            _ => None,
        };

        // The parent check is repeated inside the write so a reply can never
        // land under a comment deleted in the meantime.
        let written = db
            .query(
                r#"
                BEGIN TRANSACTION;
                IF $parent_comment != NONE {
                    IF (SELECT VALUE id FROM $parent_comment WHERE target = $target) = [] {
                        THROW "parent comment no longer exists";
                    };
                };
                CREATE comment SET
                    author = $author,
                    target_type = $kind,
                    target = $target,
                    content = $content,
                    parent = $parent_comment,
                    status = 'normal',
                    like_count = 0,
                    created_at = time::now()
                RETURN id;
                COMMIT TRANSACTION;
                "#,
            )
            .bind(("parent_comment", parent.clone()))
            .bind(("target", target.thing()))
            .bind(("author", author.id.clone()))
            .bind(("kind", target.kind))
            .bind(("content", content))
            .await
            .and_then(|response| response.check());

        let mut response = match written {
            Ok(response) => response,
            Err(err) => {
                let err = Self::publish_failure(db, err, parent.as_ref(), &target).await;
                if !matches!(err, Error::ParentCommentNotFound { .. }) {
                    AuditService::record(
                        db,
                        AuditEntry::new("publish comment", AuditResult::Fail)
                            .on(target.kind.table(), &target.id),
                    )
                    .await;
                }
                return Err(err);
            }
        };

        let created: Option<CreatedRecord> = response.take(1)?;
        let comment_id = created
            .map(|c| record_key(&c.id))
            .ok_or_else(|| Error::DbError("comment creation returned nothing".to_string()))?;

        tracing::info!(comment_id = %comment_id, user_id = %author_id, "comment published");
        AuditService::record(
            db,
            AuditEntry::new("publish comment", AuditResult::Success).on("comment", &comment_id),
        )
        .await;

        Ok(comment_id)
    }

    /// Removes the comment and every reply below it. Returns the number removed.
    pub async fn delete(db: &Surreal<Any>, requester_id: &str, comment_id: &str) -> Result<usize> {
        let comment = Self::get_record(db, comment_id)
            .await?
            .ok_or_else(|| Error::CommentNotFound {
                id: comment_id.to_string(),
            })?;

        let requester = parse_id_part(requester_id.trim());
        let is_author = record_key(&comment.author) == requester;
        let is_target_owner = comment.target_type == TargetKind::Songlist
            && songlist_owner(db, &record_key(&comment.target)).await?.as_deref()
                == Some(requester);

        if !is_author && !is_target_owner {
            return Err(Error::PermissionDenied {
                reason: "only the author or the songlist owner can delete this comment"
                    .to_string(),
            });
        }

        let mut response = db
            .query("SELECT id, parent FROM comment WHERE target = $target")
            .bind(("target", comment.target.clone()))
            .await?;
        let edges: Vec<CommentEdge> = response.take(0)?;
        let subtree = collect_subtree(&comment.id, &edges);
        let removed = subtree.len();

        let outcome = db
            .query(
                r#"
                BEGIN TRANSACTION;
                DELETE comment WHERE id IN $ids;
                DELETE comment WHERE parent IN $ids;
                COMMIT TRANSACTION;
                "#,
            )
            .bind(("ids", subtree))
            .await
            .and_then(|response| response.check());

        let key = record_key(&comment.id);
        let result = match outcome {
            Ok(_) => AuditResult::Success,
            Err(_) => AuditResult::Fail,
        };
        AuditService::record(
            db,
            AuditEntry::new(format!("delete comment with {} replies", removed - 1), result)
                .on("comment", &key),
        )
        .await;

        outcome?;
        tracing::info!(comment_id = %key, user_id = %requester, removed, "comment subtree deleted");
        Ok(removed)
    }

    pub async fn like(db: &Surreal<Any>, comment_id: &str) -> Result<()> {
        Self::apply_update(db, comment_id, CommentUpdate::IncrementLikes).await
    }

    /// Flags the comment for review whatever its current state.
    pub async fn report(db: &Surreal<Any>, comment_id: &str) -> Result<()> {
        let comment = Self::get_record(db, comment_id)
            .await?
            .ok_or_else(|| Error::CommentNotFound {
                id: comment_id.to_string(),
            })?;

        let status = match comment.status.apply(ModerationEvent::Report)? {
            ModerationOutcome::Status(status) => status,
            ModerationOutcome::Removed => {
                return Err(Error::invalid("a report cannot remove a comment"));
            }
        };

        let outcome = Self::apply_update(db, comment_id, CommentUpdate::SetStatus(status)).await;

        // Deleted between the read and the write: nothing was flagged.
        if !matches!(outcome, Err(Error::CommentNotFound { .. })) {
            let result = match &outcome {
                Ok(_) => AuditResult::Success,
                Err(_) => AuditResult::Fail,
            };
            AuditService::record(
                db,
                AuditEntry::new("report comment", result).on("comment", record_key(&comment.id)),
            )
            .await;
        }

        outcome
    }

    pub async fn apply_action(db: &Surreal<Any>, request: &CommentActionRequest) -> Result<()> {
        let comment_id = required(request.comment_id.as_deref(), "comment_id")?;
        let action = required(request.action.as_deref(), "action")?;

        match CommentAction::parse(&action)? {
            CommentAction::Like => Self::like(db, &comment_id).await,
            CommentAction::Report => Self::report(db, &comment_id).await,
        }
    }

    pub async fn list_by_target(db: &Surreal<Any>, query: &TargetQuery) -> Result<CommentList> {
        let target =
            Target::from_request(query.target_type.as_deref(), query.target_id.as_deref())?;
        let sort = CommentSort::parse(query.sort_by.as_deref());

        let sql = format!(
            "SELECT {COMMENT_FIELDS} FROM comment \
             WHERE target = $target AND parent = NONE AND status = 'normal' \
             ORDER BY {}",
            sort.order_clause()
        );
        let mut response = db.query(sql).bind(("target", target.thing())).await?;
        let records: Vec<CommentRecord> = response.take(0)?;

        let comments: Vec<CommentView> = records.into_iter().map(CommentView::from).collect();
        Ok(CommentList {
            count: comments.len(),
            comments,
        })
    }

    /// The comment itself, whatever its status, with its visible direct replies.
    pub async fn detail(db: &Surreal<Any>, comment_id: &str) -> Result<CommentDetail> {
        let comment = Self::get_record(db, comment_id)
            .await?
            .ok_or_else(|| Error::CommentNotFound {
                id: comment_id.to_string(),
            })?;

        let sql = format!(
            "SELECT {COMMENT_FIELDS} FROM comment \
             WHERE parent = $comment AND status = 'normal' \
             ORDER BY created_at ASC"
        );
        let mut response = db.query(sql).bind(("comment", comment.id.clone())).await?;
        let replies: Vec<CommentRecord> = response.take(0)?;

        Ok(CommentDetail {
            comment: comment.into(),
            replies: replies.into_iter().map(CommentView::from).collect(),
        })
    }

    pub async fn list_mine(db: &Surreal<Any>, user_id: &str, grouped: bool) -> Result<MyComments> {
        let sql = format!(
            "SELECT {COMMENT_FIELDS} FROM comment WHERE author = $author ORDER BY created_at DESC"
        );
        let mut response = db
            .query(sql)
            .bind(("author", create_user_thing(user_id)))
            .await?;
        let records: Vec<CommentRecord> = response.take(0)?;
        let comments: Vec<CommentView> = records.into_iter().map(CommentView::from).collect();

        Ok(if grouped {
            MyComments::grouped(comments)
        } else {
            MyComments::Flat {
                my_comments: comments,
            }
        })
    }

    /// Visible comment count and the most liked comment; equal likes go to the lowest id.
    pub async fn stats(db: &Surreal<Any>, query: &TargetQuery) -> Result<CommentStats> {
        let target =
            Target::from_request(query.target_type.as_deref(), query.target_id.as_deref())?;

        let sql = format!(
            r#"
            SELECT count() AS total FROM comment
                WHERE target = $target AND status = 'normal' GROUP ALL;
            SELECT {COMMENT_FIELDS} FROM comment
                WHERE target = $target AND status = 'normal'
                ORDER BY like_count DESC, id ASC LIMIT 1;
            "#
        );
        let mut response = db.query(sql).bind(("target", target.thing())).await?;
        let total: Option<CountResult> = response.take(0)?;
        let hottest: Option<CommentRecord> = response.take(1)?;

        Ok(CommentStats {
            target_type: target.kind,
            target_id: target.id,
            total_count: total.map(|t| t.total).unwrap_or(0),
            hottest_comment: hottest.map(CommentView::from),
        })
    }

    pub async fn get_record(db: &Surreal<Any>, comment_id: &str) -> Result<Option<CommentRecord>> {
        let sql = format!("SELECT {COMMENT_FIELDS} FROM $comment");
        let mut response = db
            .query(sql)
            .bind(("comment", create_comment_thing(comment_id)))
            .await?;
        let record: Option<CommentRecord> = response.take(0)?;
        Ok(record)
    }

    /// Maps a failed publish write. A parent removed after the pre-check
    /// aborts the transaction and is reported as missing, not as a store failure.
    async fn publish_failure(
        db: &Surreal<Any>,
        err: surrealdb::Error,
        parent: Option<&Thing>,
        target: &Target,
    ) -> Error {
        if let Some(parent) = parent {
            match Self::exists_on_target(db, parent, target).await {
                Ok(false) => {
                    return Error::ParentCommentNotFound {
                        id: record_key(parent),
                    }
                }
                Ok(true) => {}
                Err(lookup) => {
                    tracing::warn!(error = %lookup, "parent lookup after failed publish");
                }
            }
        }
        err.into()
    }

    async fn exists_on_target(db: &Surreal<Any>, comment: &Thing, target: &Target) -> Result<bool> {
        let mut response = db
            .query("SELECT VALUE id FROM $comment WHERE target = $target")
            .bind(("comment", comment.clone()))
            .bind(("target", target.thing()))
            .await?;
        let found: Option<Thing> = response.take(0)?;
        Ok(found.is_some())
    }

    /// Atomic in-place update. UPDATE never creates, so an empty result means absent.
    async fn apply_update(db: &Surreal<Any>, comment_id: &str, update: CommentUpdate) -> Result<()> {
        let sql = format!("UPDATE $comment SET {} RETURN id", update.set_clause());
        let mut response = db
            .query(sql)
            .bind(("comment", create_comment_thing(comment_id)))
            .await?;
        let updated: Option<CreatedRecord> = response.take(0)?;

        match updated {
            Some(_) => Ok(()),
            None => Err(Error::CommentNotFound {
                id: comment_id.to_string(),
            }),
        }
    }
}

/// Every comment reachable from `root` through parent links, root first.
/// Uses an explicit stack and a visited set, so a corrupted cyclic chain ends.
pub fn collect_subtree(root: &Thing, edges: &[CommentEdge]) -> Vec<Thing> {
    let mut children: HashMap<&Thing, Vec<&Thing>> = HashMap::new();
    for edge in edges {
        if let Some(parent) = &edge.parent {
            children.entry(parent).or_default().push(&edge.id);
        }
    }

    let mut visited: HashSet<&Thing> = HashSet::new();
    let mut subtree = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if !visited.insert(node) {
            tracing::warn!(comment_id = %node, "reply chain loops back on itself");
            continue;
        }
        subtree.push(node.clone());
        if let Some(replies) = children.get(node) {
            stack.extend(replies.iter().copied());
        }
    }

    subtree
}
