use std::collections::HashMap;

use surrealdb::{engine::any::Any, sql::Thing, Surreal};

use crate::{
    helpers::thing_helpers::{create_songlist_thing, create_thing, record_key},
    models::{
        analytics::RankingEntry,
        database_helpers::NamedRecord,
        target::{Target, TargetKind},
    },
    Error, Result,
};

/// Read-only lookups against the catalog collaborator's tables.
pub async fn record_exists(db: &Surreal<Any>, record: Thing) -> Result<bool> {
    let mut response = db
        .query("SELECT VALUE id FROM $record")
        .bind(("record", record))
        .await?;
    let found: Option<Thing> = response.take(0)?;
    Ok(found.is_some())
}

pub async fn song_exists(db: &Surreal<Any>, song_id: &str) -> Result<bool> {
    record_exists(db, create_thing("song", song_id)).await
}

/// Fails with the kind-specific not-found error when the target is absent.
pub async fn ensure_target_exists(db: &Surreal<Any>, target: &Target) -> Result<()> {
    if record_exists(db, target.thing()).await? {
        return Ok(());
    }

    let id = target.id.clone();
    Err(match target.kind {
        TargetKind::Song => Error::SongNotFound { id },
        TargetKind::Album => Error::AlbumNotFound { id },
        TargetKind::Songlist => Error::SonglistNotFound { id },
    })
}

/// Owner key of a songlist, `None` when the songlist does not exist.
pub async fn songlist_owner(db: &Surreal<Any>, songlist_id: &str) -> Result<Option<String>> {
    let mut response = db
        .query("SELECT VALUE created_by FROM $songlist")
        .bind(("songlist", create_songlist_thing(songlist_id)))
        .await?;
    let owner: Option<Thing> = response.take(0)?;
    Ok(owner.as_ref().map(record_key))
}

/// Display labels (`title` or `name`) of records of one table, keyed by record key.
pub async fn record_labels(
    db: &Surreal<Any>,
    table: &str,
    label_field: &str,
    keys: &[String],
) -> Result<HashMap<String, String>> {
    if keys.is_empty() {
        return Ok(HashMap::new());
    }

    let things: Vec<Thing> = keys.iter().map(|key| create_thing(table, key)).collect();
    let sql = format!("SELECT id, {label_field} AS name FROM $records");
    let mut response = db.query(sql).bind(("records", things)).await?;
    let rows: Vec<NamedRecord> = response.take(0)?;

    Ok(rows
        .into_iter()
        .filter_map(|row| row.name.map(|name| (record_key(&row.id), name)))
        .collect())
}

/// Attaches labels to an already ranked `(key, count)` list.
pub async fn label_ranking(
    db: &Surreal<Any>,
    table: &str,
    label_field: &str,
    ranked: Vec<(String, u64)>,
) -> Result<Vec<RankingEntry>> {
    let keys: Vec<String> = ranked.iter().map(|(key, _)| key.clone()).collect();
    let mut labels = record_labels(db, table, label_field, &keys).await?;

    Ok(ranked
        .into_iter()
        .map(|(id, count)| RankingEntry {
            name: labels.remove(&id),
            id,
            count,
        })
        .collect())
}
