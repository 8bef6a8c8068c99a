//! Shared fixtures for tests: an in-memory store with the schema applied and
//! seeders for the collaborator tables the ledger reads.

use chrono::{DateTime, Utc};
use surrealdb::{
    engine::any::{connect, Any},
    sql::Datetime,
    Surreal,
};

use crate::{
    auth::token_service::{AuthConfig, TokenService},
    config::LedgerConfig,
    db::apply_schema,
    helpers::thing_helpers::{create_comment_thing, create_thing, create_user_thing},
    models::{comment::CommentStatus, target::TargetKind},
    validators::play_gate::PlayGate,
    AppState,
};

pub const ADMIN_ID: &str = "1";

pub async fn test_db() -> Surreal<Any> {
    let db = connect("mem://").await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    apply_schema(&db).await.unwrap();
    db
}

pub fn test_ledger_config() -> LedgerConfig {
    LedgerConfig {
        admin_user_id: ADMIN_ID.to_string(),
        play_dedup_window_secs: 60,
        comment_max_length: 300,
        play_gate_capacity: 1_000,
    }
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig::new("test-secret".into(), "http://localhost".into(), 5)
}

pub async fn test_state() -> AppState {
    let ledger_config = test_ledger_config();
    AppState {
        db: test_db().await,
        auth_config: test_auth_config(),
        play_gate: PlayGate::new(ledger_config.play_gate_capacity),
        ledger_config,
    }
}

pub fn bearer(user_id: &str) -> String {
    let token = TokenService::create_token(user_id.to_string(), &test_auth_config()).unwrap();
    format!("Bearer {token}")
}

/// Makes every later audit append fail: `action` is written as a string.
pub async fn break_audit_ledger(db: &Surreal<Any>) {
    db.query("DEFINE FIELD action ON system_log TYPE int")
        .await
        .unwrap()
        .check()
        .unwrap();
}

fn at(time: DateTime<Utc>) -> Datetime {
    Datetime::from(time)
}

pub async fn seed_user(db: &Surreal<Any>, id: &str, username: &str) {
    seed_user_at(db, id, username, Utc::now()).await;
}

pub async fn seed_user_at(db: &Surreal<Any>, id: &str, username: &str, created: DateTime<Utc>) {
    db.query("CREATE $user SET username = $username, status = 'normal', created_at = $at")
        .bind(("user", create_user_thing(id)))
        .bind(("username", username.to_string()))
        .bind(("at", at(created)))
        .await
        .unwrap()
        .check()
        .unwrap();
}

pub async fn seed_song(db: &Surreal<Any>, id: &str, title: &str) {
    db.query("CREATE $song SET title = $title, duration = 180")
        .bind(("song", create_thing("song", id)))
        .bind(("title", title.to_string()))
        .await
        .unwrap()
        .check()
        .unwrap();
}

pub async fn seed_album(db: &Surreal<Any>, id: &str, title: &str, songs: &[&str]) {
    db.query("CREATE $album SET title = $title")
        .bind(("album", create_thing("album", id)))
        .bind(("title", title.to_string()))
        .await
        .unwrap()
        .check()
        .unwrap();
    for song in songs {
        db.query("RELATE $album->album_contains_song->$song")
            .bind(("album", create_thing("album", id)))
            .bind(("song", create_thing("song", song)))
            .await
            .unwrap()
            .check()
            .unwrap();
    }
}

pub async fn seed_singer(db: &Surreal<Any>, id: &str, name: &str, songs: &[&str]) {
    db.query("CREATE $singer SET name = $name")
        .bind(("singer", create_thing("singer", id)))
        .bind(("name", name.to_string()))
        .await
        .unwrap()
        .check()
        .unwrap();
    for song in songs {
        db.query("RELATE $singer->singer_performs_song->$song")
            .bind(("singer", create_thing("singer", id)))
            .bind(("song", create_thing("song", song)))
            .await
            .unwrap()
            .check()
            .unwrap();
    }
}

pub async fn seed_songlist(db: &Surreal<Any>, id: &str, owner: &str) {
    seed_songlist_at(db, id, owner, Utc::now()).await;
}

pub async fn seed_songlist_at(db: &Surreal<Any>, id: &str, owner: &str, created: DateTime<Utc>) {
    db.query("CREATE $songlist SET title = $title, created_by = $owner, created_at = $at")
        .bind(("songlist", create_thing("songlist", id)))
        .bind(("title", format!("list {id}")))
        .bind(("owner", create_user_thing(owner)))
        .bind(("at", at(created)))
        .await
        .unwrap()
        .check()
        .unwrap();
}

pub async fn seed_favorite(
    db: &Surreal<Any>,
    user: &str,
    kind: TargetKind,
    target: &str,
    created: DateTime<Utc>,
) {
    let sql = format!(
        "RELATE $user->{}->$target SET created_at = $at",
        kind.favorite_table()
    );
    db.query(sql)
        .bind(("user", create_user_thing(user)))
        .bind(("target", create_thing(kind.table(), target)))
        .bind(("at", at(created)))
        .await
        .unwrap()
        .check()
        .unwrap();
}

pub async fn seed_follow(db: &Surreal<Any>, follower: &str, followed: &str) {
    db.query("RELATE $follower->user_follows_user->$followed SET created_at = time::now()")
        .bind(("follower", create_user_thing(follower)))
        .bind(("followed", create_user_thing(followed)))
        .await
        .unwrap()
        .check()
        .unwrap();
}

/// Writes a play row directly, bypassing the dedup gate.
pub async fn seed_play_at(
    db: &Surreal<Any>,
    user: &str,
    song: &str,
    duration: i64,
    played: DateTime<Utc>,
) {
    db.query(
        "CREATE play_history SET user = $user, song = $song, play_duration = $duration, played_at = $at",
    )
    .bind(("user", create_user_thing(user)))
    .bind(("song", create_thing("song", song)))
    .bind(("duration", duration))
    .bind(("at", at(played)))
    .await
    .unwrap()
    .check()
    .unwrap();
}

/// Writes a comment row with explicit state, for fixtures the public API cannot build.
pub struct CommentSeed<'a> {
    pub id: &'a str,
    pub author: &'a str,
    pub target: (TargetKind, &'a str),
    pub parent: Option<&'a str>,
    pub status: CommentStatus,
    pub like_count: u64,
    pub created: DateTime<Utc>,
}

impl<'a> CommentSeed<'a> {
    pub fn new(id: &'a str, author: &'a str, target: (TargetKind, &'a str)) -> Self {
        Self {
            id,
            author,
            target,
            parent: None,
            status: CommentStatus::Normal,
            like_count: 0,
            created: Utc::now(),
        }
    }

    pub async fn insert(self, db: &Surreal<Any>) {
        let (kind, target_id) = self.target;
        db.query(
            r#"CREATE $comment SET
                author = $author,
                target_type = $kind,
                target = $target,
                content = $content,
                parent = $parent_comment,
                status = $status,
                like_count = $likes,
                created_at = $at"#,
        )
        .bind(("comment", create_comment_thing(self.id)))
        .bind(("author", create_user_thing(self.author)))
        .bind(("kind", kind))
        .bind(("target", create_thing(kind.table(), target_id)))
        .bind(("content", format!("comment {}", self.id)))
        .bind(("parent_comment", self.parent.map(create_comment_thing)))
        .bind(("status", self.status))
        .bind(("likes", self.like_count))
        .bind(("at", at(self.created)))
        .await
        .unwrap()
        .check()
        .unwrap();
    }
}
