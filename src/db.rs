use std::env;

use surrealdb::{
    engine::any::{self, Any},
    opt::auth::Root,
    Surreal,
};

use crate::Result;

/// Indexes and defaults the ledger relies on. Every statement is idempotent.
const SCHEMA: &str = r#"
    DEFINE TABLE IF NOT EXISTS comment SCHEMALESS;
    DEFINE FIELD IF NOT EXISTS status ON comment TYPE string DEFAULT 'normal';
    DEFINE FIELD IF NOT EXISTS like_count ON comment TYPE int DEFAULT 0;
    DEFINE INDEX IF NOT EXISTS comment_target ON comment FIELDS target;
    DEFINE INDEX IF NOT EXISTS comment_parent ON comment FIELDS parent;
    DEFINE INDEX IF NOT EXISTS comment_author ON comment FIELDS author;

    DEFINE TABLE IF NOT EXISTS play_history SCHEMALESS;
    DEFINE INDEX IF NOT EXISTS play_history_pair ON play_history FIELDS user, song, played_at;
    DEFINE INDEX IF NOT EXISTS play_history_time ON play_history FIELDS played_at;

    DEFINE TABLE IF NOT EXISTS system_log SCHEMALESS;
    DEFINE INDEX IF NOT EXISTS system_log_time ON system_log FIELDS action_time;

    DEFINE FIELD IF NOT EXISTS play_count ON song TYPE int DEFAULT 0;
    DEFINE FIELD IF NOT EXISTS status ON user TYPE string DEFAULT 'normal';
"#;

pub struct DbConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<(String, String)>,
}

impl DbConfig {
    /// Root credentials are optional so embedded engines can run without them.
    pub fn from_env() -> Result<Self> {
        let credentials = match (env::var("DB_USER"), env::var("DB_PASSWORD")) {
            (Ok(user), Ok(password)) => Some((user, password)),
            _ => None,
        };

        Ok(Self {
            url: env::var("DB_URL")?,
            namespace: env::var("DB_NS")?,
            database: env::var("DB_NAME")?,
            credentials,
        })
    }
}

pub async fn init_database(config: &DbConfig) -> Result<Surreal<Any>> {
    tracing::info!("Connecting to database at: {}", config.url);

    let db = any::connect(&config.url).await?;
    if let Some((username, password)) = &config.credentials {
        db.signin(Root { username, password }).await?;
    }
    db.use_ns(&config.namespace).use_db(&config.database).await?;

    apply_schema(&db).await?;
    tracing::info!("Database ready");

    Ok(db)
}

pub async fn apply_schema(db: &Surreal<Any>) -> Result<()> {
    db.query(SCHEMA).await?.check()?;
    Ok(())
}
