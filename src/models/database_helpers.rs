use serde::Deserialize;
use surrealdb::sql::Thing;

#[derive(Debug, Deserialize)]
pub struct CountResult {
    pub total: u64,
}

/// `RETURN id` row of a CREATE or UPDATE.
#[derive(Debug, Deserialize)]
pub struct CreatedRecord {
    pub id: Thing,
}

#[derive(Debug, Deserialize)]
pub struct SumResult {
    #[serde(default)]
    pub total: i64,
}

/// `GROUP BY song` or `GROUP BY user` row with its row count.
#[derive(Debug, Deserialize)]
pub struct KeyCount {
    #[serde(alias = "song", alias = "user", alias = "out")]
    pub key: Thing,
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct HourCount {
    pub hour: u32,
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct NamedRecord {
    pub id: Thing,
    #[serde(default)]
    pub name: Option<String>,
}

/// `in -> out` edge, e.g. album to song.
#[derive(Debug, Deserialize)]
pub struct EdgeRow {
    pub owner: Thing,
    pub song: Thing,
}

/// One day of a user's plays with the summed `play_duration` in seconds.
#[derive(Debug, Deserialize)]
pub struct DailyPlays {
    pub date: String,
    pub plays: u64,
    #[serde(default)]
    pub seconds: i64,
}
