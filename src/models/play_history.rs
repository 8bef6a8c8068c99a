use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::{Datetime, Thing};

use crate::{helpers::thing_helpers::record_key, models::analytics::RankingEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayOutcome {
    Recorded,
    Suppressed,
}

impl PlayOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            PlayOutcome::Recorded => "play recorded",
            PlayOutcome::Suppressed => "repeat play within the dedup window, not recorded",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecordPlayResponse {
    pub message: String,
    pub outcome: PlayOutcome,
}

impl From<PlayOutcome> for RecordPlayResponse {
    fn from(outcome: PlayOutcome) -> Self {
        Self {
            message: outcome.message().to_string(),
            outcome,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordPlayRequest {
    pub song_id: Option<String>,
    pub play_duration: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PlayStatsQuery {
    pub target_type: Option<String>,
    pub target_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TotalPlayStats {
    pub target_type: String,
    pub target_id: String,
    pub total_play_count: u64,
}

/// A history row joined with the song title.
#[derive(Debug, Deserialize)]
pub struct PlayHistoryRecord {
    pub id: Thing,
    pub song: Thing,
    #[serde(default)]
    pub song_title: Option<String>,
    #[serde(default)]
    pub play_duration: i64,
    pub played_at: Datetime,
}

#[derive(Debug, Serialize)]
pub struct PlayHistoryView {
    pub play_id: String,
    pub song_id: String,
    pub song_title: Option<String>,
    pub play_duration: i64,
    pub played_at: DateTime<Utc>,
}

impl From<PlayHistoryRecord> for PlayHistoryView {
    fn from(record: PlayHistoryRecord) -> Self {
        Self {
            play_id: record_key(&record.id),
            song_id: record_key(&record.song),
            song_title: record.song_title,
            play_duration: record.play_duration,
            played_at: record.played_at.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayHistoryRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub song_id: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PlayHistoryList {
    pub history: Vec<PlayHistoryView>,
    pub count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayReportRequest {
    pub time_range: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlayReportSummary {
    pub total_plays: u64,
    pub total_duration_minutes: f64,
    pub top_song: Option<RankingEntry>,
}

#[derive(Debug, Serialize)]
pub struct PlayReport {
    pub time_range: String,
    pub report: PlayReportSummary,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopChartsRequest {
    #[serde(rename = "type")]
    pub chart_type: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TopCharts {
    pub chart_type: String,
    pub list: Vec<RankingEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityTrendRequest {
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActivityTrend {
    pub period: String,
    pub trend: Vec<crate::models::analytics::TrendPoint>,
}
