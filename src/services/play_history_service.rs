use std::collections::HashMap;

use chrono::Utc;
use surrealdb::{
    engine::any::Any,
    sql::{Datetime, Duration as SqlDuration, Thing},
    Surreal,
};

use crate::{
    config::LedgerConfig,
    helpers::{
        catalog_helpers::{label_ranking, song_exists},
        thing_helpers::{create_song_thing, create_thing, create_user_thing, parse_id_part, record_key},
    },
    models::{
        analytics::{
            attribute_counts, rank_counts, seconds_to_minutes, DateRange, Granularity, RangeSpan,
            TrendPoint,
        },
        database_helpers::{CountResult, EdgeRow, KeyCount, SumResult},
        play_history::*,
        target::PlayScope,
    },
    validators::{play_gate::PlayGate, required},
    Error, Result,
};

const DEFAULT_HISTORY_LIMIT: usize = 50;
const MAX_HISTORY_LIMIT: usize = 500;
const DEFAULT_CHART_LIMIT: usize = 10;

pub struct PlayHistoryService;

impl PlayHistoryService {
    /// Records a play unless the same user played the same song within the
    /// dedup window. The decision and both writes run as one transaction,
    /// serialised per pair by the play gate.
    pub async fn record_play(
        db: &Surreal<Any>,
        gate: &PlayGate,
        config: &LedgerConfig,
        user_id: &str,
        request: &RecordPlayRequest,
    ) -> Result<PlayOutcome> {
        let song_id = required(request.song_id.as_deref(), "song_id")?;
        let duration = request.play_duration.unwrap_or(0);
        if duration < 0 {
            return Err(Error::invalid("play_duration must not be negative"));
        }
        if !song_exists(db, &song_id).await? {
            return Err(Error::SongNotFound { id: song_id });
        }

        let user_key = parse_id_part(user_id.trim());
        let song_key = parse_id_part(&song_id);
        let _guard = gate.acquire(user_key, song_key).await;

        let mut response = db
            .query(
                r#"
                BEGIN TRANSACTION;
                LET $last = (SELECT played_at FROM play_history
                    WHERE user = $user AND song = $song
                    ORDER BY played_at DESC LIMIT 1)[0].played_at;
                LET $accepted = ($last = NONE OR $last <= time::now() - $window);
                IF $accepted {
                    CREATE play_history SET
                        user = $user,
                        song = $song,
                        play_duration = $duration,
                        played_at = time::now();
                    UPDATE $song SET play_count += 1;
                };
                $accepted;
                COMMIT TRANSACTION;
                "#,
            )
            .bind(("user", create_user_thing(user_key)))
            .bind(("song", create_song_thing(song_key)))
            .bind(("window", SqlDuration::from_secs(config.play_dedup_window_secs)))
            .bind(("duration", duration))
            .await?
            .check()?;

        let accepted: Option<bool> = response.take(3)?;
        let outcome = if accepted.unwrap_or(false) {
            PlayOutcome::Recorded
        } else {
            PlayOutcome::Suppressed
        };

        tracing::debug!(user_id = %user_key, song_id = %song_key, outcome = ?outcome, "play event");
        Ok(outcome)
    }

    /// Stored counter for a song; album and singer totals sum their songs' counters.
    /// Unknown entities count as zero.
    pub async fn total_play_stats(
        db: &Surreal<Any>,
        query: &PlayStatsQuery,
    ) -> Result<TotalPlayStats> {
        let scope = PlayScope::parse(&required(query.target_type.as_deref(), "target_type")?)?;
        let target_id = required(query.target_id.as_deref(), "target_id")?;

        let projection = match scope {
            PlayScope::Song => "play_count",
            PlayScope::Album => "math::sum(->album_contains_song->song.play_count)",
            PlayScope::Singer => "math::sum(->singer_performs_song->song.play_count)",
        };
        let sql = format!("SELECT VALUE {projection} FROM $record");
        let mut response = db
            .query(sql)
            .bind(("record", create_thing(scope.table(), &target_id)))
            .await?;
        let total: Option<i64> = response.take(0)?;

        Ok(TotalPlayStats {
            target_type: scope.as_ref().to_string(),
            target_id,
            total_play_count: total.unwrap_or(0).max(0) as u64,
        })
    }

    pub async fn my_history(
        db: &Surreal<Any>,
        user_id: &str,
        request: &PlayHistoryRequest,
    ) -> Result<PlayHistoryList> {
        let range = DateRange::resolve(
            request.start_date.as_deref(),
            request.end_date.as_deref(),
            RangeSpan::All,
            Utc::now(),
        )?;
        let limit = request
            .limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        let song = request
            .song_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(create_song_thing);

        let song_filter = if song.is_some() { "AND song = $song" } else { "" };
        let sql = format!(
            "SELECT id, song, song.title AS song_title, play_duration, played_at \
             FROM play_history \
             WHERE user = $user AND played_at >= $start AND played_at <= $end {song_filter} \
             ORDER BY played_at DESC LIMIT {limit}"
        );
        let mut response = db
            .query(sql)
            .bind(("user", create_user_thing(user_id)))
            .bind(("start", Datetime::from(range.start)))
            .bind(("end", Datetime::from(range.end)))
            .bind(("song", song))
            .await?;
        let records: Vec<PlayHistoryRecord> = response.take(0)?;

        let history: Vec<PlayHistoryView> =
            records.into_iter().map(PlayHistoryView::from).collect();
        Ok(PlayHistoryList {
            count: history.len(),
            history,
        })
    }

    pub async fn play_report(
        db: &Surreal<Any>,
        user_id: &str,
        request: &PlayReportRequest,
    ) -> Result<PlayReport> {
        let time_range = request.time_range.as_deref().unwrap_or("week").trim();
        let now = Utc::now();
        let range = match time_range {
            "week" => DateRange::trailing(RangeSpan::Days(7), now),
            "month" => DateRange::trailing(RangeSpan::Days(30), now),
            "all" => DateRange::trailing(RangeSpan::All, now),
            "self-defined" => DateRange::resolve(
                request.start_date.as_deref(),
                request.end_date.as_deref(),
                RangeSpan::All,
                now,
            )?,
            other => return Err(Error::invalid(format!("invalid time_range: {other}"))),
        };

        let mut response = db
            .query(
                r#"
                SELECT count() AS total FROM play_history
                    WHERE user = $user AND played_at >= $start AND played_at <= $end GROUP ALL;
                SELECT math::sum(play_duration) AS total FROM play_history
                    WHERE user = $user AND played_at >= $start AND played_at <= $end GROUP ALL;
                "#,
            )
            .bind(("user", create_user_thing(user_id)))
            .bind(("start", Datetime::from(range.start)))
            .bind(("end", Datetime::from(range.end)))
            .await?;
        let plays: Option<CountResult> = response.take(0)?;
        let seconds: Option<SumResult> = response.take(1)?;

        let song_counts = Self::song_counts(db, user_id, Some(range)).await?;
        let top = rank_counts(song_counts, 1);
        let top_song = label_ranking(db, "song", "title", top).await?.into_iter().next();

        Ok(PlayReport {
            time_range: time_range.to_string(),
            report: PlayReportSummary {
                total_plays: plays.map(|p| p.total).unwrap_or(0),
                total_duration_minutes: seconds_to_minutes(seconds.map(|s| s.total).unwrap_or(0)),
                top_song,
            },
        })
    }

    pub async fn top_charts(
        db: &Surreal<Any>,
        user_id: &str,
        request: &TopChartsRequest,
    ) -> Result<TopCharts> {
        let scope = PlayScope::parse(request.chart_type.as_deref().unwrap_or("song"))?;
        let limit = request.limit.unwrap_or(DEFAULT_CHART_LIMIT).max(1);

        let ranked = rank_counts(Self::scoped_counts(db, user_id, None, scope).await?, limit);
        let list = label_ranking(db, scope.table(), scope.label_field(), ranked).await?;

        Ok(TopCharts {
            chart_type: scope.as_ref().to_string(),
            list,
        })
    }

    /// Plays per day over the last 14 days, or per month over the last 12 months.
    pub async fn activity_trend(
        db: &Surreal<Any>,
        user_id: &str,
        request: &ActivityTrendRequest,
    ) -> Result<ActivityTrend> {
        let granularity = Granularity::parse(request.period.as_deref().unwrap_or("day"))?;
        let range = DateRange::trailing(granularity.default_span(), Utc::now());

        let mut response = db
            .query(
                r#"
                SELECT time::format(played_at, $format) AS date, count() AS count
                FROM play_history
                WHERE user = $user AND played_at >= $start AND played_at <= $end
                GROUP BY date ORDER BY date ASC
                "#,
            )
            .bind(("format", granularity.format()))
            .bind(("user", create_user_thing(user_id)))
            .bind(("start", Datetime::from(range.start)))
            .bind(("end", Datetime::from(range.end)))
            .await?;
        let trend: Vec<TrendPoint> = response.take(0)?;

        Ok(ActivityTrend {
            period: match granularity {
                Granularity::Day => "day".to_string(),
                Granularity::Month => "month".to_string(),
            },
            trend,
        })
    }

    /// Personal play counts per song, optionally limited to a range.
    pub async fn song_counts(
        db: &Surreal<Any>,
        user_id: &str,
        range: Option<DateRange>,
    ) -> Result<Vec<(String, u64)>> {
        let range = range.unwrap_or_else(|| DateRange::trailing(RangeSpan::All, Utc::now()));
        let mut response = db
            .query(
                "SELECT song, count() AS count FROM play_history \
                 WHERE user = $user AND played_at >= $start AND played_at <= $end \
                 GROUP BY song",
            )
            .bind(("user", create_user_thing(user_id)))
            .bind(("start", Datetime::from(range.start)))
            .bind(("end", Datetime::from(range.end)))
            .await?;
        let rows: Vec<KeyCount> = response.take(0)?;

        Ok(rows
            .into_iter()
            .map(|row| (record_key(&row.key), row.count))
            .collect())
    }

    /// Personal play counts credited to songs, albums or singers.
    pub async fn scoped_counts(
        db: &Surreal<Any>,
        user_id: &str,
        range: Option<DateRange>,
        scope: PlayScope,
    ) -> Result<Vec<(String, u64)>> {
        let song_counts = Self::song_counts(db, user_id, range).await?;
        let edge_table = match scope {
            PlayScope::Song => return Ok(song_counts),
            PlayScope::Album => "album_contains_song",
            PlayScope::Singer => "singer_performs_song",
        };
        if song_counts.is_empty() {
            return Ok(Vec::new());
        }

        let songs: Vec<Thing> = song_counts
            .iter()
            .map(|(key, _)| create_song_thing(key))
            .collect();
        let sql = format!("SELECT `in` AS owner, out AS song FROM {edge_table} WHERE out IN $songs");
        let mut response = db.query(sql).bind(("songs", songs)).await?;
        let edges: Vec<EdgeRow> = response.take(0)?;

        let links: Vec<(String, String)> = edges
            .iter()
            .map(|edge| (record_key(&edge.owner), record_key(&edge.song)))
            .collect();
        let by_song: HashMap<String, u64> = song_counts.into_iter().collect();

        Ok(attribute_counts(&by_song, &links))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::test_support::*;
    use chrono::Duration;

    fn play(song: &str, duration: Option<i64>) -> RecordPlayRequest {
        RecordPlayRequest {
            song_id: Some(song.to_string()),
            play_duration: duration,
        }
    }

    async fn play_count(db: &Surreal<Any>, song: &str) -> u64 {
        let query = PlayStatsQuery {
            target_type: Some("song".into()),
            target_id: Some(song.into()),
        };
        PlayHistoryService::total_play_stats(db, &query)
            .await
            .unwrap()
            .total_play_count
    }

    async fn history_len(db: &Surreal<Any>, user: &str) -> usize {
        PlayHistoryService::my_history(db, user, &PlayHistoryRequest::default())
            .await
            .unwrap()
            .count
    }

    async fn seeded() -> Surreal<Any> {
        let db = test_db().await;
        seed_user(&db, "3", "dana").await;
        seed_song(&db, "10", "Intro").await;
        seed_song(&db, "11", "Outro").await;
        db
    }

    #[tokio::test]
    async fn test_repeat_within_window_is_suppressed() {
        let db = seeded().await;
        let gate = PlayGate::new(16);
        let config = test_ledger_config();

        let first = PlayHistoryService::record_play(&db, &gate, &config, "3", &play("10", Some(200)))
            .await
            .unwrap();
        let second = PlayHistoryService::record_play(&db, &gate, &config, "3", &play("10", Some(200)))
            .await
            .unwrap();

        assert_eq!(first, PlayOutcome::Recorded);
        assert_eq!(second, PlayOutcome::Suppressed);
        assert_eq!(play_count(&db, "10").await, 1);
        assert_eq!(history_len(&db, "3").await, 1);
    }

    #[tokio::test]
    async fn test_window_is_per_pair() {
        let db = seeded().await;
        seed_user(&db, "4", "eli").await;
        let gate = PlayGate::new(16);
        let config = test_ledger_config();

        for (user, song) in [("3", "10"), ("3", "11"), ("4", "10")] {
            let outcome = PlayHistoryService::record_play(&db, &gate, &config, user, &play(song, None))
                .await
                .unwrap();
            assert_eq!(outcome, PlayOutcome::Recorded);
        }
        assert_eq!(play_count(&db, "10").await, 2);
        assert_eq!(play_count(&db, "11").await, 1);
    }

    #[tokio::test]
    async fn test_play_outside_window_is_recorded() {
        let db = seeded().await;
        seed_play_at(&db, "3", "10", 100, Utc::now() - Duration::seconds(61)).await;

        let outcome = PlayHistoryService::record_play(
            &db,
            &PlayGate::new(16),
            &test_ledger_config(),
            "3",
            &play("10", None),
        )
        .await
        .unwrap();

        assert_eq!(outcome, PlayOutcome::Recorded);
        assert_eq!(history_len(&db, "3").await, 2);
        assert_eq!(play_count(&db, "10").await, 1, "seeded rows bypass the counter");
    }

    #[tokio::test]
    async fn test_only_most_recent_play_counts() {
        let db = seeded().await;
        seed_play_at(&db, "3", "10", 100, Utc::now() - Duration::minutes(30)).await;
        seed_play_at(&db, "3", "10", 100, Utc::now() - Duration::seconds(10)).await;

        let outcome = PlayHistoryService::record_play(
            &db,
            &PlayGate::new(16),
            &test_ledger_config(),
            "3",
            &play("10", None),
        )
        .await
        .unwrap();
        assert_eq!(outcome, PlayOutcome::Suppressed);
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_count_once() {
        let db = seeded().await;
        let gate = PlayGate::new(16);
        let config = test_ledger_config();
        let request = play("10", Some(30));

        let (a, b) = tokio::join!(
            PlayHistoryService::record_play(&db, &gate, &config, "3", &request),
            PlayHistoryService::record_play(&db, &gate, &config, "3", &request),
        );
        let mut outcomes = vec![a.unwrap(), b.unwrap()];
        outcomes.sort_by_key(|o| *o == PlayOutcome::Suppressed);

        assert_eq!(outcomes, vec![PlayOutcome::Recorded, PlayOutcome::Suppressed]);
        assert_eq!(play_count(&db, "10").await, 1);
        assert_eq!(history_len(&db, "3").await, 1);
    }

    #[tokio::test]
    async fn test_record_play_validation() {
        let db = seeded().await;
        let gate = PlayGate::new(16);
        let config = test_ledger_config();

        let missing = RecordPlayRequest {
            song_id: None,
            play_duration: None,
        };
        assert!(matches!(
            PlayHistoryService::record_play(&db, &gate, &config, "3", &missing).await,
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            PlayHistoryService::record_play(&db, &gate, &config, "3", &play("10", Some(-5))).await,
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            PlayHistoryService::record_play(&db, &gate, &config, "3", &play("404", None)).await,
            Err(Error::SongNotFound { .. })
        ));
        assert_eq!(history_len(&db, "3").await, 0);
    }

    #[tokio::test]
    async fn test_total_play_stats_by_scope() {
        let db = seeded().await;
        seed_song(&db, "12", "Bridge").await;
        seed_album(&db, "a1", "Debut", &["10", "11"]).await;
        seed_singer(&db, "s1", "Solo", &["10", "12"]).await;
        seed_singer(&db, "s2", "Duet", &["10"]).await;
        db.query("UPDATE song:⟨10⟩ SET play_count = 5; UPDATE song:⟨11⟩ SET play_count = 2; UPDATE song:⟨12⟩ SET play_count = 1;")
            .await
            .unwrap()
            .check()
            .unwrap();

        let stats = |kind: &str, id: &str| PlayStatsQuery {
            target_type: Some(kind.to_string()),
            target_id: Some(id.to_string()),
        };

        let song = PlayHistoryService::total_play_stats(&db, &stats("song", "10")).await.unwrap();
        assert_eq!(song.total_play_count, 5);
        let album = PlayHistoryService::total_play_stats(&db, &stats("album", "a1")).await.unwrap();
        assert_eq!(album.total_play_count, 7);
        let solo = PlayHistoryService::total_play_stats(&db, &stats("singer", "s1")).await.unwrap();
        assert_eq!(solo.total_play_count, 6);
        let duet = PlayHistoryService::total_play_stats(&db, &stats("singer", "s2")).await.unwrap();
        assert_eq!(duet.total_play_count, 5);

        let missing = PlayHistoryService::total_play_stats(&db, &stats("album", "none")).await.unwrap();
        assert_eq!(missing.total_play_count, 0);

        assert!(matches!(
            PlayHistoryService::total_play_stats(&db, &stats("songlist", "1")).await,
            Err(Error::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_history_filters() {
        let db = seeded().await;
        let now = Utc::now();
        seed_play_at(&db, "3", "10", 100, now - Duration::days(10)).await;
        seed_play_at(&db, "3", "11", 100, now - Duration::days(2)).await;
        seed_play_at(&db, "3", "10", 100, now - Duration::hours(1)).await;

        let all = PlayHistoryService::my_history(&db, "3", &PlayHistoryRequest::default())
            .await
            .unwrap();
        assert_eq!(all.count, 3);
        assert_eq!(all.history[0].song_id, "10");
        assert_eq!(all.history[0].song_title.as_deref(), Some("Intro"));
        assert!(all.history[0].played_at > all.history[1].played_at);

        let only_intro = PlayHistoryRequest {
            song_id: Some("10".into()),
            ..Default::default()
        };
        let filtered = PlayHistoryService::my_history(&db, "3", &only_intro).await.unwrap();
        assert_eq!(filtered.count, 2);

        let limited = PlayHistoryRequest {
            limit: Some(1),
            ..Default::default()
        };
        let limited = PlayHistoryService::my_history(&db, "3", &limited).await.unwrap();
        assert_eq!(limited.count, 1);

        let since = (now - Duration::days(5)).format("%Y-%m-%d").to_string();
        let recent = PlayHistoryRequest {
            start_date: Some(since),
            ..Default::default()
        };
        let recent = PlayHistoryService::my_history(&db, "3", &recent).await.unwrap();
        assert_eq!(recent.count, 2);
    }

    #[tokio::test]
    async fn test_play_report() {
        let db = seeded().await;
        let now = Utc::now();
        seed_play_at(&db, "3", "10", 120, now - Duration::days(1)).await;
        seed_play_at(&db, "3", "10", 100, now - Duration::days(2)).await;
        seed_play_at(&db, "3", "11", 80, now - Duration::days(3)).await;
        seed_play_at(&db, "3", "11", 600, now - Duration::days(20)).await;

        let week = PlayHistoryService::play_report(&db, "3", &PlayReportRequest::default())
            .await
            .unwrap();
        assert_eq!(week.time_range, "week");
        assert_eq!(week.report.total_plays, 3);
        assert_eq!(week.report.total_duration_minutes, 5.0);
        let top = week.report.top_song.unwrap();
        assert_eq!(top.id, "10");
        assert_eq!(top.name.as_deref(), Some("Intro"));
        assert_eq!(top.count, 2);

        let all = PlayReportRequest {
            time_range: Some("all".into()),
            ..Default::default()
        };
        let all = PlayHistoryService::play_report(&db, "3", &all).await.unwrap();
        assert_eq!(all.report.total_plays, 4);

        let bad = PlayReportRequest {
            time_range: Some("decade".into()),
            ..Default::default()
        };
        assert!(PlayHistoryService::play_report(&db, "3", &bad).await.is_err());
    }

    #[tokio::test]
    async fn test_play_report_for_quiet_user() {
        let db = seeded().await;
        let report = PlayHistoryService::play_report(&db, "3", &PlayReportRequest::default())
            .await
            .unwrap();
        assert_eq!(report.report.total_plays, 0);
        assert_eq!(report.report.total_duration_minutes, 0.0);
        assert!(report.report.top_song.is_none());
    }

    #[tokio::test]
    async fn test_top_charts_per_scope() {
        let db = seeded().await;
        seed_song(&db, "12", "Bridge").await;
        seed_album(&db, "a1", "Debut", &["10", "11"]).await;
        seed_album(&db, "a2", "Second", &["12"]).await;
        seed_singer(&db, "s1", "Solo", &["12"]).await;
        seed_singer(&db, "s2", "Duet", &["10", "12"]).await;
        let now = Utc::now();
        for (song, minutes) in [("10", 1), ("10", 2), ("11", 3), ("12", 4), ("12", 5), ("12", 6)] {
            seed_play_at(&db, "3", song, 60, now - Duration::minutes(minutes)).await;
        }

        let chart = |kind: &str| TopChartsRequest {
            chart_type: Some(kind.to_string()),
            limit: None,
        };

        let songs = PlayHistoryService::top_charts(&db, "3", &chart("song")).await.unwrap();
        let song_ids: Vec<&str> = songs.list.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(song_ids, vec!["12", "10", "11"]);

        let albums = PlayHistoryService::top_charts(&db, "3", &chart("album")).await.unwrap();
        assert_eq!(albums.list[0].id, "a1");
        assert_eq!(albums.list[0].count, 3);
        assert_eq!(albums.list[1].name.as_deref(), Some("Second"));

        let singers = PlayHistoryService::top_charts(&db, "3", &chart("singer")).await.unwrap();
        assert_eq!(singers.list[0].id, "s2");
        assert_eq!(singers.list[0].count, 5);
        assert_eq!(singers.list[1].id, "s1");

        assert!(PlayHistoryService::top_charts(&db, "3", &chart("genre")).await.is_err());
    }

    #[tokio::test]
    async fn test_activity_trend_buckets() {
        let db = seeded().await;
        let now = Utc::now();
        seed_play_at(&db, "3", "10", 60, now - Duration::minutes(1)).await;
        seed_play_at(&db, "3", "11", 60, now - Duration::minutes(2)).await;
        seed_play_at(&db, "3", "10", 60, now - Duration::days(3)).await;
        seed_play_at(&db, "3", "10", 60, now - Duration::days(40)).await;

        let daily = PlayHistoryService::activity_trend(&db, "3", &ActivityTrendRequest::default())
            .await
            .unwrap();
        assert_eq!(daily.period, "day");
        let total: u64 = daily.trend.iter().map(|p| p.count).sum();
        assert_eq!(total, 3);
        assert!(daily.trend.windows(2).all(|w| w[0].date < w[1].date));
        let newest = (now - Duration::minutes(1)).format("%Y-%m-%d").to_string();
        assert_eq!(daily.trend.last().unwrap().date, newest);

        let monthly = ActivityTrendRequest {
            period: Some("month".into()),
        };
        let monthly = PlayHistoryService::activity_trend(&db, "3", &monthly).await.unwrap();
        let total: u64 = monthly.trend.iter().map(|p| p.count).sum();
        assert_eq!(total, 4);

        let bad = ActivityTrendRequest {
            period: Some("year".into()),
        };
        assert!(PlayHistoryService::activity_trend(&db, "3", &bad).await.is_err());
    }
}
