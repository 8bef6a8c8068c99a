use std::collections::HashSet;

use chrono::Utc;
use surrealdb::{engine::any::Any, sql::Datetime, Surreal};

use crate::{
    helpers::{catalog_helpers::label_ranking, thing_helpers::record_key, user_helpers::get_user},
    models::{
        analytics::*,
        database_helpers::{CountResult, DailyPlays, HourCount, KeyCount, SumResult},
        target::{PlayScope, TargetKind},
    },
    services::play_history_service::PlayHistoryService,
    validators::required,
    Error, Result,
};

const FAVORITE_TABLES: &str = "user_likes_song, user_likes_album, user_likes_songlist";
const DEFAULT_TOP_LIMIT: usize = 10;
const TOP_USERS_LIMIT: usize = 10;

pub struct AnalyticsService;

impl AnalyticsService {
    /// Platform activity created in range. Defaults to the last 7 days.
    pub async fn dashboard(
        db: &Surreal<Any>,
        request: &DateRangeRequest,
    ) -> Result<DashboardSummary> {
        let range = Self::admin_range(request)?;

        let sql = format!(
            r#"
            SELECT count() AS total FROM user WHERE created_at >= $start AND created_at <= $end GROUP ALL;
            SELECT count() AS total FROM play_history WHERE played_at >= $start AND played_at <= $end GROUP ALL;
            SELECT count() AS total FROM comment WHERE created_at >= $start AND created_at <= $end GROUP ALL;
            SELECT count() AS total FROM {FAVORITE_TABLES} WHERE created_at >= $start AND created_at <= $end GROUP ALL;
            SELECT count() AS total FROM songlist WHERE created_at >= $start AND created_at <= $end GROUP ALL;
            "#
        );
        let mut response = db
            .query(sql)
            .bind(("start", Datetime::from(range.start)))
            .bind(("end", Datetime::from(range.end)))
            .await?;

        Ok(DashboardSummary {
            range,
            new_users: total(response.take(0)?),
            plays: total(response.take(1)?),
            comments: total(response.take(2)?),
            favorites: total(response.take(3)?),
            songlists: total(response.take(4)?),
        })
    }

    /// Most favorited entities of one kind across the platform.
    pub async fn top_favorites(
        db: &Surreal<Any>,
        request: &TopFavoritesRequest,
    ) -> Result<TopFavorites> {
        let kind = TargetKind::parse(&required(request.target_type.as_deref(), "target_type")?)?;
        let limit = request.limit.unwrap_or(DEFAULT_TOP_LIMIT).max(1);

        let sql = format!(
            "SELECT out, count() AS count FROM {} GROUP BY out",
            kind.favorite_table()
        );
        let mut response = db.query(sql).await?;
        let rows: Vec<KeyCount> = response.take(0)?;

        let ranked = rank_counts(
            rows.into_iter().map(|row| (record_key(&row.key), row.count)),
            limit,
        );
        let list = label_ranking(db, kind.table(), kind.label_field(), ranked).await?;

        Ok(TopFavorites {
            target_type: kind.as_ref().to_string(),
            list,
        })
    }

    /// Platform-wide behavior over a range. Defaults to the last 7 days.
    pub async fn behavior_stats(
        db: &Surreal<Any>,
        request: &DateRangeRequest,
    ) -> Result<BehaviorStats> {
        let range = Self::admin_range(request)?;

        let plays = Self::daily_series(db, "play_history", "played_at", range).await?;
        let comments = Self::daily_series(db, "comment", "created_at", range).await?;
        let favorites = Self::daily_series(db, FAVORITE_TABLES, "created_at", range).await?;
        let new_users = Self::daily_series(db, "user", "created_at", range).await?;

        let mut response = db
            .query(
                r#"
                SELECT user, count() AS count FROM play_history
                    WHERE played_at >= $start AND played_at <= $end GROUP BY user;
                SELECT author AS user, count() AS count FROM comment
                    WHERE created_at >= $start AND created_at <= $end GROUP BY user;
                "#,
            )
            .bind(("start", Datetime::from(range.start)))
            .bind(("end", Datetime::from(range.end)))
            .await?;
        let plays_by_user: Vec<KeyCount> = response.take(0)?;
        let comments_by_user: Vec<KeyCount> = response.take(1)?;

        let active_users = plays_by_user
            .iter()
            .chain(&comments_by_user)
            .map(|row| record_key(&row.key))
            .collect::<HashSet<_>>()
            .len() as u64;

        let summary = BehaviorSummary {
            new_users: series_total(&new_users),
            total_plays: series_total(&plays),
            total_comments: series_total(&comments),
            total_favorites: series_total(&favorites),
            active_users,
        };
        let top_users = TopUsers {
            by_plays: Self::rank_users(db, plays_by_user).await?,
            by_comments: Self::rank_users(db, comments_by_user).await?,
        };
        let trends = BehaviorTrends {
            interactions: merge_series(&comments, &favorites),
            plays,
            comments,
            new_users,
        };

        Ok(BehaviorStats {
            range,
            summary,
            trends,
            top_users,
        })
    }

    /// Behavioral profile of one user. Defaults to the last 30 days; social
    /// counts are lifetime totals.
    pub async fn user_profile(
        db: &Surreal<Any>,
        request: &UserStatsRequest,
    ) -> Result<UserBehaviorProfile> {
        let user_id = required(request.target_user_id.as_deref(), "target_user_id")?;
        let user = get_user(db, &user_id)
            .await?
            .ok_or_else(|| Error::UserNotFound { id: user_id.clone() })?;
        let range = DateRange::resolve(
            request.start_date.as_deref(),
            request.end_date.as_deref(),
            RangeSpan::Days(30),
            Utc::now(),
        )?;

        let sql = format!(
            r#"
            SELECT count() AS total FROM play_history
                WHERE user = $user AND played_at >= $start AND played_at <= $end GROUP ALL;
            SELECT math::sum(play_duration) AS total FROM play_history
                WHERE user = $user AND played_at >= $start AND played_at <= $end GROUP ALL;
            SELECT count() AS total FROM comment
                WHERE author = $user AND created_at >= $start AND created_at <= $end GROUP ALL;
            SELECT count() AS total FROM {FAVORITE_TABLES}
                WHERE `in` = $user AND created_at >= $start AND created_at <= $end GROUP ALL;
            SELECT count() AS total FROM songlist
                WHERE created_by = $user AND created_at >= $start AND created_at <= $end GROUP ALL;
            SELECT time::hour(played_at) AS hour, count() AS count FROM play_history
                WHERE user = $user AND played_at >= $start AND played_at <= $end GROUP BY hour;
            SELECT time::format(played_at, '%Y-%m-%d') AS date, count() AS plays,
                   math::sum(play_duration) AS seconds
                FROM play_history
                WHERE user = $user AND played_at >= $start AND played_at <= $end
                GROUP BY date ORDER BY date ASC;
            SELECT count() AS total FROM user_follows_user WHERE out = $user GROUP ALL;
            SELECT count() AS total FROM user_follows_user WHERE `in` = $user GROUP ALL;
            "#
        );
        let mut response = db
            .query(sql)
            .bind(("user", user.id.clone()))
            .bind(("start", Datetime::from(range.start)))
            .bind(("end", Datetime::from(range.end)))
            .await?;

        let plays = total(response.take(0)?);
        let seconds: Option<SumResult> = response.take(1)?;
        let comments = total(response.take(2)?);
        let favorites = total(response.take(3)?);
        let songlists = total(response.take(4)?);
        let hours: Vec<HourCount> = response.take(5)?;
        let days: Vec<DailyPlays> = response.take(6)?;
        let followers = total(response.take(7)?);
        let following = total(response.take(8)?);

        let key = record_key(&user.id);
        let artists =
            PlayHistoryService::scoped_counts(db, &key, Some(range), PlayScope::Singer).await?;
        let top_artist = label_ranking(
            db,
            PlayScope::Singer.table(),
            PlayScope::Singer.label_field(),
            rank_counts(artists, 1),
        )
        .await?
        .into_iter()
        .next();

        let hours: Vec<(u32, u64)> = hours.iter().map(|h| (h.hour, h.count)).collect();
        let daily = days
            .into_iter()
            .map(|day| DurationPoint {
                date: day.date,
                plays: day.plays,
                minutes: seconds_to_minutes(day.seconds),
            })
            .collect();

        Ok(UserBehaviorProfile {
            user_id: key,
            username: user.username,
            status: user.status.as_ref().to_string(),
            range,
            totals: ProfileTotals {
                plays,
                minutes: seconds_to_minutes(seconds.map(|s| s.total).unwrap_or(0)),
                comments,
                favorites,
                songlists,
            },
            top_artist,
            peak_hour: peak_hour(&hours),
            daily,
            social: SocialCounts {
                followers,
                following,
            },
        })
    }

    fn admin_range(request: &DateRangeRequest) -> Result<DateRange> {
        DateRange::resolve(
            request.start_date.as_deref(),
            request.end_date.as_deref(),
            RangeSpan::Days(7),
            Utc::now(),
        )
    }

    async fn daily_series(
        db: &Surreal<Any>,
        tables: &str,
        time_field: &str,
        range: DateRange,
    ) -> Result<Vec<TrendPoint>> {
        let sql = format!(
            "SELECT time::format({time_field}, $format) AS date, count() AS count FROM {tables} \
             WHERE {time_field} >= $start AND {time_field} <= $end \
             GROUP BY date ORDER BY date ASC"
        );
        let mut response = db
            .query(sql)
            .bind(("format", Granularity::Day.format()))
            .bind(("start", Datetime::from(range.start)))
            .bind(("end", Datetime::from(range.end)))
            .await?;
        let series: Vec<TrendPoint> = response.take(0)?;
        Ok(series)
    }

    async fn rank_users(db: &Surreal<Any>, rows: Vec<KeyCount>) -> Result<Vec<RankingEntry>> {
        let ranked = rank_counts(
            rows.into_iter().map(|row| (record_key(&row.key), row.count)),
            TOP_USERS_LIMIT,
        );
        label_ranking(db, "user", "username", ranked).await
    }
}

fn total(count: Option<CountResult>) -> u64 {
    count.map(|c| c.total).unwrap_or(0)
}

fn series_total(series: &[TrendPoint]) -> u64 {
    series.iter().map(|p| p.count).sum()
}
