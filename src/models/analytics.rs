use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default length of a range when the caller leaves `start_date` out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpan {
    Days(i64),
    Months(u32),
    /// Everything since the epoch.
    All,
}

impl RangeSpan {
    pub fn before(&self, end: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            RangeSpan::Days(days) => end - Duration::days(*days),
            RangeSpan::Months(months) => end
                .checked_sub_months(Months::new(*months))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            RangeSpan::All => DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Inclusive `[start, end]` window every rollup is scoped to. All times are UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Resolves optional `YYYY-MM-DD` bounds. An explicit end date covers the
    /// whole day; a missing start falls back to `span` before the end.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        span: RangeSpan,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let end = match non_empty(end) {
            Some(raw) => at_time(parse_date(raw)?, 23, 59, 59)?,
            None => now,
        };
        let start = match non_empty(start) {
            Some(raw) => at_time(parse_date(raw)?, 0, 0, 0)?,
            None => span.before(end),
        };

        if start > end {
            return Err(Error::invalid("start_date must not be after end_date"));
        }

        Ok(Self { start, end })
    }

    pub fn trailing(span: RangeSpan, now: DateTime<Utc>) -> Self {
        Self {
            start: span.before(now),
            end: now,
        }
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|r| !r.is_empty())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| Error::invalid(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

fn at_time(date: NaiveDate, hour: u32, min: u32, sec: u32) -> Result<DateTime<Utc>> {
    date.and_hms_opt(hour, min, sec)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::invalid(format!("invalid date '{date}'")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Month,
}

impl Granularity {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "day" => Ok(Granularity::Day),
            "month" => Ok(Granularity::Month),
            other => Err(Error::invalid(format!("invalid period: {other}"))),
        }
    }

    /// `time::format` pattern producing the bucket label.
    pub fn format(&self) -> &'static str {
        match self {
            Granularity::Day => "%Y-%m-%d",
            Granularity::Month => "%Y-%m",
        }
    }

    pub fn default_span(&self) -> RangeSpan {
        match self {
            Granularity::Day => RangeSpan::Days(14),
            Granularity::Month => RangeSpan::Months(12),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    pub count: u64,
}

/// Daily plays with listening time, used by per-user profiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationPoint {
    pub date: String,
    pub plays: u64,
    pub minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    pub id: String,
    pub name: Option<String>,
    pub count: u64,
}

/// Additive union of two date series, ordered by date.
pub fn merge_series(left: &[TrendPoint], right: &[TrendPoint]) -> Vec<TrendPoint> {
    let mut merged: BTreeMap<&str, u64> = BTreeMap::new();
    for point in left.iter().chain(right) {
        *merged.entry(point.date.as_str()).or_default() += point.count;
    }
    merged
        .into_iter()
        .map(|(date, count)| TrendPoint {
            date: date.to_string(),
            count,
        })
        .collect()
}

/// Sums counts per key and keeps the `limit` largest, ties by ascending key.
pub fn rank_counts<I>(counts: I, limit: usize) -> Vec<(String, u64)>
where
    I: IntoIterator<Item = (String, u64)>,
{
    let mut totals: HashMap<String, u64> = HashMap::new();
    for (key, count) in counts {
        *totals.entry(key).or_default() += count;
    }

    let mut ranked: Vec<(String, u64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

/// Credits each song's count to every owner linked to it (album or singer).
/// A song linked to several singers counts for each of them.
pub fn attribute_counts(
    song_counts: &HashMap<String, u64>,
    links: &[(String, String)],
) -> Vec<(String, u64)> {
    links
        .iter()
        .filter_map(|(owner, song)| song_counts.get(song).map(|count| (owner.clone(), *count)))
        .collect()
}

/// Hour with the most plays; ties go to the earliest hour.
pub fn peak_hour(hours: &[(u32, u64)]) -> Option<u32> {
    hours
        .iter()
        .filter(|(_, count)| *count > 0)
        .min_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .map(|(hour, _)| *hour)
}

pub fn seconds_to_minutes(seconds: i64) -> f64 {
    (seconds as f64 / 60.0 * 100.0).round() / 100.0
}

#[derive(Debug, Default, Deserialize)]
pub struct DateRangeRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserStatsRequest {
    pub target_user_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopFavoritesRequest {
    pub target_type: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TopFavorites {
    pub target_type: String,
    pub list: Vec<RankingEntry>,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub range: DateRange,
    pub new_users: u64,
    pub plays: u64,
    pub comments: u64,
    pub favorites: u64,
    pub songlists: u64,
}

#[derive(Debug, Serialize)]
pub struct BehaviorSummary {
    pub new_users: u64,
    pub total_plays: u64,
    pub total_comments: u64,
    pub total_favorites: u64,
    /// Users with at least one play or comment in range.
    pub active_users: u64,
}

#[derive(Debug, Serialize)]
pub struct BehaviorTrends {
    pub plays: Vec<TrendPoint>,
    pub comments: Vec<TrendPoint>,
    pub interactions: Vec<TrendPoint>,
    pub new_users: Vec<TrendPoint>,
}

#[derive(Debug, Serialize)]
pub struct TopUsers {
    pub by_plays: Vec<RankingEntry>,
    pub by_comments: Vec<RankingEntry>,
}

#[derive(Debug, Serialize)]
pub struct BehaviorStats {
    pub range: DateRange,
    pub summary: BehaviorSummary,
    pub trends: BehaviorTrends,
    pub top_users: TopUsers,
}

#[derive(Debug, Serialize)]
pub struct ProfileTotals {
    pub plays: u64,
    pub minutes: f64,
    pub comments: u64,
    pub favorites: u64,
    pub songlists: u64,
}

#[derive(Debug, Serialize)]
pub struct SocialCounts {
    pub followers: u64,
    pub following: u64,
}

#[derive(Debug, Serialize)]
pub struct UserBehaviorProfile {
    pub user_id: String,
    pub username: String,
    pub status: String,
    pub range: DateRange,
    pub totals: ProfileTotals,
    pub top_artist: Option<RankingEntry>,
    pub peak_hour: Option<u32>,
    pub daily: Vec<DurationPoint>,
    pub social: SocialCounts,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn point(date: &str, count: u64) -> TrendPoint {
        TrendPoint {
            date: date.to_string(),
            count,
        }
    }

    #[test]
    fn test_resolve_defaults_to_span() {
        let range = DateRange::resolve(None, None, RangeSpan::Days(7), now()).unwrap();
        assert_eq!(range.end, now());
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap());

        let range = DateRange::resolve(None, None, RangeSpan::Months(12), now()).unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2023, 3, 15, 12, 0, 0).unwrap());

        let range = DateRange::resolve(None, Some("2024-01-01"), RangeSpan::All, now()).unwrap();
        assert_eq!(range.start, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_resolve_end_date_is_inclusive() {
        let range =
            DateRange::resolve(Some("2024-01-01"), Some("2024-01-31"), RangeSpan::Days(7), now())
                .unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_resolve_rejects_bad_input() {
        assert!(DateRange::resolve(Some("01/02/2024"), None, RangeSpan::Days(7), now()).is_err());
        assert!(matches!(
            DateRange::resolve(Some("2024-02-10"), Some("2024-02-01"), RangeSpan::Days(7), now()),
            Err(Error::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_resolve_ignores_blank_bounds() {
        let range = DateRange::resolve(Some(""), Some("  "), RangeSpan::Days(30), now()).unwrap();
        assert_eq!(range.end, now());
    }

    #[test]
    fn test_merge_series_is_additive() {
        let comments = vec![point("2024-03-01", 2), point("2024-03-03", 1)];
        let favorites = vec![point("2024-03-01", 5), point("2024-03-02", 4)];
        assert_eq!(
            merge_series(&comments, &favorites),
            vec![
                point("2024-03-01", 7),
                point("2024-03-02", 4),
                point("2024-03-03", 1)
            ]
        );
        assert!(merge_series(&[], &[]).is_empty());
    }

    #[test]
    fn test_rank_counts_orders_and_limits() {
        let ranked = rank_counts(
            vec![
                ("1".to_string(), 3),
                ("2".to_string(), 5),
                ("3".to_string(), 1),
            ],
            2,
        );
        assert_eq!(ranked, vec![("2".to_string(), 5), ("1".to_string(), 3)]);
    }

    #[test]
    fn test_rank_counts_sums_and_breaks_ties_by_key() {
        let ranked = rank_counts(
            vec![
                ("b".to_string(), 2),
                ("a".to_string(), 1),
                ("a".to_string(), 1),
            ],
            10,
        );
        assert_eq!(ranked, vec![("a".to_string(), 2), ("b".to_string(), 2)]);
    }

    #[test]
    fn test_attribute_counts_to_owners() {
        let song_counts: HashMap<String, u64> =
            [("s1".to_string(), 4), ("s2".to_string(), 2)].into_iter().collect();
        let links = vec![
            ("singer_a".to_string(), "s1".to_string()),
            ("singer_b".to_string(), "s1".to_string()),
            ("singer_a".to_string(), "s2".to_string()),
            ("singer_c".to_string(), "s9".to_string()),
        ];
        let ranked = rank_counts(attribute_counts(&song_counts, &links), 10);
        assert_eq!(
            ranked,
            vec![("singer_a".to_string(), 6), ("singer_b".to_string(), 4)]
        );
    }

    #[test]
    fn test_peak_hour() {
        assert_eq!(peak_hour(&[(21, 4), (8, 4), (13, 1)]), Some(8));
        assert_eq!(peak_hour(&[(3, 0)]), None);
        assert_eq!(peak_hour(&[]), None);
    }

    #[test]
    fn test_granularity() {
        assert_eq!(Granularity::parse("month").unwrap().format(), "%Y-%m");
        assert_eq!(Granularity::Day.default_span(), RangeSpan::Days(14));
        assert!(Granularity::parse("year").is_err());
    }

    #[test]
    fn test_seconds_to_minutes_rounds() {
        assert_eq!(seconds_to_minutes(0), 0.0);
        assert_eq!(seconds_to_minutes(100), 1.67);
        assert_eq!(seconds_to_minutes(180), 3.0);
    }
}
