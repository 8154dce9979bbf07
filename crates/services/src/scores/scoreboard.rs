use chrono::{DateTime, Datelike, Utc};
use serde::{Serialize, Serializer};

use quiz_core::model::{Percentage, iso_millis};
use storage::repository::StoredScore;

/// Scores grouped by learner name, plus totals across every kept attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scoreboard {
    pub groups: Vec<ScoreGroup>,
    pub overall: OverallStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreGroup {
    pub name: String,
    pub count: usize,
    pub average_percentage: Percentage,
    pub best_percentage: Percentage,
    #[serde(serialize_with = "serialize_date")]
    pub most_recent_date: DateTime<Utc>,
    pub attempts: Vec<StoredScore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub attempts: usize,
    pub average_percentage: Percentage,
}

fn serialize_date<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&iso_millis(*value))
}

/// Whether a single attempt matches a free-text search.
///
/// Matches case-insensitively on subject, topic and remark, and on the
/// score, percentage and date rendered as `M/D/YYYY` or `YYYY-MM-DD`.
#[must_use]
pub fn matches_search(score: &StoredScore, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    let record = &score.record;
    let date = record.date();
    let us_date = format!("{}/{}/{}", date.month(), date.day(), date.year());
    let iso_date = date.format("%Y-%m-%d").to_string();

    [
        record.subject_name().to_lowercase(),
        record.topic_name().to_lowercase(),
        record.remark().as_str().to_lowercase(),
        record.score().to_string(),
        record.percentage().to_string(),
        us_date,
        iso_date,
    ]
    .iter()
    .any(|field| field.contains(&needle))
}

/// Group `scores` by learner and keep the groups matching `search`.
///
/// A group is kept when its name or any one of its attempts matches; kept
/// groups keep all their attempts in input order. Groups are ordered by
/// most recent attempt, newest first.
#[must_use]
pub fn aggregate(scores: &[StoredScore], search: Option<&str>) -> Scoreboard {
    let mut grouped: Vec<(String, Vec<StoredScore>)> = Vec::new();
    for score in scores {
        let name = score.record.name();
        match grouped.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, attempts)) => attempts.push(score.clone()),
            None => grouped.push((name.to_owned(), vec![score.clone()])),
        }
    }

    let needle = search.map(str::trim).filter(|s| !s.is_empty());
    let mut groups: Vec<ScoreGroup> = grouped
        .into_iter()
        .filter(|(name, attempts)| {
            needle.is_none_or(|needle| {
                name.to_lowercase().contains(&needle.to_lowercase())
                    || attempts.iter().any(|a| matches_search(a, needle))
            })
        })
        .filter_map(|(name, attempts)| summarize(name, attempts))
        .collect();

    // Stable: equal dates keep first-seen order.
    groups.sort_by(|a, b| b.most_recent_date.cmp(&a.most_recent_date));

    let all: Vec<f64> = groups
        .iter()
        .flat_map(|g| g.attempts.iter().map(|a| a.record.percentage().value()))
        .collect();
    let overall = OverallStats {
        attempts: all.len(),
        average_percentage: mean(&all),
    };

    Scoreboard { groups, overall }
}

fn summarize(name: String, attempts: Vec<StoredScore>) -> Option<ScoreGroup> {
    let percentages: Vec<f64> = attempts
        .iter()
        .map(|a| a.record.percentage().value())
        .collect();
    let best = percentages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let most_recent_date = attempts.iter().map(|a| a.record.date()).max()?;
    Some(ScoreGroup {
        name,
        count: attempts.len(),
        average_percentage: mean(&percentages),
        best_percentage: Percentage::new(best),
        most_recent_date,
        attempts,
    })
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> Percentage {
    if values.is_empty() {
        return Percentage::default();
    }
    Percentage::new(values.iter().sum::<f64>() / values.len() as f64)
}
