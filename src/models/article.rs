use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One article as the upstream backend ships it. Every field is optional;
/// rendering substitutes an empty string for anything missing.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Article {
    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    pub fn category_text(&self) -> &str {
        self.category.as_deref().unwrap_or("")
    }

    pub fn source_text(&self) -> &str {
        self.source.as_deref().unwrap_or("")
    }

    /// Client-side visibility rule: an article matches when the query (if
    /// any) is a case-insensitive substring of its title or description, and
    /// the category filter (if any) equals its category exactly.
    pub fn matches(&self, query: &str, category: &str) -> bool {
        let q = query.trim().to_lowercase();
        let matches_query = q.is_empty()
            || self.title_text().to_lowercase().contains(&q)
            || self.description_text().to_lowercase().contains(&q);
        let matches_category = category.is_empty() || self.category_text() == category;
        matches_query && matches_category
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LatestResponse {
    #[serde(default)]
    pub articles: Vec<Article>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RecommendResponse {
    #[serde(default)]
    pub recommendations: Vec<Article>,
}

/// Body of the upstream refresh acknowledgment. The job only reports that it
/// has started; there is no completion signal.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RefreshAck {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Coarse relative age for a timestamp string, measured against `now`.
/// Unparseable or empty input formats as an empty string; anything older
/// than a day falls back to an absolute date.
pub fn time_ago_at(published_at: &str, now: DateTime<Utc>) -> String {
    let Some(then) = parse_published_at(published_at) else {
        return String::new();
    };
    let delta = now.signed_duration_since(then).num_seconds().max(0);
    if delta < 60 {
        format!("{}s ago", delta)
    } else if delta < 3600 {
        format!("{}m ago", delta / 60)
    } else if delta < 86400 {
        format!("{}h ago", delta / 3600)
    } else {
        then.format("%b %-d, %Y").to_string()
    }
}

pub fn time_ago(published_at: &str) -> String {
    time_ago_at(published_at, Utc::now())
}

/// Upstream timestamps are ISO 8601, sometimes without an offset (the
/// database normalizes datetimes to naive isoformat). Naive values are read
/// as UTC.
fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn article(title: &str, description: &str, category: &str) -> Article {
        Article {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            category: Some(category.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn matches_is_case_insensitive_on_title_and_description() {
        let a = article("Storm warning", "heavy rain expected", "general");
        assert!(a.matches("storm", ""));
        assert!(a.matches("RAIN", ""));
        assert!(!a.matches("rally", ""));
    }

    #[test]
    fn empty_query_matches_everything_in_category() {
        let a = article("Market rally", "", "business");
        assert!(a.matches("", ""));
        assert!(a.matches("", "business"));
        assert!(!a.matches("", "sports"));
    }

    #[test]
    fn query_and_category_must_both_match() {
        let cards = [
            article("Storm warning", "", "general"),
            article("Market rally", "", "business"),
        ];
        let visible: Vec<_> = cards.iter().filter(|a| a.matches("storm", "")).collect();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title_text(), "Storm warning");
        assert!(!cards[0].matches("storm", "business"));
    }

    #[test]
    fn missing_fields_render_as_empty_strings() {
        let a: Article = serde_json::from_str(r#"{"title":"only a title"}"#).unwrap();
        assert_eq!(a.title_text(), "only a title");
        assert_eq!(a.description_text(), "");
        assert_eq!(a.category_text(), "");
        assert_eq!(a.source_text(), "");
        assert!(a.url.is_none());
    }

    #[test]
    fn envelopes_tolerate_missing_arrays() {
        let latest: LatestResponse = serde_json::from_str("{}").unwrap();
        assert!(latest.articles.is_empty());
        let recs: RecommendResponse = serde_json::from_str("{}").unwrap();
        assert!(recs.recommendations.is_empty());
        let ack: RefreshAck =
            serde_json::from_str(r#"{"status":"started","message":"wait"}"#).unwrap();
        assert_eq!(ack.status, "started");
    }

    #[test]
    fn time_ago_buckets_truncate() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 12, 0, 0).unwrap();
        let at = |secs: i64| (now - chrono::Duration::seconds(secs)).to_rfc3339();
        assert_eq!(time_ago_at(&at(0), now), "0s ago");
        assert_eq!(time_ago_at(&at(59), now), "59s ago");
        assert_eq!(time_ago_at(&at(125), now), "2m ago");
        assert_eq!(time_ago_at(&at(3599), now), "59m ago");
        assert_eq!(time_ago_at(&at(3600), now), "1h ago");
        assert_eq!(time_ago_at(&at(86399), now), "23h ago");
    }

    #[test]
    fn time_ago_falls_back_to_absolute_date_after_a_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 12, 0, 0).unwrap();
        let label = time_ago_at("2026-03-01T09:30:00", now);
        assert_eq!(label, "Mar 1, 2026");
    }

    #[test]
    fn time_ago_handles_naive_and_empty_input() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 12, 0, 0).unwrap();
        assert_eq!(time_ago_at("2026-03-04T11:58:00", now), "2m ago");
        assert_eq!(time_ago_at("", now), "");
        assert_eq!(time_ago_at("not a date", now), "");
    }
}
