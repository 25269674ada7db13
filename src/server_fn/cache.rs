use crate::models::Article;
use once_cell::sync::Lazy;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Short-lived cache of the unfiltered latest feed, stored with the limit it
/// was fetched at. Category-filtered requests bypass it, and a refresh
/// trigger invalidates it so the reload after the settle delay sees
/// regenerated data.
pub static LATEST_CACHE: Lazy<Mutex<(Option<(u32, Vec<Article>)>, Instant)>> =
    Lazy::new(|| Mutex::new((None, Instant::now())));
pub const CACHE_DURATION: Duration = Duration::from_secs(60);

/// A cached list can serve a request only when it is fresh and was fetched
/// with at least the requested limit; a larger cached list is truncated
/// down. A smaller one misses, since it cannot know whether more articles
/// exist upstream.
pub fn cached_slice(
    cached: &Option<(u32, Vec<Article>)>,
    age: Duration,
    limit: u32,
) -> Option<Vec<Article>> {
    let (cached_limit, articles) = cached.as_ref()?;
    if age < CACHE_DURATION && *cached_limit >= limit {
        let mut slice = articles.clone();
        slice.truncate(limit as usize);
        Some(slice)
    } else {
        None
    }
}

pub fn invalidate_latest_cache() {
    let mut cache = LATEST_CACHE.lock().unwrap();
    *cache = (None, Instant::now());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn articles(n: usize) -> Vec<Article> {
        (0..n)
            .map(|i| Article {
                title: Some(format!("article {}", i)),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn cache_hit_truncates_to_the_requested_limit() {
        let cached = Some((200, articles(200)));
        let slice = cached_slice(&cached, Duration::from_secs(1), 20).unwrap();
        assert_eq!(slice.len(), 20);
        assert_eq!(slice[0].title_text(), "article 0");
    }

    #[test]
    fn cache_cannot_serve_more_than_it_fetched() {
        let cached = Some((20, articles(20)));
        assert!(cached_slice(&cached, Duration::from_secs(1), 200).is_none());
        // an equal limit is served as-is
        let slice = cached_slice(&cached, Duration::from_secs(1), 20).unwrap();
        assert_eq!(slice.len(), 20);
    }

    #[test]
    fn short_upstream_lists_still_serve_smaller_requests() {
        // fetched at limit 200 but upstream only had 50 articles
        let cached = Some((200, articles(50)));
        let slice = cached_slice(&cached, Duration::from_secs(1), 100).unwrap();
        assert_eq!(slice.len(), 50);
    }

    #[test]
    fn stale_or_empty_entries_miss() {
        assert!(cached_slice(&None, Duration::from_secs(1), 20).is_none());
        let cached = Some((200, articles(200)));
        assert!(cached_slice(&cached, CACHE_DURATION, 20).is_none());
    }
}
