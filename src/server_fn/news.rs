use cfg_if::cfg_if;
use leptos::prelude::*;

use crate::models::Article;

cfg_if! {
    if #[cfg(feature = "ssr")] {
        use std::fmt;
        use log::{info, error};

        #[derive(Debug)]
        enum FeedError {
            RequestError(String),
            BadStatus(String),
            JsonParseError(String),
        }

        impl fmt::Display for FeedError {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    FeedError::RequestError(e) => write!(f, "request error: {}", e),
                    FeedError::BadStatus(e) => write!(f, "upstream status: {}", e),
                    FeedError::JsonParseError(e) => write!(f, "JSON parse error: {}", e),
                }
            }
        }

        fn to_server_error(e: FeedError) -> ServerFnError {
            ServerFnError::ServerError(e.to_string())
        }

        async fn fetch_json(url: &str) -> Result<String, FeedError> {
            use crate::upstream::get_client;

            let response = get_client()
                .get(url)
                .send()
                .await
                .map_err(|e| {
                    error!("upstream request error: {}", e);
                    FeedError::RequestError(e.to_string())
                })?;

            let status = response.status();
            if !status.is_success() {
                error!("upstream returned {} for {}", status, url);
                return Err(FeedError::BadStatus(status.to_string()));
            }

            response.text().await.map_err(|e| {
                error!("error reading upstream body: {}", e);
                FeedError::RequestError(e.to_string())
            })
        }
    }
}

/// Latest articles for an optional category, newest first. `category` is
/// forwarded upstream only when present and non-empty.
#[server(GetLatest, "/api")]
pub async fn get_latest(
    limit: u32,
    category: Option<String>,
) -> Result<Vec<Article>, ServerFnError> {
    use crate::models::LatestResponse;
    use crate::server_fn::cache::{cached_slice, LATEST_CACHE};
    use crate::upstream::{base_url, latest_url};
    use serde_json::from_str;
    use std::time::Instant;

    let unfiltered = category.as_deref().map_or(true, str::is_empty);

    // check cache only for the unfiltered feed
    if unfiltered {
        let (cached, last_fetch) = LATEST_CACHE.lock().unwrap().clone();
        if let Some(articles) = cached_slice(&cached, last_fetch.elapsed(), limit) {
            info!("returning cached latest articles");
            return Ok(articles);
        }
    }

    let url = latest_url(base_url(), limit, category.as_deref());
    info!("fetching latest articles from upstream...");

    let body = fetch_json(&url).await.map_err(to_server_error)?;

    let parsed: LatestResponse = from_str(&body).map_err(|e| {
        error!("JSON parse error: {}. Body length: {}", e, body.len());
        to_server_error(FeedError::JsonParseError(e.to_string()))
    })?;

    info!("received {} articles", parsed.articles.len());

    if unfiltered {
        let mut cache = LATEST_CACHE.lock().unwrap();
        *cache = (Some((limit, parsed.articles.clone())), Instant::now());
    }

    Ok(parsed.articles)
}

/// Recommended articles for an optional category. Never cached: the
/// recommender scores against recency, so replies go stale quickly.
#[server(GetRecommendations, "/api")]
pub async fn get_recommendations(
    limit: u32,
    category: Option<String>,
) -> Result<Vec<Article>, ServerFnError> {
    use crate::models::RecommendResponse;
    use crate::upstream::{base_url, recommend_url};
    use serde_json::from_str;

    let url = recommend_url(base_url(), limit, category.as_deref());
    info!("fetching recommendations from upstream...");

    let body = fetch_json(&url).await.map_err(to_server_error)?;

    let parsed: RecommendResponse = from_str(&body).map_err(|e| {
        error!("JSON parse error: {}. Body length: {}", e, body.len());
        to_server_error(FeedError::JsonParseError(e.to_string()))
    })?;

    info!("received {} recommendations", parsed.recommendations.len());
    Ok(parsed.recommendations)
}

/// Kicks off the upstream regeneration job. The reply acknowledges that the
/// job started; completion is never signalled, so callers settle with a
/// fixed delay before reloading.
#[server(TriggerRefresh, "/api")]
pub async fn trigger_refresh() -> Result<String, ServerFnError> {
    use crate::models::RefreshAck;
    use crate::server_fn::cache::invalidate_latest_cache;
    use crate::upstream::{base_url, get_client, refresh_url};

    info!("forwarding refresh trigger upstream...");

    let response = get_client()
        .post(refresh_url(base_url()))
        .send()
        .await
        .map_err(|e| {
            error!("refresh trigger failed: {}", e);
            to_server_error(FeedError::RequestError(e.to_string()))
        })?;

    let status = response.status();
    if !status.is_success() {
        error!("refresh trigger returned {}", status);
        return Err(to_server_error(FeedError::BadStatus(status.to_string())));
    }

    let ack: RefreshAck = response.json().await.unwrap_or_default();
    info!("upstream refresh {}: {}", ack.status, ack.message);

    invalidate_latest_cache();

    Ok(ack.status)
}
