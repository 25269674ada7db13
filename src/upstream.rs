use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "ssr")] {
        use once_cell::sync::Lazy;
        use std::env;

        static CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

        static BASE_URL: Lazy<String> = Lazy::new(|| {
            let url = env::var("NEWS_API_URL").expect("NEWS_API_URL must be set");
            url.trim_end_matches('/').to_string()
        });

        pub fn get_client() -> &'static reqwest::Client {
            &CLIENT
        }

        pub fn base_url() -> &'static str {
            &BASE_URL
        }
    }
}

/// `GET {base}/api/latest?limit=..[&category=..]`. The category parameter is
/// omitted entirely when no filter is active.
pub fn latest_url(base: &str, limit: u32, category: Option<&str>) -> String {
    match category {
        Some(cat) if !cat.is_empty() => format!(
            "{}/api/latest?limit={}&category={}",
            base,
            limit,
            urlencoding::encode(cat)
        ),
        _ => format!("{}/api/latest?limit={}", base, limit),
    }
}

/// `GET {base}/api/recommend?limit=..[&category=..]`.
pub fn recommend_url(base: &str, limit: u32, category: Option<&str>) -> String {
    match category {
        Some(cat) if !cat.is_empty() => format!(
            "{}/api/recommend?limit={}&category={}",
            base,
            limit,
            urlencoding::encode(cat)
        ),
        _ => format!("{}/api/recommend?limit={}", base, limit),
    }
}

/// `POST {base}/api/refresh`.
pub fn refresh_url(base: &str) -> String {
    format!("{}/api/refresh", base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_url_omits_empty_category() {
        assert_eq!(
            latest_url("http://localhost:5000", 200, None),
            "http://localhost:5000/api/latest?limit=200"
        );
        assert_eq!(
            latest_url("http://localhost:5000", 200, Some("")),
            "http://localhost:5000/api/latest?limit=200"
        );
    }

    #[test]
    fn latest_url_encodes_category() {
        assert_eq!(
            latest_url("http://localhost:5000", 200, Some("technology")),
            "http://localhost:5000/api/latest?limit=200&category=technology"
        );
        assert_eq!(
            latest_url("http://localhost:5000", 50, Some("world news")),
            "http://localhost:5000/api/latest?limit=50&category=world%20news"
        );
    }

    #[test]
    fn recommend_and_refresh_urls() {
        assert_eq!(
            recommend_url("http://localhost:5000", 6, Some("sports")),
            "http://localhost:5000/api/recommend?limit=6&category=sports"
        );
        assert_eq!(
            recommend_url("http://localhost:5000", 6, None),
            "http://localhost:5000/api/recommend?limit=6"
        );
        assert_eq!(
            refresh_url("http://localhost:5000"),
            "http://localhost:5000/api/refresh"
        );
    }
}
