use leptos::prelude::*;
use std::borrow::Cow;
use std::time::Duration;
use wasm_bindgen_futures::spawn_local;

use crate::components::recommendations::RecommendPanel;
use crate::components::search::FeedSearch;
use crate::models::{time_ago, Article};
use crate::server_fn::{get_latest, get_recommendations, trigger_refresh};

/// How many articles one load pulls from upstream. Large enough that "load
/// more" works without refetching.
pub const FETCH_LIMIT: u32 = 200;
/// How many cards each "load more" click reveals.
pub const PAGE_SIZE: usize = 20;
/// Recommendations shown in the side panel.
pub const REC_LIMIT: u32 = 6;
/// How long a triggered regeneration is given before reloading. The upstream
/// job only acknowledges that it started, so this is an approximation rather
/// than a completion signal.
pub const REFRESH_SETTLE: Duration = Duration::from_millis(4000);

pub const CATEGORIES: [&str; 4] = ["general", "technology", "business", "sports"];

/// Reveal count right after a fresh load.
pub fn initial_reveal(total: usize) -> usize {
    PAGE_SIZE.min(total)
}

/// Reveal count after one "load more" click.
pub fn next_reveal(current: usize, total: usize) -> usize {
    (current + PAGE_SIZE).min(total)
}

/// Ticket counter for loads. `begin` issues the next ticket; a response is
/// applied only while its ticket `is_current`, so whichever load was issued
/// last wins regardless of arrival order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LoadSequence {
    latest: u64,
}

impl LoadSequence {
    pub fn begin(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest
    }
}

/// The feed controller. Owns the in-memory article list and all view state
/// as signals: the list is replaced wholesale on every load, the reveal
/// count windows it, and the search/category filters narrow the revealed
/// slice without refetching.
#[component]
pub fn Feed() -> impl IntoView {
    let (search_input, set_search_input) = signal(String::new());
    let (selected_category, set_selected_category) = signal(String::new());
    let (articles, set_articles) = signal(Vec::<Article>::new());
    let (recommendations, set_recommendations) = signal(Vec::<Article>::new());
    let (reveal, set_reveal) = signal(0usize);
    let (reload_tick, set_reload_tick) = signal(0u32);
    let (is_loading, set_is_loading) = signal(false);
    let (is_refreshing, set_is_refreshing) = signal(false);
    let (load_error, set_load_error) = signal(Option::<String>::None);
    let (rec_error, set_rec_error) = signal(Option::<String>::None);

    // An old category's fetch resolving late cannot overwrite a newer one:
    // every load takes a ticket, and stale tickets are dropped on arrival.
    let load_seq: StoredValue<LoadSequence> = StoredValue::new(LoadSequence::default());

    let run_load = move || {
        let mut sequence = load_seq.get_value();
        let seq = sequence.begin();
        load_seq.set_value(sequence);

        let category = selected_category.get_untracked();
        let filter = (!category.is_empty()).then(|| category.clone());

        set_is_loading.set(true);
        set_load_error.set(None);

        spawn_local(async move {
            match get_latest(FETCH_LIMIT, filter.clone()).await {
                Ok(list) => {
                    if !load_seq.get_value().is_current(seq) {
                        return; // stale response, a newer load superseded us
                    }
                    set_reveal.set(initial_reveal(list.len()));
                    set_articles.set(list);
                    set_is_loading.set(false);
                }
                Err(e) => {
                    log::error!("failed to load articles: {}", e);
                    if !load_seq.get_value().is_current(seq) {
                        return;
                    }
                    set_load_error.set(Some("Failed to load articles. Try again in a moment.".to_string()));
                    set_is_loading.set(false);
                    return;
                }
            }

            match get_recommendations(REC_LIMIT, filter).await {
                Ok(recs) => {
                    if !load_seq.get_value().is_current(seq) {
                        return;
                    }
                    set_rec_error.set(None);
                    set_recommendations.set(recs);
                }
                Err(e) => {
                    log::error!("failed to load recommendations: {}", e);
                    if !load_seq.get_value().is_current(seq) {
                        return;
                    }
                    set_rec_error.set(Some("Recommendations unavailable".to_string()));
                }
            }
        });
    };

    // Initial load, plus a reload on every category change or refresh
    // completion. Concurrent runs are resolved by the sequence check above.
    Effect::new(move |_| {
        let _ = selected_category.get();
        let _ = reload_tick.get();
        run_load();
    });

    let visible = Memo::new(move |_| {
        let query = search_input.get();
        let category = selected_category.get();
        articles.with(|list| {
            let shown = &list[..reveal.get().min(list.len())];
            shown
                .iter()
                .filter(|a| a.matches(&query, &category))
                .cloned()
                .collect::<Vec<_>>()
        })
    });

    let has_more = Memo::new(move |_| articles.with(|list| reveal.get() < list.len()));

    let on_load_more = move |_| {
        let total = articles.with(|list| list.len());
        set_reveal.set(next_reveal(reveal.get(), total));
    };

    let on_refresh = move |_| {
        if is_refreshing.get() {
            return;
        }
        set_is_refreshing.set(true);
        set_load_error.set(None);

        spawn_local(async move {
            match trigger_refresh().await {
                Ok(status) => {
                    log::info!("refresh accepted upstream: {}", status);
                    // no completion signal exists; reload after a settle delay
                    set_timeout(
                        move || {
                            set_reload_tick.update(|t| *t += 1);
                            set_is_refreshing.set(false);
                        },
                        REFRESH_SETTLE,
                    );
                }
                Err(e) => {
                    log::error!("refresh trigger failed: {}", e);
                    set_load_error.set(Some("Refresh failed. The feed was left as it was.".to_string()));
                    set_is_refreshing.set(false);
                }
            }
        });
    };

    view! {
        <div class="pt-4 space-y-4">
            <FeedSearch on_search=Callback::new(move |query: String| set_search_input.set(query))/>

            <div class="flex items-center gap-4 pl-4">
                <select
                    on:change=move |ev| set_selected_category.set(event_target_value(&ev))
                    class="w-52 p-2 rounded-md bg-gray-100 dark:bg-teal-800 text-gray-800 dark:text-gray-200
                           border border-teal-500 dark:border-seafoam-500
                           focus:border-seafoam-600 dark:focus:border-aqua-400
                           focus:outline-none focus:ring-2 focus:ring-seafoam-500 dark:focus:ring-aqua-400"
                >
                    <option value="">"All Categories"</option>
                    {CATEGORIES
                        .iter()
                        .map(|category| {
                            view! {
                                <option value={*category}>{category.to_string()}</option>
                            }
                        })
                        .collect_view()}
                </select>

                <button
                    on:click=on_refresh
                    prop:disabled=move || is_refreshing.get()
                    class="px-4 py-2 bg-seafoam-500 dark:bg-seafoam-600 text-white rounded
                           hover:bg-seafoam-400 dark:hover:bg-seafoam-500 transition-colors
                           disabled:bg-gray-400 dark:disabled:bg-gray-600 disabled:cursor-not-allowed"
                >
                    {move || if is_refreshing.get() { "Refreshing..." } else { "Refresh" }}
                </button>
            </div>

            <div class="flex flex-col lg:flex-row gap-4 px-4">
                <div class="flex-1 space-y-4">
                    {move || {
                        if let Some(err) = load_error.get() {
                            view! {
                                <div class="text-center text-red-600 dark:text-red-400 py-8">{err}</div>
                            }
                                .into_any()
                        } else if is_loading.get() && articles.with(Vec::is_empty) {
                            view! {
                                <p class="text-center text-teal-600 dark:text-aqua-400">"Loading..."</p>
                            }
                                .into_any()
                        } else {
                            let cards = visible.get();
                            if cards.is_empty() {
                                view! {
                                    <div class="text-center text-gray-500 dark:text-gray-400">
                                        "No articles found"
                                    </div>
                                }
                                    .into_any()
                            } else {
                                view! {
                                    <div class="grid grid-cols-1 sm:grid-cols-2 xl:grid-cols-3 gap-4">
                                        {cards
                                            .into_iter()
                                            .map(|article| {
                                                view! {
                                                    <ArticleCard
                                                        article=article
                                                        search_term=search_input.get()
                                                    />
                                                }
                                            })
                                            .collect_view()}
                                    </div>
                                }
                                    .into_any()
                            }
                        }
                    }}

                    {move || {
                        has_more
                            .get()
                            .then(|| {
                                view! {
                                    <div class="flex justify-center">
                                        <button
                                            on:click=on_load_more
                                            class="px-6 py-2 rounded-md border-2 border-teal-600 dark:border-seafoam-600
                                                   text-gray-700 dark:text-gray-200 bg-white dark:bg-teal-800
                                                   hover:border-seafoam-500 dark:hover:border-aqua-500 transition-colors"
                                        >
                                            "Load more"
                                        </button>
                                    </div>
                                }
                            })
                    }}
                </div>

                <RecommendPanel recommendations=recommendations error=rec_error/>
            </div>
        </div>
    }
}

#[component]
pub fn ArticleCard(
    article: Article,
    #[prop(into, optional)] search_term: String,
) -> impl IntoView {
    let title = article.title_text().to_string();
    let description = article.description_text().to_string();
    let meta = format!(
        "{} \u{2022} {}",
        article.source_text(),
        time_ago(article.published_at.as_deref().unwrap_or(""))
    );
    let link = article.url.clone().unwrap_or_else(|| "#".to_string());
    let image = article.image_url.clone().unwrap_or_default();

    view! {
        <article class="flex flex-col items-start h-full w-full bg-white dark:bg-teal-800
                        border-2 border-gray-200 dark:border-teal-700
                        hover:border-seafoam-500 dark:hover:border-aqua-500
                        p-4 rounded-lg shadow-md hover:shadow-lg transition-all">
            <img src=image alt=title.clone() loading="lazy" class="w-full h-40 object-cover rounded-md"/>
            <div class="flex flex-col w-full space-y-1 mt-2">
                <HighlightedText
                    text=Cow::from(title)
                    search_term=search_term.clone()
                    class="text-sm md:text-base lg:text-lg text-seafoam-600 dark:text-aqua-400 line-clamp-2 font-medium"
                />
                <p class="text-xs md:text-sm text-gray-500 dark:text-gray-400">{meta}</p>
                <HighlightedText
                    text=Cow::from(description)
                    search_term=search_term
                    class="text-xs md:text-sm lg:text-base text-gray-600 dark:text-gray-300 line-clamp-3"
                />
            </div>
            <a
                href=link
                target="_blank"
                rel="noopener noreferrer"
                class="mt-2 text-sm text-teal-600 dark:text-mint-400 hover:underline"
            >
                "Read more"
            </a>
        </article>
    }
}

/// Splits `text` into (segment, is_match) pairs so matches of the search
/// term keep their original casing while being wrapped in a highlight.
/// The scan runs over a lowercased copy whose byte offsets are mapped back
/// to the originating chars; case folding can change byte lengths (dotted
/// capital I becomes two chars), so haystack offsets must never be used to
/// slice `text` directly.
fn highlight_segments(text: &str, search_term: &str) -> Vec<(String, bool)> {
    let needle = search_term.trim().to_lowercase();
    if needle.is_empty() {
        return vec![(text.to_string(), false)];
    }

    // one `origin` entry per lowercased byte, naming the byte offset of the
    // char in `text` it came from, plus a sentinel for the end
    let mut haystack = String::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len() + 1);
    for (index, ch) in text.char_indices() {
        for folded in ch.to_lowercase() {
            haystack.push(folded);
            origin.resize(haystack.len(), index);
        }
    }
    origin.push(text.len());

    let mut segments = Vec::new();
    let mut cursor = 0; // byte position in the lowercased haystack
    let mut emitted = 0; // byte position in the original text

    while let Some(found) = haystack[cursor..].find(&needle) {
        let start = cursor + found;
        let end = start + needle.len();

        let match_start = origin[start];
        // widen to the end of the char that produced the last matched byte
        let mut after = end;
        while after < haystack.len() && origin[after] == origin[end - 1] {
            after += 1;
        }
        let match_end = origin[after];

        if match_start > emitted {
            segments.push((text[emitted..match_start].to_string(), false));
        }
        segments.push((text[match_start..match_end].to_string(), true));
        emitted = match_end;
        cursor = after;
    }

    if emitted < text.len() {
        segments.push((text[emitted..].to_string(), false));
    }

    segments
}

#[component]
fn HighlightedText<'a>(
    #[prop(into)] text: Cow<'a, str>,
    #[prop(into)] search_term: String,
    #[prop(optional)] class: &'static str,
) -> impl IntoView {
    let segments = highlight_segments(&text, &search_term);

    view! {
        <span class=class>
            {segments
                .into_iter()
                .map(|(segment, is_match)| {
                    if is_match {
                        view! {
                            <mark class="bg-mint-400 dark:bg-mint-900 text-seafoam-900 dark:text-seafoam-200 rounded px-0.5">
                                {segment}
                            </mark>
                        }
                            .into_any()
                    } else {
                        view! { <span>{segment}</span> }.into_any()
                    }
                })
                .collect_view()}
        </span>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_reveal_caps_at_page_size() {
        assert_eq!(initial_reveal(0), 0);
        assert_eq!(initial_reveal(7), 7);
        assert_eq!(initial_reveal(20), 20);
        assert_eq!(initial_reveal(45), 20);
    }

    #[test]
    fn load_more_walks_to_the_list_length_then_stops() {
        // L = 45: reveals 20, 40, 45 over two clicks, then the control hides
        let total = 45;
        let mut reveal = initial_reveal(total);
        assert_eq!(reveal, 20);
        assert!(reveal < total);

        reveal = next_reveal(reveal, total);
        assert_eq!(reveal, 40);
        assert!(reveal < total);

        reveal = next_reveal(reveal, total);
        assert_eq!(reveal, 45);
        assert!(reveal >= total);

        // further clicks are a no-op
        assert_eq!(next_reveal(reveal, total), 45);
    }

    #[test]
    fn short_lists_never_show_load_more() {
        let total = 12;
        let reveal = initial_reveal(total);
        assert_eq!(reveal, 12);
        assert!(reveal >= total);
    }

    #[test]
    fn highlight_segments_preserve_original_casing() {
        let segments = highlight_segments("Storm Warning: storm ahead", "storm");
        assert_eq!(
            segments,
            vec![
                ("Storm".to_string(), true),
                (" Warning: ".to_string(), false),
                ("storm".to_string(), true),
                (" ahead".to_string(), false),
            ]
        );
    }

    #[test]
    fn highlight_segments_without_term_is_one_plain_segment() {
        assert_eq!(
            highlight_segments("Market rally", ""),
            vec![("Market rally".to_string(), false)]
        );
        assert_eq!(
            highlight_segments("Market rally", "storm"),
            vec![("Market rally".to_string(), false)]
        );
    }

    #[test]
    fn highlight_survives_case_folding_that_changes_byte_length() {
        // dotted capital I lowercases to two chars; match offsets must map
        // back onto the original text without splitting a char boundary
        let segments = highlight_segments("\u{130}stanbul wins", "i");
        assert_eq!(
            segments,
            vec![
                ("\u{130}".to_string(), true),
                ("stanbul w".to_string(), false),
                ("i".to_string(), true),
                ("ns".to_string(), false),
            ]
        );
        let joined: String = segments.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(joined, "\u{130}stanbul wins");
    }

    #[test]
    fn stale_load_response_is_discarded_after_a_newer_load() {
        let mut seq = LoadSequence::default();
        let older = seq.begin();
        let newer = seq.begin();
        assert!(seq.is_current(newer));
        assert!(!seq.is_current(older));

        let third = seq.begin();
        assert!(seq.is_current(third));
        assert!(!seq.is_current(newer));
    }

    #[test]
    fn visible_slice_is_reveal_window_then_filter() {
        // filtering narrows the revealed slice; it never widens the window
        let mut list = Vec::new();
        for i in 0..30 {
            list.push(Article {
                title: Some(if i % 2 == 0 {
                    format!("storm {}", i)
                } else {
                    format!("rally {}", i)
                }),
                ..Default::default()
            });
        }

        let reveal = initial_reveal(list.len());
        let shown = &list[..reveal.min(list.len())];
        let visible: Vec<_> = shown.iter().filter(|a| a.matches("storm", "")).collect();

        // 10 of the first 20 are storms; the storms beyond the window stay hidden
        assert_eq!(visible.len(), 10);
        assert!(visible
            .iter()
            .all(|a| a.title_text().starts_with("storm")));
    }

    #[test]
    fn rendering_is_filter_stable() {
        // the same list and filter state always produce the same visible set
        let list = vec![
            Article {
                title: Some("Storm warning".into()),
                ..Default::default()
            },
            Article {
                title: Some("Market rally".into()),
                ..Default::default()
            },
        ];
        let pass = |list: &[Article]| -> Vec<String> {
            list[..initial_reveal(list.len())]
                .iter()
                .filter(|a| a.matches("storm", ""))
                .map(|a| a.title_text().to_string())
                .collect()
        };
        assert_eq!(pass(&list), pass(&list));
        assert_eq!(pass(&list), vec!["Storm warning".to_string()]);
    }
}
