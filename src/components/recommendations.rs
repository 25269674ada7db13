use leptos::prelude::*;

use crate::models::{time_ago, Article};

const TITLE_CLIP: usize = 80;

/// Side panel of recommended articles. Always fully rendered; the feed's
/// reveal pagination does not apply here.
#[component]
pub fn RecommendPanel(
    #[prop(into)] recommendations: Signal<Vec<Article>>,
    #[prop(into)] error: Signal<Option<String>>,
) -> impl IntoView {
    view! {
        <aside class="w-full lg:w-80 shrink-0 space-y-3">
            <h3 class="text-lg font-semibold text-gray-800 dark:text-gray-200">"Recommended"</h3>

            {move || {
                error
                    .get()
                    .map(|err| {
                        view! {
                            <div class="text-sm text-red-600 dark:text-red-400">{err}</div>
                        }
                    })
            }}

            {move || {
                recommendations
                    .get()
                    .into_iter()
                    .map(|article| view! { <RecCard article=article/> })
                    .collect_view()
            }}
        </aside>
    }
}

#[component]
fn RecCard(article: Article) -> impl IntoView {
    let title: String = article.title_text().chars().take(TITLE_CLIP).collect();
    let meta = format!(
        "{} \u{2022} {}",
        article.source_text(),
        time_ago(article.published_at.as_deref().unwrap_or(""))
    );
    let link = article.url.clone().unwrap_or_else(|| "#".to_string());
    let image = article.image_url.clone().unwrap_or_default();

    view! {
        <div class="flex gap-3 items-start bg-white dark:bg-teal-800 border border-gray-200 dark:border-teal-700 rounded-lg p-3">
            <img src=image alt=title.clone() loading="lazy" class="w-16 h-16 object-cover rounded-md shrink-0"/>
            <div class="min-w-0">
                <a
                    href=link
                    target="_blank"
                    rel="noopener noreferrer"
                    class="text-sm text-seafoam-600 dark:text-aqua-400 font-medium hover:underline line-clamp-2"
                >
                    {title}
                </a>
                <div class="text-xs text-gray-500 dark:text-gray-400 mt-1">{meta}</div>
            </div>
        </div>
    }
}
