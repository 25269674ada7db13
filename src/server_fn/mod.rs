pub mod cache;
pub mod news;

pub use news::{get_latest, get_recommendations, trigger_refresh};
