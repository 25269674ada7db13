pub mod article;

pub use article::{time_ago, Article, LatestResponse, RecommendResponse, RefreshAck};
