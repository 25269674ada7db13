pub mod feed;
pub mod recommendations;
pub mod search;
