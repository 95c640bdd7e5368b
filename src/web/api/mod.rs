pub mod error;
pub mod feed;
