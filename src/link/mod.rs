mod backoff;
mod client;
mod error;
mod state;

pub use client::FeedLink;
pub use state::{ConnectionState, LinkHandle, LinkStatus};
