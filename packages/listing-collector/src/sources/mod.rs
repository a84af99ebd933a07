//! Page source implementations.
//!
//! - `HttpPageSource` - Direct HTTP fetching with user-agent rotation
//! - `MockPageSource` (in [`crate::testing`]) - Scripted pages for tests

pub mod http;

pub use http::HttpPageSource;
