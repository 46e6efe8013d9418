//! Utility modules supporting the rename pipeline.
//!
//! - [`format_citation`]: Turn a bibliographic record into a citation stem
//! - [`sanitize`]: Replace filesystem-reserved characters in a name
//! - [`HttpClient`]: Shared HTTP client with timeouts
//! - [`RetryConfig`] / [`with_rate_limit_retry`]: Bounded retry on HTTP 429
//! - [`extract_first_page`]: Read the first page of a PDF as plain text
//!
//! # Citation and fallback name
//!
//! ```rust
//! use cite_rename::models::RecordBuilder;
//! use cite_rename::utils::{format_citation, sanitize};
//!
//! let record = RecordBuilder::new()
//!     .author("Tanaka")
//!     .date("2019-05-01")
//!     .title("Study X: a survey")
//!     .journal("J. Foo")
//!     .volume("12")
//!     .pages("1", "10")
//!     .build();
//!
//! let stem = format_citation(&record);
//! assert_eq!(stem, "Tanaka, 2019, 「Study X: a survey」J. Foo12, p.1-10");
//! assert_eq!(sanitize(&stem), "Tanaka, 2019, 「Study X  a survey」J. Foo12, p.1-10");
//! ```

mod cite;
mod http;
mod pdf;
mod retry;
mod sanitize;

pub use cite::format_citation;
pub use http::HttpClient;
pub use pdf::{extract_first_page, PdfExtractError};
pub use retry::{with_rate_limit_retry, RetryConfig};
pub use sanitize::{has_reserved, is_reserved, sanitize, sanitize_with, SanitizeMode, RESERVED_CHARS};
