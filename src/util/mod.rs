//! Utility functions for common operations.
//!
//! - **URL validation**: backend base URLs and article links before they reach the browser
//! - **Text processing**: Unicode-aware width calculation, truncation and terminal sanitizing
//!
//! # Examples
//!
//! ```
//! use tnews::util::{display_width, truncate_to_width, validate_base_url};
//!
//! let base = validate_base_url("https://tn.thinkingdbx.com").unwrap();
//! assert_eq!(base.as_str(), "https://tn.thinkingdbx.com/");
//!
//! let width = display_width("Hello 世界");
//! assert_eq!(width, 10);
//!
//! let truncated = truncate_to_width("Long article title", 15);
//! assert_eq!(truncated, "Long article...");
//! ```

mod text;
mod url_validator;

pub use text::{display_width, single_line, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_base_url, validate_url_for_open, UrlValidationError};

/// Maximum allowed search query length, enforced while typing.
pub const MAX_SEARCH_QUERY_LENGTH: usize = 256;
