//! URL handling module for Sumi-Mirror
//!
//! This module provides canonicalization (the visited-set key) and href
//! resolution with the same-origin scope test.

mod normalize;
mod scope;

pub use normalize::{canonical_key, canonicalize, canonicalize_url, parse_http_url};
pub use scope::{resolve, root_origin, ResolvedLink};
