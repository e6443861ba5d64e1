//! Shared utilities: IP/prefix helpers.

pub mod ip_utils;

pub use ip_utils::{first_segment, parse_prefix_or_addr, prefix_contains, segment_of};
