//! Protocol implementations for expiry resolution.
//!
//! This module contains the outbound collaborators: the WHOIS executor, the
//! registry convention lookup and the zone-listing API client.

/// Registry convention lookup
pub mod registry;

/// WHOIS query execution
pub mod whois;

/// Zone-listing API client
pub mod zones;

// Re-export commonly used functions and types
pub use registry::resolve;
pub use whois::{is_whois_available, WhoisClient, WhoisQuery};
pub use zones::{ZoneClient, ZoneSource};
