//! Domain logic for the beacon character status page.
//!
//! Everything in this crate is pure: callers pass in the status buckets,
//! display rules, and the current time, and get derived values back. The
//! API and client crates own all I/O.

pub mod character_config;
pub mod display_rules;
pub mod error;
pub mod music_link;
pub mod status;
pub mod status_fields;
pub mod types;
