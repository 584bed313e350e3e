//! Shared protocol types for the starchart application.
//!
//! This crate defines the data exchanged between the GitHub fetching core and
//! the rest of the application. None of these types perform I/O.
//!
//! # Overview
//!
//! - [`repository`]: The [`Repository`] snapshot returned by `GET /repos/{name}`
//! - [`star`]: The [`StarEvent`] type and timeline helpers
//! - [`rate`]: The [`RateSnapshot`] returned by `GET /rate_limit`
//!
//! # Examples
//!
//! Building a cumulative timeline from star events:
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use starchart_protocol::{StarEvent, monthly_cumulative, sort_timeline};
//!
//! let mut events = vec![
//!     StarEvent::new(Utc.with_ymd_and_hms(2024, 2, 3, 0, 0, 0).unwrap()),
//!     StarEvent::new(Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap()),
//! ];
//! sort_timeline(&mut events);
//!
//! let months = monthly_cumulative(&events);
//! assert_eq!(months.len(), 2);
//! assert_eq!(months[1].total, 2);
//! ```

pub mod rate;
pub mod repository;
pub mod star;

// Re-export primary types at crate root for convenience
pub use rate::{RateLimitResponse, RateSnapshot};
pub use repository::Repository;
pub use star::{MonthlyStars, StarEvent, is_sorted_timeline, monthly_cumulative, sort_timeline};
