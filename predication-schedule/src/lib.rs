//! Captain scheduling for preaching outings.
//!
//! The core is [`schedule::resolve`]: given a date and a time slot it picks the outing
//! captain, honouring fixed weekly assignments first and then rotating (or picking at
//! random) over the captains available on that weekday.

pub mod config;
pub mod display;
pub mod error;
pub mod form;
pub mod parser;
pub mod schedule;
pub mod web;

pub use error::{Result, ScheduleError};
