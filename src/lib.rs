//! FlourCraft funnel: a quiz funnel served over HTTP or driven from a terminal.

pub mod analytics;
pub mod channels;
pub mod checkout;
pub mod config;
pub mod error;
pub mod funnel;
pub mod media;
