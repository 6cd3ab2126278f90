//! Floodgate - In-Process Request Throttling
//!
//! This crate implements a fixed-window request throttle for services that
//! need to cap how often a caller may hit a class of endpoints. Decisions
//! are made against an in-memory store of per-identifier window counters,
//! and a periodic sweeper removes expired windows to bound memory growth.
//!
//! The store is process-local: each process enforces its own limits. A
//! horizontally scaled deployment that needs a single global limit must
//! place a shared counter store behind [`throttle::ThrottleBackend`].

pub mod config;
pub mod error;
pub mod ip;
pub mod throttle;
