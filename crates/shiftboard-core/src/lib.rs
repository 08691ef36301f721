//! Core types and the shift window and block metrics engine for shiftboard.
//!
//! This crate has no HTTP or database dependencies. The
//! engine is pure computation over [`schedule`] and [`production`] records;
//! [`tracker`] wires it to any [`store::ProductionStore`].

// Native `async fn` in trait impls; the trait itself spells out `Send`.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod metrics;
pub mod production;
pub mod schedule;
pub mod store;
pub mod time;
pub mod tracker;

pub use error::{Error, Result};
