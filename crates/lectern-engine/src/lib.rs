//! Scripture corpus reconciliation engine.
//!
//! Treats a remote verse provider as ground truth and brings a persisted
//! corpus to a complete, consistent state:
//!
//! - [`Reconciler`] fills missing base-translation verses chapter by chapter
//!   and corrects cached chapter verse counts.
//! - [`OverlayBuilder`] populates further translations at the addresses the
//!   base translation already defines.
//! - [`Auditor`] reports expected versus actual verse counts without writing.
//!
//! Every outbound fetch goes through one shared [`RateLimiter`] via the
//! [`SourceAdapter`], which also owns retry and response validation. Work is
//! split into independent cells; a failing cell is reported and the run
//! moves on.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod adapter;
pub mod audit;
pub mod cell;
pub mod config;
pub mod error;
pub mod overlay;
pub mod plan;
pub mod rate_limit;
pub mod reconcile;
pub mod summary;

pub use adapter::{FetchFailed, RetryPolicy, SourceAdapter};
pub use audit::Auditor;
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use overlay::OverlayBuilder;
pub use rate_limit::RateLimiter;
pub use reconcile::Reconciler;
pub use summary::{AuditReport, CellError, DeficientChapter, OverlayReport, RunSummary};

#[cfg(test)]
mod testing;
