//! Discovery query engine: composable filters and the liveness policy.
//!
//! A [`DiscoveryQuery`] is a set of independent, optional filters with AND
//! semantics, compiled into [`Predicate`] values that store adapters
//! execute, pushed down to indexed columns where the backend allows and
//! evaluated in process otherwise.

mod liveness;
mod predicate;
mod query;

pub use liveness::{is_alive, liveness_cutoff, liveness_window, LIVENESS_WINDOW_SECS};
pub use predicate::Predicate;
pub use query::DiscoveryQuery;
