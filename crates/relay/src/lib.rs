//! The input-ordering and fan-out core.
//!
//! [`InputGateway`] validates each action and hands the resulting event to
//! three independent sinks: the [`ledger::Ledger`], the
//! [`ObserverRegistry`] fan-out and the [`Dispatcher`]. Only the dispatcher
//! carries an ordering guarantee.

pub mod dispatcher;
pub mod gateway;
pub mod observers;

pub use dispatcher::{DispatchError, DispatchPolicy, Dispatcher};
pub use gateway::InputGateway;
pub use observers::{ObserverConnection, ObserverId, ObserverRegistry};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
