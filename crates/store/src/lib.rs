//! Client-side cache of the registry's service records.
//!
//! [`ServiceStore`] mirrors `/api/services` in memory, exposes read
//! projections over it, and reconciles local state with the backend through
//! the domain [`ServiceGateway`](aries_domain::ServiceGateway) port.

mod clear;
mod events;
mod state;
mod store;


pub use events::StoreEvent;
pub use state::{ErrorNotice, StoreSnapshot, UpsertOutcome};
pub use store::{ServiceStore, ADD_FAILED_PREFIX, FETCH_FAILED_PREFIX, UPDATE_FAILED_PREFIX};
