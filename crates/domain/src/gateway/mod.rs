//! Port describing how the store reaches the service registry backend.

mod traits;

pub use traits::*;
