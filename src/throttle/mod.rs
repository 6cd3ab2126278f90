//! Request throttling logic and state management.

mod backend;
mod entry;
mod limiter;
mod policies;
mod sweeper;

pub use backend::ThrottleBackend;
pub use entry::WindowEntry;
pub use limiter::{Decision, RequestThrottle};
pub use policies::{Policy, PolicyStore, PolicyTable};
pub use sweeper::{Sweeper, DEFAULT_SWEEP_INTERVAL};
