//! Host connection management
//!
//! Provides the polling channel that carries queued key input to the
//! terminal host and brings screen updates back, over a pluggable
//! request/response transport.

mod backoff;
mod options;
mod poller;
mod queue;
mod transport;

pub use backoff::PollTimings;
pub use options::TransportConfig;
pub use poller::{PollingChannel, SessionInput, SessionObserver};
pub use transport::{normalize_base_url, HttpTransport, Transport};

// These are part of the public API for advanced use cases
#[allow(unused_imports)]
pub use backoff::Backoff;
#[allow(unused_imports)]
pub use poller::PollState;
#[allow(unused_imports)]
pub use queue::InputQueue;
