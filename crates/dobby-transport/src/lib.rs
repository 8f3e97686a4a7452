pub mod error;
pub mod event;
pub mod transport;

pub use error::TransportError;
pub use event::{EventKind, InboundEvent};
pub use transport::Transport;
