mod status_transport;

pub use status_transport::{StatusTransport, TransportError};
