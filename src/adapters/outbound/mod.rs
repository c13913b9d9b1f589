mod ssdb_transport;

pub use ssdb_transport::{encode_request, read_response, SsdbTransport, INFO_REQUEST};
