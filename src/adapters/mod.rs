//! Adapters
//!
//! Inbound: the HTTP scrape endpoint. Outbound: the SSDB wire transport.

pub mod inbound;
pub mod outbound;
