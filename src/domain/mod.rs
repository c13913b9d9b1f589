//! Domain Layer
//!
//! Backend status types, the status parser, the metric registry and the
//! outbound ports the application layer depends on.

pub mod entities;
pub mod metrics;
pub mod ports;
pub mod services;
