pub mod exposition;
mod scrape_server;

pub use scrape_server::{router, HealthResponse, ScrapeServer, ScrapeState};
