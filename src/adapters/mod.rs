// Adapters layer: concrete implementations for external systems (http, html, csv, files).

pub mod csv_io;
pub mod html;
pub mod http;
pub mod sleep;
pub mod state;
pub mod storage;

pub use http::BingImageSearch;
pub use sleep::TokioSleeper;
pub use state::StateStore;
pub use storage::LocalStorage;
