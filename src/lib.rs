mod diseases;
mod routes;
mod server;
mod storage;

pub mod app;
pub mod config;
pub mod inference;
pub mod model;
pub mod preprocess;
pub mod provider;

pub use app::start_app;
