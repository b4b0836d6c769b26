mod app;
mod config;
mod http;
mod logging;
mod page;

pub use app::run_app;
