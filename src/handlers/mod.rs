mod health;
mod hello;
mod metrics;
mod podcasts;

pub use health::health_handler;
pub use hello::hello_handler;
pub use metrics::metrics_handler;
pub use podcasts::podcasts_handler;
