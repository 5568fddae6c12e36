pub mod metrics;

pub use self::metrics::run_metrics_listener;
