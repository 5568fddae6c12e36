use crate::config::Config;
use metrics::describe_counter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Registry};

const DEFAULT_FILTER: &str = "leaddesk=debug,tower_http=debug";

pub fn init(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;
    init_metrics(config)?;
    Ok(())
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_thread_ids(true)
        .with_target(true);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_FILTER.into());

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn init_metrics(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.metrics_port))
        .install()?;

    describe_counter!("leads_created_total", "Leads opened from conversations");
    describe_counter!("lead_transitions_total", "Lead status transitions by target status");
    describe_counter!("leads_reassigned_total", "Leads moved to another professional by the healer");
    describe_counter!("leads_flagged_total", "Booked leads flagged for operator attention");
    describe_counter!("slot_claims_total", "Slot claim attempts on booking");
    describe_counter!("ratings_total", "Customer ratings applied");
    describe_counter!("gateway_failures_total", "Outbound messages dropped after retries");

    tracing::info!(
        "Metrics exporter (Prometheus) started on port {}",
        config.metrics_port
    );
    Ok(())
}
