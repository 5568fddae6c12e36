use crate::domain::events::SystemEvent;
use crate::domain::ports::event_bus::EventBus;
use std::sync::Arc;
use tokio_stream::StreamExt;

/// Turns lifecycle events into Prometheus counters.
pub async fn run_metrics_listener(event_bus: Arc<dyn EventBus>) {
    tracing::info!("Metrics listener started");

    let mut receiver = event_bus.subscribe();

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(event) => record(&event),
            Err(e) => tracing::warn!("Metrics listener lagged: {}", e),
        }
    }

    tracing::info!("Metrics listener stopped");
}

pub fn record(event: &SystemEvent) {
    tracing::debug!("Metrics listener received {}", event.name());

    match event {
        SystemEvent::LeadCreated { .. } => {
            metrics::counter!("leads_created_total").increment(1);
        }
        SystemEvent::LeadStatusChanged { new_status, .. } => {
            metrics::counter!("lead_transitions_total", "to" => new_status.as_str()).increment(1);
        }
        SystemEvent::LeadReassigned { .. } => {
            metrics::counter!("leads_reassigned_total").increment(1);
        }
        SystemEvent::LeadFlagged { .. } => {
            metrics::counter!("leads_flagged_total").increment(1);
        }
        SystemEvent::SlotClaimed { claimed, .. } => {
            let outcome = if *claimed { "claimed" } else { "none_free" };
            metrics::counter!("slot_claims_total", "outcome" => outcome).increment(1);
        }
        SystemEvent::ProfessionalRated { given, .. } => {
            metrics::counter!("ratings_total", "stars" => given.to_string()).increment(1);
        }
        SystemEvent::NotificationFailed { .. } => {
            metrics::counter!("gateway_failures_total").increment(1);
        }
    }
}
