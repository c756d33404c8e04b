//! Stats command handler.

use serde::Serialize;

use simfleet_core::{BrokerStats, FleetStats};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::oneshot;

/// Combined server counters + locally derived aggregates.
#[derive(Debug, Serialize)]
struct StatsView {
    broker: Option<BrokerStats>,
    cached_total: usize,
    cached_running: usize,
}

fn detail(view: &StatsView) -> String {
    let mut lines = Vec::new();
    match view.broker {
        Some(broker) => {
            lines.push(format!(
                "Broker:  {}",
                if broker.mqtt_connected {
                    "connected"
                } else {
                    "disconnected"
                }
            ));
            lines.push(format!("Total:   {}", broker.total_devices));
            lines.push(format!("Running: {}", broker.running_devices));
        }
        None => lines.push("Broker:  (stats unavailable)".into()),
    }
    lines.push(format!(
        "Cache:   {} devices, {} running",
        view.cached_total, view.cached_running
    ));
    lines.join("\n")
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let (broker, fleet) = oneshot(global, |ctrl| async move {
        let fleet: FleetStats = ctrl.fleet_stats();
        Ok((ctrl.registry().broker_stats(), fleet))
    })
    .await?;

    let view = StatsView {
        broker,
        cached_total: fleet.total,
        cached_running: fleet.running,
    };

    let out = output::render_single(&global.output, &view, detail, |v| {
        format!("{} {}", v.cached_total, v.cached_running)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
