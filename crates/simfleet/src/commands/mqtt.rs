//! Bus command handlers: publish, message buffer, live tail.

use chrono::DateTime;
use tabled::Tabled;

use simfleet_core::{Command as CoreCommand, InboundMessage, PanelController};

use crate::cli::{GlobalOpts, MqttArgs, MqttCommand};
use crate::error::CliError;
use crate::output;

use super::{oneshot, panel_config};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct MessageRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Topic")]
    topic: String,
    #[tabled(rename = "Payload")]
    payload: String,
}

impl From<&InboundMessage> for MessageRow {
    fn from(m: &InboundMessage) -> Self {
        Self {
            time: format_timestamp(m.timestamp),
            topic: m.topic.clone(),
            payload: m.payload_text(),
        }
    }
}

/// Render unix seconds as a local wall-clock time.
pub(crate) fn format_timestamp(unix_secs: i64) -> String {
    DateTime::from_timestamp(unix_secs, 0)
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| unix_secs.to_string())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: MqttArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        MqttCommand::Publish { topic, payload } => {
            oneshot(global, |ctrl| async move {
                ctrl.execute(CoreCommand::Publish { topic, payload }).await
            })
            .await?;
            if !global.quiet {
                eprintln!("Message published");
            }
            Ok(())
        }

        MqttCommand::Messages => {
            let messages = oneshot(global, |ctrl| async move {
                ctrl.refresh_listener().await?;
                Ok(ctrl.listener_messages())
            })
            .await?;

            // Newest first, like the panel's sidebar.
            let mut messages: Vec<InboundMessage> = messages.as_ref().clone();
            messages.reverse();

            let out = output::render_list(
                &global.output,
                &messages,
                |m| MessageRow::from(m),
                |m| format!("{} {}", m.topic, m.payload_text()),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MqttCommand::Clear => {
            oneshot(global, |ctrl| async move { ctrl.clear_listener().await }).await?;
            if !global.quiet {
                eprintln!("Listener messages cleared");
            }
            Ok(())
        }

        MqttCommand::Listen { topic } => listen(topic, global).await,
    }
}

/// Tail listener messages live until Ctrl-C, optionally holding a
/// subscription for the duration.
async fn listen(topic: Option<String>, global: &GlobalOpts) -> Result<(), CliError> {
    let config = panel_config(global)?;
    let controller = PanelController::new(config)?;
    controller.start().await.map_err(CliError::from)?;

    if let Some(ref topic) = topic {
        controller.subscribe(topic).await?;
        if !global.quiet {
            eprintln!("Subscribed to '{topic}' -- Ctrl-C to stop");
        }
    } else if !global.quiet {
        eprintln!("Tailing listener messages -- Ctrl-C to stop");
    }

    // Opening the panel starts the poll task; messages flow through the
    // watch channel regardless of whether WE hold the subscription.
    controller.set_listener_panel_open(true).await;
    let mut rx = controller.subscribe_listener_messages();

    let mut last_seen: i64 = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                for message in snapshot.iter().filter(|m| m.timestamp > last_seen) {
                    println!(
                        "[{}] {}: {}",
                        format_timestamp(message.timestamp),
                        message.topic,
                        message.payload_text()
                    );
                }
                if let Some(newest) = snapshot.iter().map(|m| m.timestamp).max() {
                    last_seen = newest;
                }
            }
        }
    }

    controller.set_listener_panel_open(false).await;
    if topic.is_some() {
        // Best-effort; the server cleans up stale subscriptions anyway.
        let _ = controller.unsubscribe().await;
    }
    controller.shutdown().await;
    Ok(())
}
