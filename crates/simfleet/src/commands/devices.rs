//! Device command handlers.

use std::sync::Arc;

use tabled::Tabled;

use simfleet_core::{
    Command as CoreCommand, CommandResult, Device, DeviceForm, ParamForm, ParamKind,
};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{confirm, oneshot};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Topic")]
    topic: String,
    #[tabled(rename = "Interval")]
    interval: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Params")]
    params: usize,
}

impl From<&Arc<Device>> for DeviceRow {
    fn from(d: &Arc<Device>) -> Self {
        Self {
            uuid: d.uuid.clone(),
            name: d.name.clone(),
            status: d.status.to_string(),
            topic: d.publish_topic.clone(),
            interval: format!("{}ms", d.interval_ms),
            mode: d.mode.to_string(),
            params: d.params.len(),
        }
    }
}

fn detail(d: &Device) -> String {
    let mut lines = vec![
        format!("UUID:      {}", d.uuid),
        format!("Name:      {}", d.name),
        format!("Status:    {}", d.status),
        format!("Mode:      {}", d.mode),
        format!("Topic:     {}", d.publish_topic),
        format!(
            "Subscribe: {}",
            d.subscribe_topic.as_deref().unwrap_or("-")
        ),
        format!("Interval:  {}ms", d.interval_ms),
        format!("QoS:       {}  retain: {}", d.qos, d.retain),
    ];
    if let Some(ref path) = d.csv_file_path {
        lines.push(format!("CSV:       {path} (loop: {})", d.csv_loop));
    }
    if !d.params.is_empty() {
        lines.push("Params:".into());
        for p in &d.params {
            lines.push(format!("  {}", param_summary(p)));
        }
    }
    if !d.messages.is_empty() {
        lines.push("Recent messages:".into());
        for m in &d.messages {
            lines.push(format!(
                "  [{}] {}",
                crate::commands::mqtt::format_timestamp(m.timestamp),
                m.payload_text()
            ));
        }
    }
    lines.join("\n")
}

fn param_summary(p: &simfleet_core::Parameter) -> String {
    match p.kind {
        ParamKind::String => format!(
            "{} (string) = \"{}\"",
            p.param_name,
            p.string_value.as_deref().unwrap_or("")
        ),
        ParamKind::Timestamp => format!("{} (timestamp)", p.param_name),
        _ => format!(
            "{} ({}) range {} - {}",
            p.param_name, p.kind, p.min_val, p.max_val
        ),
    }
}

// ── Parameter spec parsing ──────────────────────────────────────────

/// Parse a `--param` spec into a validated form.
///
/// Formats: `name:int:MIN:MAX`, `name:float:MIN:MAX[:PRECISION]`,
/// `name:bool[:MIN:MAX]`, `name:timestamp`, `name:string:VALUE`.
fn parse_param_spec(spec: &str) -> Result<ParamForm, CliError> {
    let invalid = |reason: String| CliError::Validation {
        field: "param".into(),
        reason,
    };

    let mut fields = spec.splitn(3, ':');
    let name = fields
        .next()
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| invalid(format!("missing name in '{spec}'")))?;
    let kind_str = fields
        .next()
        .ok_or_else(|| invalid(format!("missing type in '{spec}'")))?;
    let rest = fields.next().unwrap_or("");

    let kind = match kind_str {
        "int" => ParamKind::Int,
        "float" => ParamKind::Float,
        "bool" => ParamKind::Bool,
        "timestamp" => ParamKind::Timestamp,
        "string" => ParamKind::String,
        other => {
            return Err(invalid(format!(
                "unknown type '{other}' (expected int, float, bool, timestamp, string)"
            )));
        }
    };

    let mut form = ParamForm {
        name: name.to_owned(),
        kind,
        ..ParamForm::default()
    };

    match kind {
        ParamKind::String => {
            // Everything after "name:string:" is the value, colons included.
            form.string_value = Some(rest.to_owned());
        }
        ParamKind::Timestamp => {}
        _ => {
            let mut bounds = rest.split(':');
            if let Some(min) = bounds.next().filter(|s| !s.is_empty()) {
                form.min_val = min
                    .parse()
                    .map_err(|_| invalid(format!("invalid min '{min}' in '{spec}'")))?;
            }
            if let Some(max) = bounds.next().filter(|s| !s.is_empty()) {
                form.max_val = max
                    .parse()
                    .map_err(|_| invalid(format!("invalid max '{max}' in '{spec}'")))?;
            }
            if let Some(precision) = bounds.next().filter(|s| !s.is_empty()) {
                form.precision = Some(
                    precision
                        .parse()
                        .map_err(|_| invalid(format!("invalid precision '{precision}'")))?,
                );
            }
        }
    }

    Ok(form)
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List => {
            let snap = oneshot(global, |ctrl| async move {
                Ok(ctrl.devices_snapshot())
            })
            .await?;
            let out = output::render_list(
                &global.output,
                &snap,
                |d| DeviceRow::from(d),
                |d| d.uuid.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { uuid } => {
            let device = oneshot(global, |ctrl| async move {
                ctrl.registry()
                    .get(&uuid)
                    .ok_or_else(|| simfleet_core::CoreError::DeviceNotFound { uuid: uuid.clone() })
            })
            .await?;
            let out =
                output::render_single(&global.output, &device, |d| detail(d), |d| d.uuid.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Create {
            name,
            topic,
            subscribe_topic,
            interval_ms,
            params,
        } => {
            let forms = params
                .iter()
                .map(|spec| parse_param_spec(spec))
                .collect::<Result<Vec<_>, _>>()?;

            let form = DeviceForm {
                name,
                publish_topic: topic,
                subscribe_topic,
                interval_ms,
            };

            let created = oneshot(global, |ctrl| async move {
                ctrl.begin_create().await?;
                for param in &forms {
                    ctrl.push_param(param).await?;
                }
                ctrl.submit_device(&form).await
            })
            .await?;

            if !global.quiet {
                eprintln!("Device created: {}", created.uuid);
            }
            Ok(())
        }

        DevicesCommand::Edit {
            uuid,
            name,
            topic,
            subscribe_topic,
            interval_ms,
        } => {
            let updated = oneshot(global, |ctrl| async move {
                let current = ctrl.begin_edit(&uuid).await?;
                let form = DeviceForm {
                    name: name.unwrap_or(current.name),
                    publish_topic: topic.unwrap_or(current.publish_topic),
                    subscribe_topic: subscribe_topic.or(current.subscribe_topic),
                    interval_ms: interval_ms.unwrap_or(current.interval_ms),
                };
                ctrl.submit_device(&form).await
            })
            .await?;

            if !global.quiet {
                eprintln!("Device updated: {}", updated.uuid);
            }
            Ok(())
        }

        DevicesCommand::Delete { uuid } => {
            if !confirm(&format!("Delete device {uuid}?"), global.yes)? {
                return Ok(());
            }
            oneshot(global, |ctrl| async move {
                ctrl.execute(CoreCommand::Delete { uuid }).await
            })
            .await?;
            if !global.quiet {
                eprintln!("Device deleted");
            }
            Ok(())
        }

        DevicesCommand::Start { uuid } => {
            let result = oneshot(global, |ctrl| async move {
                ctrl.execute(CoreCommand::Start { uuid }).await
            })
            .await?;
            if !global.quiet {
                if let CommandResult::Status(status) = result {
                    eprintln!("Device is now {status}");
                }
            }
            Ok(())
        }

        DevicesCommand::Stop { uuid } => {
            let result = oneshot(global, |ctrl| async move {
                ctrl.execute(CoreCommand::Stop { uuid }).await
            })
            .await?;
            if !global.quiet {
                if let CommandResult::Status(status) = result {
                    eprintln!("Device is now {status}");
                }
            }
            Ok(())
        }

        DevicesCommand::StartAll => {
            oneshot(global, |ctrl| async move {
                ctrl.execute(CoreCommand::StartAll).await
            })
            .await?;
            if !global.quiet {
                eprintln!("All devices started");
            }
            Ok(())
        }

        DevicesCommand::StopAll => {
            oneshot(global, |ctrl| async move {
                ctrl.execute(CoreCommand::StopAll).await
            })
            .await?;
            if !global.quiet {
                eprintln!("All devices stopped");
            }
            Ok(())
        }

        DevicesCommand::Duplicate { uuid } => {
            let result = oneshot(global, |ctrl| async move {
                ctrl.execute(CoreCommand::Duplicate { uuid }).await
            })
            .await?;
            if !global.quiet {
                if let CommandResult::Device(copy) = result {
                    eprintln!("Duplicated as {} ({})", copy.name, copy.uuid);
                }
            }
            Ok(())
        }

        DevicesCommand::UploadCsv { uuid, file } => {
            let bytes = std::fs::read(&file)?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.csv".into());

            let result = oneshot(global, |ctrl| async move {
                ctrl.execute(CoreCommand::UploadCsv {
                    uuid,
                    file_name,
                    bytes,
                })
                .await
            })
            .await?;

            if !global.quiet {
                if let CommandResult::CsvStored {
                    file_path: Some(path),
                } = result
                {
                    eprintln!("CSV stored at {path}");
                } else {
                    eprintln!("CSV uploaded");
                }
            }
            Ok(())
        }
    }
}
