//! Human and JSON rendering of a pipeline report.

use {
    console::style,
    std::collections::HashMap,
    ttymount::{PermissionReport, PipelineReport, ProvisionOutcome, UsbDetails},
};

/// Access flags as `rw`, `r-`, `-w` or `--`.
fn access_flags(perms: &PermissionReport) -> String {
    format!(
        "{}{}",
        if perms.readable { 'r' } else { '-' },
        if perms.writable { 'w' } else { '-' }
    )
}

fn ownership(perms: &PermissionReport) -> String {
    let owner = perms
        .owner()
        .map(str::to_string)
        .or_else(|| perms.metadata.as_ref().map(|m| m.uid.to_string()))
        .unwrap_or_else(|| "?".to_string());
    let group = perms
        .group()
        .map(str::to_string)
        .or_else(|| perms.metadata.as_ref().map(|m| m.gid.to_string()))
        .unwrap_or_else(|| "?".to_string());
    format!("{owner}:{group}")
}

fn usb_for<'a>(
    usb: &'a HashMap<String, UsbDetails>,
    path: &std::path::Path,
) -> Option<&'a UsbDetails> {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| usb.get(n))
}

/// Print a summary of the run to stderr.
pub(crate) fn print_summary(report: &PipelineReport, usb: &HashMap<String, UsbDetails>) {
    eprintln!(
        "{}",
        style(format!("Serial devices ({})", report.devices.len()))
            .bold()
            .underlined()
    );

    if report.devices.is_empty() {
        eprintln!("  {}", style("No serial devices found").dim());
    }

    for (device, outcome, perms) in report.entries() {
        let outcome_text = match outcome {
            ProvisionOutcome::Created(_) | ProvisionOutcome::AlreadyPresent => {
                style(outcome.to_string()).green()
            },
            ProvisionOutcome::Skipped => style(outcome.to_string()).dim(),
            _ => style(outcome.to_string()).yellow(),
        };
        let mode = perms
            .mode()
            .map(|m| format!("{m:04o}"))
            .unwrap_or_else(|| "----".to_string());
        let access = if perms.is_accessible() {
            style(access_flags(perms)).green()
        } else {
            style(access_flags(perms)).red()
        };
        let usb_info = usb_for(usb, &device.path)
            .map(|u| format!(" {}", style(u.describe()).dim()))
            .unwrap_or_default();

        eprintln!(
            "  {} [{}] {} {} {} {}{}",
            style(device.path.display()).cyan(),
            style(device.category).yellow(),
            outcome_text,
            mode,
            ownership(perms),
            access,
            usb_info
        );
    }

    eprintln!(
        "{} {}",
        style("DEFAULT_SERIAL_PORT:").bold(),
        report.exported.default_port
    );
}

/// JSON document describing the run.
pub(crate) fn to_json(
    report: &PipelineReport,
    usb: &HashMap<String, UsbDetails>,
) -> serde_json::Value {
    let devices: Vec<serde_json::Value> = report
        .entries()
        .map(|(device, outcome, perms)| {
            let usb = usb_for(usb, &device.path).map(|u| {
                serde_json::json!({
                    "vid": u.vid,
                    "pid": u.pid,
                    "bridge": u.bridge_name(),
                    "manufacturer": u.manufacturer,
                    "product": u.product,
                    "serial": u.serial,
                })
            });
            serde_json::json!({
                "path": device.path.display().to_string(),
                "category": device.category.name(),
                "provision": outcome.label(),
                "provision_detail": outcome.to_string(),
                "mode": perms.mode().map(|m| format!("{m:04o}")),
                "owner": perms.owner(),
                "group": perms.group(),
                "readable": perms.readable,
                "writable": perms.writable,
                "usb": usb,
            })
        })
        .collect();

    serde_json::json!({
        "ok": true,
        "data": {
            "default_port": report.exported.default_port,
            "all_ports": report.exported.all_ports,
            "devices": devices,
        }
    })
}
