//! greetd/tuigreet login manager setup.
//!
//! The config file is generated, never merged: a previous greetd config is
//! simply replaced. Unit operations are independent; a failed one is
//! recorded and the rest still run, since a broken greeter only costs the
//! graphical login, not the installed desktop.

use crate::error::{InstallError, Result};
use crate::runner;
use crate::steps::RunContext;
use crate::ui;

pub const GREETD_CONFIG_PATH: &str = "/etc/greetd/config.toml";

const GREETD_CONFIG: &str = r#"[terminal]
vt = 1

[default_session]
command = "tuigreet --time --remember --cmd Hyprland"
user = "greeter"
"#;

pub fn setup(ctx: &mut RunContext) -> Result<()> {
    if !ctx.opts.no_confirm
        && !ui::confirm("Set up greetd/tuigreet as the display manager?", true)
    {
        ui::info("Skipping the greeter setup");
        return Ok(());
    }

    if ctx.opts.dry_run {
        ui::info(&format!("Would write {GREETD_CONFIG_PATH} and enable greetd"));
        return Ok(());
    }

    let before = ctx.issues.len();

    if let Err(e) = write_config(ctx) {
        note(ctx, e);
    }
    if let Err(e) = unit_op(ctx, "disable", "getty@tty1") {
        note(ctx, e);
    }
    if let Err(e) = unit_op(ctx, "enable", "greetd") {
        note(ctx, e);
    }
    if let Err(e) = unit_op(ctx, "set-default", "graphical.target") {
        note(ctx, e);
    }

    if ctx.issues.len() == before {
        ui::success("greetd login manager configured");
        ctx.log.line("greetd service configuration complete");
    }
    Ok(())
}

fn note(ctx: &mut RunContext, e: InstallError) {
    ui::warn(&e.to_string());
    ctx.record_issue("greeter", e.to_string());
}

fn write_config(ctx: &mut RunContext) -> Result<()> {
    ui::info("Writing the greetd configuration...");

    let ok = runner::capture(&mut ctx.log, "sudo", &["mkdir", "-p", "/etc/greetd"])
        .map(|out| out.success())
        .unwrap_or(false)
        && runner::capture_with_stdin(
            &mut ctx.log,
            "sudo",
            &["tee", GREETD_CONFIG_PATH],
            GREETD_CONFIG,
        )
        .map(|out| out.success())
        .unwrap_or(false);

    if !ok {
        return Err(InstallError::ServiceConfigFailed {
            unit: "greetd".to_string(),
            action: "write config for".to_string(),
        });
    }

    ui::success("Wrote the greetd config");
    ctx.log.line("greetd config written");
    Ok(())
}

fn unit_op(ctx: &mut RunContext, action: &str, unit: &str) -> Result<()> {
    let ok = runner::capture(&mut ctx.log, "sudo", &["systemctl", action, unit])
        .map(|out| out.success())
        .unwrap_or(false);

    if !ok {
        return Err(InstallError::ServiceConfigFailed {
            unit: unit.to_string(),
            action: action.to_string(),
        });
    }

    ui::success(&format!("systemctl {action} {unit}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greetd_config_is_valid_toml() {
        let value: toml::Value = toml::from_str(GREETD_CONFIG).unwrap();

        assert_eq!(value["terminal"]["vt"].as_integer(), Some(1));
        assert_eq!(
            value["default_session"]["user"].as_str(),
            Some("greeter")
        );
        let command = value["default_session"]["command"].as_str().unwrap();
        assert!(command.starts_with("tuigreet"));
        assert!(command.contains("--cmd Hyprland"));
    }

    #[test]
    fn test_config_path_is_fixed() {
        assert_eq!(GREETD_CONFIG_PATH, "/etc/greetd/config.toml");
    }

    #[test]
    fn test_service_failures_are_recoverable() {
        let err = InstallError::ServiceConfigFailed {
            unit: "greetd".into(),
            action: "enable".into(),
        };
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "failed to enable greetd");
    }
}
