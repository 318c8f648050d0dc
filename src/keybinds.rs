//! The generated user keybinds file and its hyprland.conf source hook.
//!
//! The keybinds file is user territory once written: an existing file is
//! never touched on re-run, and the source directive is only appended when
//! absent so repeated installs leave a single line.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::logfile::LogFile;
use crate::paths;
use crate::steps::RunContext;
use crate::ui;

pub const SOURCE_LINE: &str = "source = ~/.config/hypr/keybinds.conf";

const KEYBINDS: &str = r#"# Caelestia User Keybinds
# Edit this file to customize your keybindings
# This file is sourced by the main hyprland.conf

$mainMod = SUPER

# Applications
bind = $mainMod, Return, exec, foot
bind = $mainMod, Space, exec, quickshell -c caelestia launcher
bind = $mainMod, E, exec, foot -e yazi
bind = $mainMod, B, exec, firefox

# Window management
bind = $mainMod, W, killactive
bind = $mainMod, F, fullscreen
bind = $mainMod, T, togglefloating
bind = $mainMod, P, pseudo
bind = $mainMod, J, togglesplit

# Focus
bind = $mainMod, left, movefocus, l
bind = $mainMod, right, movefocus, r
bind = $mainMod, up, movefocus, u
bind = $mainMod, down, movefocus, d

bind = $mainMod, H, movefocus, l
# bind = $mainMod, L, movefocus, r # Removed to allow Super+L for locking
bind = $mainMod, K, movefocus, u
bind = $mainMod, J, movefocus, d

# Move windows
bind = $mainMod SHIFT, left, movewindow, l
bind = $mainMod SHIFT, right, movewindow, r
bind = $mainMod SHIFT, up, movewindow, u
bind = $mainMod SHIFT, down, movewindow, d

bind = $mainMod SHIFT, H, movewindow, l
bind = $mainMod SHIFT, L, movewindow, r
bind = $mainMod SHIFT, K, movewindow, u
bind = $mainMod SHIFT, J, movewindow, d

# Resize windows
bind = $mainMod CTRL, left, resizeactive, -20 0
bind = $mainMod CTRL, right, resizeactive, 20 0
bind = $mainMod CTRL, up, resizeactive, 0 -20
bind = $mainMod CTRL, down, resizeactive, 0 20

# Workspaces
bind = $mainMod, 1, workspace, 1
bind = $mainMod, 2, workspace, 2
bind = $mainMod, 3, workspace, 3
bind = $mainMod, 4, workspace, 4
bind = $mainMod, 5, workspace, 5
bind = $mainMod, 6, workspace, 6
bind = $mainMod, 7, workspace, 7
bind = $mainMod, 8, workspace, 8
bind = $mainMod, 9, workspace, 9
bind = $mainMod, 0, workspace, 10

# Move to workspace
bind = $mainMod SHIFT, 1, movetoworkspace, 1
bind = $mainMod SHIFT, 2, movetoworkspace, 2
bind = $mainMod SHIFT, 3, movetoworkspace, 3
bind = $mainMod SHIFT, 4, movetoworkspace, 4
bind = $mainMod SHIFT, 5, movetoworkspace, 5
bind = $mainMod SHIFT, 6, movetoworkspace, 6
bind = $mainMod SHIFT, 7, movetoworkspace, 7
bind = $mainMod SHIFT, 8, movetoworkspace, 8
bind = $mainMod SHIFT, 9, movetoworkspace, 9
bind = $mainMod SHIFT, 0, movetoworkspace, 10

# Scroll through workspaces
bind = $mainMod, mouse_down, workspace, e+1
bind = $mainMod, mouse_up, workspace, e-1

# Mouse bindings
bindm = $mainMod, mouse:272, movewindow
bindm = $mainMod, mouse:273, resizewindow

# Media keys
bind = , XF86AudioRaiseVolume, exec, pamixer -i 5
bind = , XF86AudioLowerVolume, exec, pamixer -d 5
bind = , XF86AudioMute, exec, pamixer -t
bind = , XF86AudioMicMute, exec, pamixer --default-source -t
bind = , XF86MonBrightnessUp, exec, brightnessctl set +5%
bind = , XF86MonBrightnessDown, exec, brightnessctl set 5%-
bind = , XF86AudioPlay, exec, playerctl play-pause
bind = , XF86AudioNext, exec, playerctl next
bind = , XF86AudioPrev, exec, playerctl previous

# Screenshot
bind = , Print, exec, grim -g "$(slurp)" - | swappy -f -
bind = SHIFT, Print, exec, grim - | swappy -f -

# Lock screen
bind = $mainMod, L, exec, hyprlock

# Exit Hyprland
bind = $mainMod SHIFT, E, exit

# Gestures (v0.51+)
gesture = 3, horizontal, workspace
"#;

pub fn install(ctx: &mut RunContext) -> Result<()> {
    let hypr_dir = paths::hypr_dir()?;

    if ctx.opts.dry_run {
        ui::info("Would write keybinds.conf and source it from hyprland.conf");
        return Ok(());
    }

    write_keybinds(&mut ctx.log, &hypr_dir)?;
    append_source_line(&mut ctx.log, &hypr_dir)?;
    Ok(())
}

fn write_keybinds(log: &mut LogFile, hypr_dir: &Path) -> Result<()> {
    fs::create_dir_all(hypr_dir)?;

    let path = hypr_dir.join("keybinds.conf");
    if path.exists() {
        ui::warn("keybinds.conf already exists, keeping it");
        return Ok(());
    }

    fs::write(&path, KEYBINDS)?;
    ui::success("Created keybinds.conf");
    log.line("Created user keybinds file");
    Ok(())
}

/// Hook the keybinds file into hyprland.conf. Nothing to do when the main
/// config is absent or already sources it.
fn append_source_line(log: &mut LogFile, hypr_dir: &Path) -> Result<()> {
    let hyprland_conf = hypr_dir.join("hyprland.conf");
    if !hyprland_conf.exists() {
        return Ok(());
    }

    let content = fs::read_to_string(&hyprland_conf)?;
    if content.contains(SOURCE_LINE) {
        return Ok(());
    }

    fs::write(
        &hyprland_conf,
        format!("{content}\n\n# User keybinds\n{SOURCE_LINE}\n"),
    )?;
    ui::success("Added keybinds source to hyprland.conf");
    log.line("Added source line to hyprland.conf");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_log(tmp: &TempDir) -> LogFile {
        LogFile::at(&tmp.path().join("install.log")).unwrap()
    }

    #[test]
    fn test_writes_keybinds_when_missing() {
        let tmp = TempDir::new().unwrap();
        let hypr = tmp.path().join("hypr");
        let mut log = test_log(&tmp);

        write_keybinds(&mut log, &hypr).unwrap();

        let content = fs::read_to_string(hypr.join("keybinds.conf")).unwrap();
        assert!(content.starts_with("# Caelestia User Keybinds"));
        assert!(content.contains("$mainMod = SUPER"));
        assert!(content.contains("gesture = 3, horizontal, workspace"));
    }

    #[test]
    fn test_existing_keybinds_preserved() {
        let tmp = TempDir::new().unwrap();
        let hypr = tmp.path().join("hypr");
        fs::create_dir_all(&hypr).unwrap();
        fs::write(hypr.join("keybinds.conf"), "# my own binds\n").unwrap();
        let mut log = test_log(&tmp);

        write_keybinds(&mut log, &hypr).unwrap();

        let content = fs::read_to_string(hypr.join("keybinds.conf")).unwrap();
        assert_eq!(content, "# my own binds\n");
    }

    #[test]
    fn test_source_line_appended_once() {
        let tmp = TempDir::new().unwrap();
        let hypr = tmp.path().join("hypr");
        fs::create_dir_all(&hypr).unwrap();
        fs::write(hypr.join("hyprland.conf"), "monitor = ,preferred,auto,1\n").unwrap();
        let mut log = test_log(&tmp);

        append_source_line(&mut log, &hypr).unwrap();
        append_source_line(&mut log, &hypr).unwrap();

        let content = fs::read_to_string(hypr.join("hyprland.conf")).unwrap();
        assert_eq!(content.matches(SOURCE_LINE).count(), 1);
        assert!(content.starts_with("monitor = ,preferred,auto,1\n"));
    }

    #[test]
    fn test_source_line_skips_missing_config() {
        let tmp = TempDir::new().unwrap();
        let hypr = tmp.path().join("hypr");
        fs::create_dir_all(&hypr).unwrap();
        let mut log = test_log(&tmp);

        append_source_line(&mut log, &hypr).unwrap();
        assert!(!hypr.join("hyprland.conf").exists());
    }
}
