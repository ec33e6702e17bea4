//! Desktop do-not-disturb control
//!
//! Flips the platform notification service into or out of do-not-disturb.
//! Best effort by design: the caller only learns whether some mechanism
//! acknowledged the change.
//!
//! Platform mechanisms:
//! - Linux: notification daemons in order (swaync, mako, dunst, hyprctl),
//!   then GNOME/KDE settings keyed off `XDG_CURRENT_DESKTOP`
//! - macOS: NotificationCenter preferences plus a restart of the agent
//! - Windows: Focus Assist registry value via PowerShell

use std::process::Command;
use tracing::{debug, warn};

/// Toggle do-not-disturb, reporting whether any mechanism took the change
pub fn set_do_not_disturb(enabled: bool) -> bool {
    #[cfg(target_os = "linux")]
    {
        set_linux(enabled)
    }

    #[cfg(target_os = "macos")]
    {
        set_macos(enabled)
    }

    #[cfg(target_os = "windows")]
    {
        set_windows(enabled)
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        let _ = enabled;
        warn!("Do-not-disturb is not supported on this platform");
        false
    }
}

#[cfg(target_os = "linux")]
fn set_linux(enabled: bool) -> bool {
    // First daemon that acknowledges wins; a missing binary just moves
    // the probe along
    let daemons: &[(&str, &[&str])] = if enabled {
        &[
            ("swaync-client", &["-dn"]),
            ("makoctl", &["mode", "-a", "do-not-disturb"]),
            ("dunstctl", &["set-paused", "true"]),
            ("hyprctl", &["dispatch", "notify", "2", "Do Not Disturb Enabled"]),
        ]
    } else {
        &[
            ("swaync-client", &["-df"]),
            ("makoctl", &["mode", "-r", "do-not-disturb"]),
            ("dunstctl", &["set-paused", "false"]),
            ("hyprctl", &["dispatch", "notify", "2", "Do Not Disturb Disabled"]),
        ]
    };

    for (daemon, args) in daemons {
        if run(daemon, args) {
            debug!(daemon, enabled, "Do-not-disturb toggled");
            return true;
        }
    }

    let desktop = std::env::var("XDG_CURRENT_DESKTOP").unwrap_or_default();

    if desktop.contains("GNOME") {
        let banners = if enabled { "false" } else { "true" };
        let args = ["set", "org.gnome.desktop.notifications", "show-banners", banners];
        if run("gsettings", &args) {
            debug!(enabled, "Do-not-disturb toggled via GNOME settings");
            return true;
        }
    }

    if desktop.contains("KDE") {
        let script = if enabled {
            "dndManager.enabled=true"
        } else {
            "dndManager.enabled=false"
        };
        let args = [
            "org.kde.plasmashell",
            "/PlasmaShell",
            "org.kde.PlasmaShell.evaluateScript",
            script,
        ];
        if run("qdbus", &args) {
            debug!(enabled, "Do-not-disturb toggled via KDE script");
            return true;
        }
    }

    warn!("Could not detect a notification daemon to toggle do-not-disturb");
    false
}

#[cfg(target_os = "macos")]
fn set_macos(enabled: bool) -> bool {
    let Some(home) = dirs::home_dir() else {
        warn!("Home directory not found, cannot toggle do-not-disturb");
        return false;
    };
    let plist = home.join("Library/Preferences/ByHost/com.apple.notificationcenterui");
    let flag = if enabled { "true" } else { "false" };

    let wrote = Command::new("defaults")
        .args(["-currentHost", "write"])
        .arg(&plist)
        .args(["doNotDisturb", "-boolean", flag])
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false);

    if !wrote {
        warn!("Failed to write NotificationCenter preferences");
        return false;
    }

    // NotificationCenter only picks up the preference after a restart
    run("killall", &["NotificationCenter"])
}

#[cfg(target_os = "windows")]
fn set_windows(enabled: bool) -> bool {
    let script = if enabled {
        "New-ItemProperty -Path 'HKCU:\\Software\\Microsoft\\Windows\\CurrentVersion\\FocusAssist' \
         -Name 'FocusAssist' -Value 2 -PropertyType DWord -Force"
    } else {
        "Set-ItemProperty -Path 'HKCU:\\Software\\Microsoft\\Windows\\CurrentVersion\\FocusAssist' \
         -Name 'FocusAssist' -Value 0"
    };
    run("powershell", &["-Command", script])
}

fn run(program: &str, args: &[&str]) -> bool {
    match Command::new(program).args(args).output() {
        Ok(output) => output.status.success(),
        Err(e) => {
            debug!(program, error = %e, "Command unavailable");
            false
        }
    }
}
