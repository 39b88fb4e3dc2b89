//! XDG Base Directory paths for zlbb.
//!
//! Archive checkouts and configuration live under XDG paths on every
//! platform, the same way CLI tools like gh or kubectl lay things out.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "zlbb";

/// Get the zlbb config directory.
///
/// Returns `$XDG_CONFIG_HOME/zlbb` if set, otherwise `~/.config/zlbb`.
/// Archive configuration files are looked up here.
///
/// # Examples
///
/// ```
/// use zlbb_paths::config_dir;
///
/// let config = config_dir();
/// let archive_toml = config.join("archive.toml");
/// ```
pub fn config_dir() -> PathBuf {
    resolve(
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        dirs::home_dir(),
        ".config",
    )
}

/// Get the zlbb data directory.
///
/// Returns `$XDG_DATA_HOME/zlbb` if set, otherwise `~/.local/share/zlbb`.
/// Leaderboard repository checkouts are cloned below this directory.
///
/// # Examples
///
/// ```
/// use zlbb_paths::data_dir;
///
/// let data = data_dir();
/// let checkout = data.join("infinifactory");
/// ```
pub fn data_dir() -> PathBuf {
    resolve(
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        dirs::home_dir(),
        ".local/share",
    )
}

/// Default checkout directory for the leaderboard repository of one game.
pub fn checkout_dir(game_id: &str) -> PathBuf {
    data_dir().join(game_id)
}

fn resolve(xdg: Option<PathBuf>, home: Option<PathBuf>, fallback: impl AsRef<Path>) -> PathBuf {
    match (xdg, home) {
        (Some(xdg), _) if !xdg.as_os_str().is_empty() => xdg.join(APP_DIR),
        (_, Some(home)) => home.join(fallback).join(APP_DIR),
        _ => fallback.as_ref().join(APP_DIR),
    }
}
