//! Desktop autostart registration
//!
//! Registers vigild with the XDG autostart mechanism by writing a .desktop
//! entry under the user's autostart directory.

use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

const DESKTOP_FILE: &str = "vigild.desktop";

/// The user's XDG autostart directory, if a config dir exists
pub fn autostart_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("autostart"))
}

/// Apply the autostart setting using the default autostart directory.
///
/// `exec` is the command line the session should run at login.
pub fn apply_autostart(enabled: bool, exec: &str) -> io::Result<()> {
    let dir = autostart_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "No user config directory")
    })?;

    if enabled {
        register(&dir, exec)
    } else {
        unregister(&dir)
    }
}

/// Write the autostart entry into `dir`
pub fn register(dir: &Path, exec: &str) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;

    let content = format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=vigild\n\
         Comment=Attentiveness monitor daemon\n\
         Exec={exec}\n\
         Hidden=false\n\
         X-GNOME-Autostart-enabled=true\n"
    );

    let path = dir.join(DESKTOP_FILE);
    std::fs::write(&path, content)?;
    info!(path = %path.display(), "Autostart entry registered");
    Ok(())
}

/// Remove the autostart entry from `dir`, if present
pub fn unregister(dir: &Path) -> io::Result<()> {
    let path = dir.join(DESKTOP_FILE);
    match std::fs::remove_file(&path) {
        Ok(()) => {
            info!(path = %path.display(), "Autostart entry removed");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Whether an autostart entry is currently registered in `dir`
pub fn is_registered(dir: &Path) -> bool {
    dir.join(DESKTOP_FILE).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_unregister() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("autostart");

        assert!(!is_registered(&dir));

        register(&dir, "/usr/bin/vigild").unwrap();
        assert!(is_registered(&dir));

        let content = std::fs::read_to_string(dir.join(DESKTOP_FILE)).unwrap();
        assert!(content.contains("Exec=/usr/bin/vigild"));
        assert!(content.contains("Type=Application"));

        unregister(&dir).unwrap();
        assert!(!is_registered(&dir));
    }

    #[test]
    fn unregister_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("autostart");
        std::fs::create_dir_all(&dir).unwrap();

        unregister(&dir).unwrap();
        unregister(&dir).unwrap();
    }
}
