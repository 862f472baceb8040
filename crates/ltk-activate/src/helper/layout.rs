use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;

/// Prefix of the folders imports are staged in.
pub const STAGING_PREFIX: &str = "temp_";

/// On-disk layout of the helper's working data.
///
/// ```text
/// <data_dir>/
///   game_path.txt
///   mods/<composite key>/{WAD,META}/   downloaded skins
///   overlay/
///     installed/<name>/                mods imported by mod-tools
///     installed/temp_<name>/           import in progress
///     sources/<name>                   source path of an installed mod
///     profile/                         built overlay
///     profile.mods                     mods the profile was built from
///     profile.config
///     overlay.pid
///     overlay.status
/// ```
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: Utf8PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn mods_dir(&self) -> Utf8PathBuf {
        self.root.join("mods")
    }

    pub fn overlay_dir(&self) -> Utf8PathBuf {
        self.root.join("overlay")
    }

    pub fn installed_dir(&self) -> Utf8PathBuf {
        self.overlay_dir().join("installed")
    }

    pub fn profile_dir(&self) -> Utf8PathBuf {
        self.overlay_dir().join("profile")
    }

    /// Folder an import writes to before it is moved into place.
    pub fn staging_dir(&self, name: &str) -> Utf8PathBuf {
        self.installed_dir().join(format!("{STAGING_PREFIX}{name}"))
    }

    pub fn sources_dir(&self) -> Utf8PathBuf {
        self.overlay_dir().join("sources")
    }

    pub fn profile_manifest(&self) -> Utf8PathBuf {
        self.overlay_dir().join("profile.mods")
    }

    pub fn profile_config(&self) -> Utf8PathBuf {
        self.overlay_dir().join("profile.config")
    }

    pub fn pid_file(&self) -> Utf8PathBuf {
        self.overlay_dir().join("overlay.pid")
    }

    pub fn status_file(&self) -> Utf8PathBuf {
        self.overlay_dir().join("overlay.status")
    }

    pub fn ensure_overlay_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(self.installed_dir())?;
        fs::create_dir_all(self.sources_dir())?;
        fs::create_dir_all(self.profile_dir())
    }

    /// Source path `name` was installed from, if recorded.
    pub fn installed_source(&self, name: &str) -> Option<Utf8PathBuf> {
        fs::read_to_string(self.sources_dir().join(name))
            .ok()
            .map(|s| Utf8PathBuf::from(s.trim_end()))
    }

    pub fn record_source(&self, name: &str, source: &Utf8Path) {
        if let Err(e) = fs::write(self.sources_dir().join(name), source.as_str()) {
            tracing::warn!("Failed to record source of {}: {}", name, e);
        }
    }

    pub fn forget_source(&self, name: &str) {
        remove_file_logged(&self.sources_dir().join(name));
    }

    /// Installed mod names the current profile was built from.
    pub fn read_profile_manifest(&self) -> Option<Vec<String>> {
        let content = fs::read_to_string(self.profile_manifest()).ok()?;
        Some(content.lines().map(str::to_string).collect())
    }

    pub fn write_profile_manifest(&self, mods: &[String]) {
        if let Err(e) = fs::write(self.profile_manifest(), mods.join("\n")) {
            tracing::warn!("Failed to write profile manifest: {}", e);
        }
    }

    /// Force the next activation to rebuild the profile.
    pub fn clear_profile_manifest(&self) {
        remove_file_logged(&self.profile_manifest());
    }

    /// Remove downloads, imported mods, the built profile and status files.
    ///
    /// Returns the number of entries that could not be removed.
    pub fn clear_caches(&self) -> usize {
        let dirs = [
            self.mods_dir(),
            self.installed_dir(),
            self.sources_dir(),
            self.profile_dir(),
        ];
        let files = [self.pid_file(), self.status_file(), self.profile_manifest()];
        let mut failures = 0;

        for dir in dirs.iter().filter(|d| d.exists()) {
            if let Err(e) = fs::remove_dir_all(dir) {
                tracing::warn!("Failed to clear {}: {}", dir, e);
                failures += 1;
            }
        }
        for file in files.iter().filter(|f| f.exists()) {
            if let Err(e) = fs::remove_file(file) {
                tracing::warn!("Failed to remove {}: {}", file, e);
                failures += 1;
            }
        }
        failures
    }
}

fn remove_file_logged(path: &Utf8Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path, e),
    }
}

/// Overlay state recorded in `overlay.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayStatus {
    /// The profile was built and the overlay is about to start.
    Ready,
    Running,
    Stopped,
}

impl OverlayStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "ready" => Some(Self::Ready),
            "running" => Some(Self::Running),
            "stopped" => Some(Self::Stopped),
            _ => None,
        }
    }

    pub fn read(layout: &DataLayout) -> Option<Self> {
        fs::read_to_string(layout.status_file())
            .ok()
            .and_then(|s| Self::parse(&s))
    }

    pub fn write(self, layout: &DataLayout) {
        if let Err(e) = fs::write(layout.status_file(), self.as_str()) {
            tracing::warn!("Failed to write overlay status: {}", e);
        }
    }
}

/// Does `dir` have both `WAD/` and `META/`, with at least one `.wad.client` under `WAD/`?
pub fn is_extracted_mod(dir: &Utf8Path) -> bool {
    let wad_dir = dir.join("WAD");
    if !wad_dir.is_dir() || !dir.join("META").is_dir() {
        return false;
    }
    let Ok(entries) = fs::read_dir(&wad_dir) else {
        return false;
    };
    entries
        .filter_map(Result::ok)
        .any(|entry| entry.file_name().to_string_lossy().ends_with(".wad.client"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_layout() -> (tempfile::TempDir, DataLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(Utf8Path::from_path(dir.path()).unwrap());
        (dir, layout)
    }

    #[test]
    fn extracted_mod_needs_wad_and_meta() {
        let (_dir, layout) = temp_layout();
        let mod_dir = layout.mods_dir().join("1_101");
        fs::create_dir_all(mod_dir.join("WAD")).unwrap();
        assert!(!is_extracted_mod(&mod_dir));

        fs::create_dir_all(mod_dir.join("META")).unwrap();
        assert!(!is_extracted_mod(&mod_dir));

        fs::create_dir_all(mod_dir.join("WAD").join("Annie.wad.client")).unwrap();
        assert!(is_extracted_mod(&mod_dir));
    }

    #[test]
    fn status_file_round_trip() {
        let (_dir, layout) = temp_layout();
        layout.ensure_overlay_dirs().unwrap();

        assert_eq!(OverlayStatus::read(&layout), None);
        OverlayStatus::Running.write(&layout);
        assert_eq!(OverlayStatus::read(&layout), Some(OverlayStatus::Running));
    }

    #[test]
    fn clear_caches_removes_everything() {
        let (_dir, layout) = temp_layout();
        layout.ensure_overlay_dirs().unwrap();
        fs::create_dir_all(layout.mods_dir().join("1_101")).unwrap();
        OverlayStatus::Stopped.write(&layout);

        assert_eq!(layout.clear_caches(), 0);
        assert!(!layout.mods_dir().exists());
        assert!(!layout.installed_dir().exists());
        assert!(!layout.status_file().exists());
        assert!(!layout.profile_manifest().exists());
        assert!(layout.overlay_dir().exists());
    }

    #[test]
    fn profile_manifest_keeps_order() {
        let (_dir, layout) = temp_layout();
        layout.ensure_overlay_dirs().unwrap();
        assert_eq!(layout.read_profile_manifest(), None);

        let mods = vec!["103_103085".to_string(), "custom_c1".to_string()];
        layout.write_profile_manifest(&mods);
        assert_eq!(layout.read_profile_manifest(), Some(mods));

        layout.clear_profile_manifest();
        layout.clear_profile_manifest();
        assert_eq!(layout.read_profile_manifest(), None);
    }

    #[test]
    fn sources_are_recorded_per_mod() {
        let (_dir, layout) = temp_layout();
        layout.ensure_overlay_dirs().unwrap();

        layout.record_source("custom_c1", Utf8Path::new("/mods/authorA/mod.fantome"));
        assert_eq!(
            layout.installed_source("custom_c1"),
            Some(Utf8PathBuf::from("/mods/authorA/mod.fantome"))
        );
        assert_eq!(layout.installed_source("custom_c2"), None);

        layout.forget_source("custom_c1");
        assert_eq!(layout.installed_source("custom_c1"), None);
    }
}
