//! Inspection and upkeep of the on-disk mod cache.

use super::layout::{DataLayout, STAGING_PREFIX};
use camino::Utf8PathBuf;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use walkdir::WalkDir;

/// Cache area an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CacheArea {
    Mods,
    Installed,
    Profile,
}

impl fmt::Display for CacheArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mods => "mods",
            Self::Installed => "installed",
            Self::Profile => "profile",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub area: CacheArea,
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CacheInfo {
    pub root: Utf8PathBuf,
    pub total_size: u64,
    pub entries: Vec<CacheEntry>,
}

/// List the top-level entries of `mods/`, `overlay/installed/` and
/// `overlay/profile/` with their size on disk.
pub fn cache_info(layout: &DataLayout) -> CacheInfo {
    let areas = [
        (CacheArea::Mods, layout.mods_dir()),
        (CacheArea::Installed, layout.installed_dir()),
        (CacheArea::Profile, layout.profile_dir()),
    ];

    let mut info = CacheInfo {
        root: layout.root().to_path_buf(),
        ..Default::default()
    };
    for (area, dir) in areas {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        let mut listed: Vec<CacheEntry> = entries
            .filter_map(Result::ok)
            .map(|entry| CacheEntry {
                area,
                name: entry.file_name().to_string_lossy().into_owned(),
                size: disk_size(&entry.path()),
            })
            .collect();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        info.total_size += listed.iter().map(|e| e.size).sum::<u64>();
        info.entries.extend(listed);
    }
    info
}

fn disk_size(path: &std::path::Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter_map(|entry| entry.metadata().ok())
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
        .sum()
}

/// Remove one mod from `mods/` and `overlay/installed/`.
///
/// Returns the number of folders removed.
pub fn remove_cached(layout: &DataLayout, name: &str) -> usize {
    let mut removed = 0;
    for dir in [layout.mods_dir().join(name), layout.installed_dir().join(name)] {
        if !dir.exists() {
            continue;
        }
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::info!("Removed {}", dir);
                removed += 1;
            }
            Err(e) => tracing::warn!("Failed to remove {}: {}", dir, e),
        }
    }
    if removed > 0 {
        layout.forget_source(name);
        layout.clear_profile_manifest();
    }
    removed
}

/// Delete leftovers from interrupted imports and duplicate installs.
///
/// Staging folders are always removed. Folders named `mod_<n>_<name>` by
/// older installs are duplicates when `<name>` (or another prefixed copy) is
/// also present; the unprefixed folder, else the first by name, is kept.
/// Returns the number of folders removed.
pub fn prune_installed(layout: &DataLayout) -> usize {
    let installed = layout.installed_dir();
    let Ok(entries) = fs::read_dir(&installed) else {
        return 0;
    };

    let mut stale = Vec::new();
    let mut by_base: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in entries.filter_map(Result::ok) {
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(STAGING_PREFIX) {
            stale.push(name);
        } else {
            by_base.entry(base_name(&name).to_string()).or_default().push(name);
        }
    }

    for (base, mut names) in by_base {
        if names.len() < 2 {
            continue;
        }
        names.sort_by_key(|name| (name != &base, name.clone()));
        tracing::info!("Found {} copies of {}, keeping {}", names.len(), base, names[0]);
        stale.extend(names.into_iter().skip(1));
    }

    let mut removed = 0;
    for name in stale {
        let dir = installed.join(&name);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::debug!("Removed stale folder {}", dir);
                layout.forget_source(&name);
                removed += 1;
            }
            Err(e) => tracing::warn!("Failed to remove stale folder {}: {}", dir, e),
        }
    }
    removed
}

/// `103_103085` for `mod_0_103_103085`, the name itself otherwise.
fn base_name(name: &str) -> &str {
    name.strip_prefix("mod_")
        .and_then(|rest| rest.split_once('_'))
        .filter(|(index, base)| {
            !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) && !base.is_empty()
        })
        .map_or(name, |(_, base)| base)
}

/// Render a byte count for humans.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;

    fn temp_layout() -> (tempfile::TempDir, DataLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(Utf8Path::from_path(dir.path()).unwrap());
        layout.ensure_overlay_dirs().unwrap();
        (dir, layout)
    }

    fn installed_mod(layout: &DataLayout, name: &str) -> Utf8PathBuf {
        let dir = layout.installed_dir().join(name);
        fs::create_dir_all(dir.join("META")).unwrap();
        fs::write(dir.join("META").join("info.json"), "{}").unwrap();
        dir
    }

    #[test]
    fn info_lists_entries_with_sizes() {
        let (_dir, layout) = temp_layout();
        let skin = layout.mods_dir().join("103_103085");
        fs::create_dir_all(skin.join("WAD")).unwrap();
        fs::write(skin.join("WAD").join("Ahri.wad.client"), vec![0u8; 100]).unwrap();
        installed_mod(&layout, "custom_c1");

        let info = cache_info(&layout);
        assert_eq!(info.root.as_str(), layout.root().as_str());
        assert_eq!(info.total_size, 102);
        assert_eq!(
            info.entries,
            vec![
                CacheEntry {
                    area: CacheArea::Mods,
                    name: "103_103085".to_string(),
                    size: 100,
                },
                CacheEntry {
                    area: CacheArea::Installed,
                    name: "custom_c1".to_string(),
                    size: 2,
                },
            ]
        );
    }

    #[test]
    fn remove_deletes_download_and_install() {
        let (_dir, layout) = temp_layout();
        fs::create_dir_all(layout.mods_dir().join("103_103085")).unwrap();
        installed_mod(&layout, "103_103085");
        installed_mod(&layout, "custom_c1");
        layout.record_source("103_103085", Utf8Path::new("/data/mods/103_103085"));
        layout.write_profile_manifest(&["103_103085".to_string()]);

        assert_eq!(remove_cached(&layout, "103_103085"), 2);
        assert!(!layout.mods_dir().join("103_103085").exists());
        assert!(!layout.installed_dir().join("103_103085").exists());
        assert!(layout.installed_dir().join("custom_c1").exists());
        assert_eq!(layout.installed_source("103_103085"), None);
        assert_eq!(layout.read_profile_manifest(), None);

        assert_eq!(remove_cached(&layout, "103_103085"), 0);
    }

    #[test]
    fn prune_removes_staging_and_duplicates() {
        let (_dir, layout) = temp_layout();
        installed_mod(&layout, "103_103085");
        installed_mod(&layout, "mod_0_103_103085");
        installed_mod(&layout, "mod_1_266_266001");
        installed_mod(&layout, "mod_3_266_266001");
        installed_mod(&layout, "custom_c1");
        fs::create_dir_all(layout.staging_dir("custom_c2")).unwrap();

        assert_eq!(prune_installed(&layout), 3);

        let mut left: Vec<String> = fs::read_dir(layout.installed_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["103_103085", "custom_c1", "mod_1_266_266001"]);
        assert_eq!(prune_installed(&layout), 0);
    }

    #[test]
    fn base_name_strips_index_prefix() {
        assert_eq!(base_name("mod_0_103_103085"), "103_103085");
        assert_eq!(base_name("mod_x_103"), "mod_x_103");
        assert_eq!(base_name("custom_c1"), "custom_c1");
        assert_eq!(base_name("mod_"), "mod_");
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
