//! Local [`NativeHelper`] backed by `mod-tools` and the skin repository.

pub mod cache;
pub mod download;
pub mod layout;
pub mod mod_tools;

use crate::utils::config::{install_dir, AppConfig};
use crate::utils::sanitize_name;
use async_trait::async_trait;
use cache::CacheInfo;
use camino::{Utf8Path, Utf8PathBuf};
use download::SkinRepository;
use inquire::{InquireError, Text};
use layout::{DataLayout, OverlayStatus};
use ltk_activation::{
    ActivateItem, ActivateRequest, ActivateResponse, BrowseOutcome, HelperError, HelperResult,
    NativeHelper, SkinDownloadRequest, StopResponse,
};
use ltk_mod_core::{game_dir_from_executable, GamePathStore};
use mod_tools::{ModTools, ToolFailure};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::time::Duration;
use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System};
use tokio::io::AsyncWriteExt;
use tokio::process::Child;
use tokio::sync::Mutex;
use walkdir::WalkDir;

const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Snapshot of the helper's environment for `status` output.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub mod_tools: Utf8PathBuf,
    pub mod_tools_found: bool,
    pub injector_found: bool,
    pub data_dir: Utf8PathBuf,
    pub saved_game_path: Option<Utf8PathBuf>,
    pub installed_mods: usize,
    pub overlay_status: Option<OverlayStatus>,
}

/// Result of installing one activation's items.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Installed folder names in request order.
    pub names: Vec<String>,
    /// At least one folder was (re)installed by this call.
    pub changed: bool,
}

pub struct LocalHelper {
    layout: DataLayout,
    store: GamePathStore,
    tools: ModTools,
    repository: SkinRepository,
    refresh_url: Option<String>,
    overlay: Mutex<Option<Child>>,
}

impl LocalHelper {
    pub fn new(
        layout: DataLayout,
        tools: ModTools,
        repository_url: &str,
        refresh_url: Option<String>,
    ) -> Self {
        Self {
            store: GamePathStore::in_dir(layout.root()),
            repository: SkinRepository::new(repository_url, layout.mods_dir()),
            layout,
            tools,
            refresh_url,
            overlay: Mutex::new(None),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let install_dir = install_dir();
        let tools = ModTools::locate(config.mod_tools_path.as_deref(), install_dir.as_deref());
        Self::new(
            DataLayout::new(config.resolved_data_dir()),
            tools,
            config.skin_repository(),
            config.helper_refresh_url.clone(),
        )
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn diagnostics(&self) -> Diagnostics {
        let installed_mods = fs::read_dir(self.layout.installed_dir())
            .map(|entries| entries.filter_map(Result::ok).count())
            .unwrap_or(0);

        Diagnostics {
            mod_tools: self.tools.exe().to_path_buf(),
            mod_tools_found: self.tools.exists(),
            injector_found: self.tools.dll_path().is_file(),
            data_dir: self.layout.root().to_path_buf(),
            saved_game_path: self.store.load(),
            installed_mods,
            overlay_status: OverlayStatus::read(&self.layout),
        }
    }

    /// Remove every downloaded and imported mod. Returns the number of
    /// entries that could not be removed.
    pub fn clear_caches(&self) -> usize {
        self.layout.clear_caches()
    }

    pub fn cache_info(&self) -> CacheInfo {
        cache::cache_info(&self.layout)
    }

    /// Remove one downloaded or installed mod. `name` is either its cache
    /// folder name or the id of a custom mod.
    pub fn remove_cached(&self, name: &str) -> usize {
        cache::remove_cached(&self.layout, name)
            + cache::remove_cached(&self.layout, &custom_install_name(name))
    }

    /// Import each item into `installed/`, reusing folders from earlier runs.
    ///
    /// Installed names are returned in request order. Items that fail to
    /// import are logged and left out.
    pub async fn install_items(&self, items: &[ActivateItem], game: &Utf8Path) -> InstallOutcome {
        let pruned = cache::prune_installed(&self.layout);
        if pruned > 0 {
            tracing::info!("Removed {} leftover folder(s) from installed mods", pruned);
        }

        let installed_dir = self.layout.installed_dir();
        let mut seen = HashSet::new();
        let mut outcome = InstallOutcome::default();

        for item in items {
            let name = install_name(item);
            if !seen.insert(name.clone()) {
                tracing::warn!("Skipping {}: already installed as {}", item.name, name);
                continue;
            }

            let src = &item.local_path;
            let target = installed_dir.join(&name);
            if is_installed(&target) && self.layout.installed_source(&name).as_ref() == Some(src) {
                tracing::debug!("Reusing installed mod {}", name);
                outcome.names.push(name);
                continue;
            }

            if !src.exists() {
                tracing::warn!("Source for {} not found: {}", item.name, src);
                continue;
            }

            match self.install_one(src, &name, game).await {
                Ok(()) => {
                    self.layout.record_source(&name, src);
                    outcome.names.push(name);
                    outcome.changed = true;
                }
                Err(e) => tracing::warn!("Failed to install {}: {}", item.name, e),
            }
        }

        outcome
    }

    /// Copy or import `src` into a staging folder, then move it to `installed/<name>`.
    async fn install_one(&self, src: &Utf8Path, name: &str, game: &Utf8Path) -> Result<(), String> {
        let staging = self.layout.staging_dir(name);
        let target = self.layout.installed_dir().join(name);
        remove_dir_if_exists(&staging)
            .await
            .map_err(|e| format!("Failed to clear {staging}: {e}"))?;

        let result = if src.is_dir() {
            tracing::info!("Copying {} -> {}", src, name);
            copy_dir(src.to_path_buf(), staging.clone())
                .await
                .map_err(|e| format!("Copy failed: {e}"))
        } else {
            tracing::info!("Importing {} -> {}", src, name);
            self.tools
                .import(src, &staging, game)
                .await
                .map_err(|f| f.message)
        };

        let result = match result {
            Ok(()) => match remove_dir_if_exists(&target).await {
                Ok(()) => tokio::fs::rename(&staging, &target)
                    .await
                    .map_err(|e| format!("Failed to move {staging} to {target}: {e}")),
                Err(e) => Err(format!("Failed to replace {target}: {e}")),
            },
            Err(e) => Err(e),
        };

        if result.is_err() {
            if let Err(e) = remove_dir_if_exists(&staging).await {
                tracing::warn!("Failed to clean up {}: {}", staging, e);
            }
            self.layout.forget_source(name);
        }
        result
    }

    async fn take_overlay(&self) -> Option<Child> {
        self.overlay.lock().await.take()
    }

    /// The built profile matches `outcome` and none of its mods changed on disk.
    fn profile_reusable(&self, outcome: &InstallOutcome) -> bool {
        !outcome.changed
            && dir_has_entries(&self.layout.profile_dir())
            && self.layout.read_profile_manifest().as_deref() == Some(outcome.names.as_slice())
    }

    /// Build (or reuse) the profile and start the overlay.
    ///
    /// Returns the child and whether the previous profile was reused.
    async fn start_overlay(
        &self,
        outcome: &InstallOutcome,
        game: &Utf8Path,
    ) -> Result<(Child, bool), ToolFailure> {
        let profile = self.layout.profile_dir();

        let reused = self.profile_reusable(outcome);
        if reused {
            tracing::info!("Installed mods unchanged, reusing overlay profile");
        } else {
            self.layout.clear_profile_manifest();
            self.tools
                .mkoverlay(&self.layout.installed_dir(), &profile, game, &outcome.names)
                .await?;
            self.layout.write_profile_manifest(&outcome.names);
        }

        let config = self.layout.profile_config();
        if let Err(e) = fs::write(&config, "") {
            tracing::warn!("Failed to write {}: {}", config, e);
        }
        OverlayStatus::Ready.write(&self.layout);

        if !self.tools.dll_path().is_file() {
            tracing::warn!("{} is missing, the overlay may fail to inject", self.tools.dll_path());
        }

        let child = self.tools.runoverlay(&profile, &config, game).await?;
        Ok((child, reused))
    }

    fn record_pid(&self, child: &Child) {
        let Some(pid) = child.id() else {
            return;
        };
        if let Err(e) = fs::write(self.layout.pid_file(), pid.to_string()) {
            tracing::warn!("Failed to record overlay PID: {}", e);
        }
    }

    fn recorded_pid(&self) -> Option<u32> {
        fs::read_to_string(self.layout.pid_file())
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }

    /// Kill the overlay recorded in the PID file by an earlier run.
    ///
    /// Returns `Err` only when the process is alive and refused to die.
    fn kill_recorded_overlay(&self) -> Result<(), String> {
        let Some(pid) = self.recorded_pid() else {
            return Ok(());
        };
        let system = processes();
        match system.process(Pid::from_u32(pid)) {
            Some(process) if is_mod_tools(process) => {
                tracing::info!("Killing recorded overlay process {}", pid);
                if process.kill() {
                    Ok(())
                } else {
                    Err(format!("Failed to kill overlay process {pid}"))
                }
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl NativeHelper for LocalHelper {
    async fn detect_game_path(&self) -> Option<Utf8PathBuf> {
        let store = self.store.clone();
        let detected = tokio::task::spawn_blocking(move || store.resolve())
            .await
            .ok()
            .flatten()?;
        tracing::info!("Game found via {}: {}", detected.source, detected.game_dir);
        Some(detected.game_dir)
    }

    async fn set_game_path(&self, path: &Utf8Path) -> HelperResult<()> {
        self.store
            .save(path)
            .map_err(|e| HelperError::Message(e.to_string()))
    }

    async fn browse_game_path(&self) -> BrowseOutcome {
        let answer = tokio::task::spawn_blocking(|| {
            Text::new("Path to League of Legends.exe:")
                .with_help_message("Usually C:\\Riot Games\\League of Legends\\Game\\League of Legends.exe")
                .prompt()
        })
        .await;

        match answer {
            Ok(Ok(input)) => {
                let input = input.trim().trim_matches('"');
                match game_dir_from_executable(Utf8Path::new(input)) {
                    Ok(dir) => BrowseOutcome::Selected(dir),
                    Err(e) => BrowseOutcome::Invalid(e.to_string()),
                }
            }
            Ok(Err(InquireError::OperationCanceled | InquireError::OperationInterrupted)) => {
                BrowseOutcome::Cancelled
            }
            Ok(Err(e)) => BrowseOutcome::Invalid(e.to_string()),
            Err(e) => BrowseOutcome::Invalid(e.to_string()),
        }
    }

    async fn clear_game_path(&self) -> bool {
        match self.store.clear() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to clear game path: {}", e);
                false
            }
        }
    }

    async fn download_skin(&self, request: &SkinDownloadRequest) -> HelperResult<Utf8PathBuf> {
        self.repository.fetch(request).await
    }

    async fn activate(&self, request: &ActivateRequest) -> ActivateResponse {
        if !self.tools.exists() {
            return ActivateResponse::failed(format!("mod-tools not found at {}", self.tools.exe()));
        }
        if let Err(e) = self.layout.ensure_overlay_dirs() {
            return ActivateResponse::failed(format!("Failed to prepare overlay folder: {e}"));
        }

        tracing::debug!(
            "Activating {} item(s), selection unchanged: {}",
            request.items.len(),
            request.selection_unchanged
        );
        let outcome = self.install_items(&request.items, &request.game_path).await;
        if outcome.names.is_empty() {
            return ActivateResponse::failed("No valid mods to activate");
        }

        if let Some(mut previous) = self.take_overlay().await {
            tracing::info!("Stopping previous overlay before restart");
            shutdown_child(&mut previous).await;
        }

        match self.start_overlay(&outcome, &request.game_path).await {
            Ok((child, reused)) => {
                self.record_pid(&child);
                OverlayStatus::Running.write(&self.layout);
                *self.overlay.lock().await = Some(child);
                let mut message = format!("Overlay active - {} mods loaded", outcome.names.len());
                if reused {
                    message.push_str(" (profile reused)");
                }
                ActivateResponse::succeeded(message)
            }
            Err(failure) => {
                OverlayStatus::Stopped.write(&self.layout);
                if failure.vanguard_blocked {
                    ActivateResponse::blocked(failure.message)
                } else {
                    ActivateResponse::failed(failure.message)
                }
            }
        }
    }

    async fn stop_overlay(&self) -> StopResponse {
        let result = match self.take_overlay().await {
            Some(mut child) => {
                shutdown_child(&mut child).await;
                Ok(())
            }
            None => self.kill_recorded_overlay(),
        };

        if let Err(e) = result {
            return StopResponse {
                success: false,
                message: String::new(),
                error: Some(e),
            };
        }

        let _ = fs::remove_file(self.layout.pid_file());
        if self.layout.overlay_dir().is_dir() {
            OverlayStatus::Stopped.write(&self.layout);
        }
        StopResponse {
            success: true,
            message: "Overlay deactivated".to_string(),
            error: None,
        }
    }

    async fn is_overlay_running(&self) -> bool {
        if let Some(child) = self.overlay.lock().await.as_mut() {
            if matches!(child.try_wait(), Ok(None)) {
                return true;
            }
        }

        if OverlayStatus::read(&self.layout) != Some(OverlayStatus::Running) {
            return false;
        }
        let Some(pid) = self.recorded_pid() else {
            return false;
        };
        processes()
            .process(Pid::from_u32(pid))
            .is_some_and(is_mod_tools)
    }

    async fn refresh_helper(&self) -> bool {
        let Some(url) = self.refresh_url.as_deref() else {
            tracing::warn!("No helper_refresh_url configured, cannot refresh the injector");
            return false;
        };

        let target = self.tools.dll_path();
        tracing::info!("Refreshing {} from {}", target, url);

        let bytes = match self.repository.client().get(url).send().await {
            Ok(response) if response.status().is_success() => response.bytes().await,
            Ok(response) => {
                tracing::warn!("Injector refresh returned HTTP {}", response.status());
                return false;
            }
            Err(e) => {
                tracing::warn!("Injector refresh failed: {}", e);
                return false;
            }
        };

        match bytes {
            Ok(bytes) => match fs::write(&target, &bytes) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Failed to write {}: {}", target, e);
                    false
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read injector download: {}", e);
                false
            }
        }
    }
}

/// Folder name an item is installed under.
///
/// Skins use their composite key, which already names their download. Custom
/// mods use `custom_` followed by their id, so two mods with the same file
/// name never share a folder.
pub fn install_name(item: &ActivateItem) -> String {
    if item.is_custom {
        return custom_install_name(&item.id);
    }
    Some(sanitize_name(&item.id))
        .filter(|name| !name.is_empty())
        .or_else(|| Some(sanitize_name(&item.name)).filter(|name| !name.is_empty()))
        .unwrap_or_else(|| "mod".to_string())
}

/// Every byte outside `[A-Za-z0-9-]` is written as `_xx`, so distinct ids
/// always map to distinct folders.
fn custom_install_name(id: &str) -> String {
    let mut name = String::from("custom_");
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            name.push(char::from(byte));
        } else {
            name.push_str(&format!("_{byte:02x}"));
        }
    }
    name
}

fn is_installed(dir: &Utf8Path) -> bool {
    dir.join("WAD").exists() || dir.join("META").exists()
}

async fn remove_dir_if_exists(dir: &Utf8Path) -> io::Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}

async fn shutdown_child(child: &mut Child) {
    if let Some(stdin) = child.stdin.as_mut() {
        let _ = stdin.write_all(b"\n").await;
        let _ = stdin.flush().await;
    }
    tokio::time::sleep(SHUTDOWN_GRACE).await;

    match child.try_wait() {
        Ok(Some(status)) => tracing::info!("Overlay exited with {}", status),
        _ => {
            tracing::info!("Overlay still running, killing it");
            if let Err(e) = child.kill().await {
                tracing::warn!("Failed to kill overlay: {}", e);
            }
        }
    }
}

fn processes() -> System {
    System::new_with_specifics(RefreshKind::new().with_processes(ProcessRefreshKind::new()))
}

fn is_mod_tools(process: &sysinfo::Process) -> bool {
    process
        .name()
        .to_string_lossy()
        .to_ascii_lowercase()
        .starts_with("mod-tools")
}

fn dir_has_entries(dir: &Utf8Path) -> bool {
    fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}

async fn copy_dir(src: Utf8PathBuf, dst: Utf8PathBuf) -> io::Result<()> {
    tokio::task::spawn_blocking(move || -> io::Result<()> {
        for entry in WalkDir::new(&src) {
            let entry = entry?;
            let relative = entry
                .path()
                .strip_prefix(src.as_std_path())
                .map_err(io::Error::other)?;
            let target = dst.as_std_path().join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)?;
            } else {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(entry.path(), &target)?;
            }
        }
        Ok(())
    })
    .await
    .map_err(io::Error::other)?
}
