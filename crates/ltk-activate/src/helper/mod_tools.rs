//! Wrapper around the `mod-tools` executable shipped with the overlay injector.

use camino::{Utf8Path, Utf8PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

pub const MOD_TOOLS_EXE: &str = "mod-tools.exe";
/// Injector library loaded by `runoverlay`, expected next to the executable.
pub const INJECTOR_DLL: &str = "cslol-dll.dll";

const MKOVERLAY_ATTEMPTS: usize = 3;
const MKOVERLAY_RETRY_DELAY: Duration = Duration::from_millis(500);
const STARTUP_GRACE: Duration = Duration::from_millis(500);

/// Exit codes seen when the anti-cheat driver refuses the injector.
const VANGUARD_EXIT_CODES: [i32; 2] = [-1073741511, -1073740791];
const VANGUARD_STDERR_MARKERS: [&str; 2] = ["C0000229", "ah_result"];

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// A failed `mod-tools` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFailure {
    pub message: String,
    pub vanguard_blocked: bool,
}

impl ToolFailure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            vanguard_blocked: false,
        }
    }
}

pub fn is_vanguard_stderr(stderr: &str) -> bool {
    VANGUARD_STDERR_MARKERS.iter().any(|m| stderr.contains(m))
}

pub fn is_vanguard_exit(code: i32) -> bool {
    VANGUARD_EXIT_CODES.contains(&code)
}

#[derive(Debug, Clone)]
pub struct ModTools {
    exe: Utf8PathBuf,
}

impl ModTools {
    pub fn new(exe: impl Into<Utf8PathBuf>) -> Self {
        Self { exe: exe.into() }
    }

    /// The configured executable, or `managers/mod-tools.exe` next to this
    /// binary, or under the working directory.
    pub fn locate(configured: Option<&Utf8Path>, install_dir: Option<&Utf8Path>) -> Self {
        if let Some(path) = configured {
            return Self::new(path);
        }

        let candidates = install_dir
            .map(|dir| dir.join("managers").join(MOD_TOOLS_EXE))
            .into_iter()
            .chain(std::iter::once(
                Utf8PathBuf::from("managers").join(MOD_TOOLS_EXE),
            ));
        let mut fallback = None;
        for candidate in candidates {
            if candidate.is_file() {
                return Self::new(candidate);
            }
            fallback.get_or_insert(candidate);
        }
        Self::new(fallback.unwrap_or_else(|| Utf8PathBuf::from(MOD_TOOLS_EXE)))
    }

    pub fn exe(&self) -> &Utf8Path {
        &self.exe
    }

    pub fn exists(&self) -> bool {
        self.exe.is_file()
    }

    pub fn dir(&self) -> &Utf8Path {
        self.exe.parent().unwrap_or(Utf8Path::new("."))
    }

    pub fn dll_path(&self) -> Utf8PathBuf {
        self.dir().join(INJECTOR_DLL)
    }

    fn command(&self) -> Command {
        #[allow(unused_mut)]
        let mut cmd = Command::new(self.exe.as_std_path());
        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);
        cmd
    }

    /// Convert a mod archive into an installed mod folder.
    pub async fn import(
        &self,
        src: &Utf8Path,
        dst: &Utf8Path,
        game: &Utf8Path,
    ) -> Result<(), ToolFailure> {
        let output = self
            .command()
            .arg("import")
            .arg(src.as_str())
            .arg(dst.as_str())
            .arg(game_arg(game))
            .output()
            .await
            .map_err(|e| ToolFailure::new(format!("Failed to run import: {e}")))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ToolFailure::new(format!("Import failed: {}", stderr.trim())))
        }
    }

    /// Build the overlay profile from `mods` under `installed`, retrying on failure.
    pub async fn mkoverlay(
        &self,
        installed: &Utf8Path,
        profile: &Utf8Path,
        game: &Utf8Path,
        mods: &[String],
    ) -> Result<(), ToolFailure> {
        let args = mkoverlay_args(installed, profile, game, mods);
        let mut last = ToolFailure::new("mkoverlay was not run");

        for attempt in 1..=MKOVERLAY_ATTEMPTS {
            if attempt > 1 {
                tracing::info!("Retrying mkoverlay, attempt {}/{}", attempt, MKOVERLAY_ATTEMPTS);
                tokio::time::sleep(MKOVERLAY_RETRY_DELAY).await;
            }

            match self.command().args(&args).output().await {
                Ok(output) if output.status.success() => {
                    tracing::debug!("mkoverlay succeeded on attempt {}", attempt);
                    return Ok(());
                }
                Ok(output) => {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    tracing::warn!("mkoverlay attempt {} failed: {}", attempt, stderr.trim());
                    last = ToolFailure {
                        message: format!("mkoverlay failed: {}", stderr.trim()),
                        vanguard_blocked: is_vanguard_stderr(&stderr),
                    };
                }
                Err(e) => {
                    tracing::warn!("mkoverlay attempt {} could not start: {}", attempt, e);
                    last = ToolFailure::new(format!("Failed to run mkoverlay: {e}"));
                }
            }
        }

        Err(last)
    }

    /// Start the overlay and make sure it survives its startup grace period.
    pub async fn runoverlay(
        &self,
        profile: &Utf8Path,
        config: &Utf8Path,
        game: &Utf8Path,
    ) -> Result<Child, ToolFailure> {
        let mut child = self
            .command()
            .arg("runoverlay")
            .arg(profile.as_str())
            .arg(config.as_str())
            .arg(game_arg(game))
            .arg("--opts:none")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ToolFailure::new(format!("Failed to start overlay: {e}")))?;

        tracing::info!("Overlay process spawned with PID {:?}", child.id());
        tokio::time::sleep(STARTUP_GRACE).await;

        match child.try_wait() {
            Ok(Some(status)) => {
                let mut stderr = String::new();
                if let Some(mut pipe) = child.stderr.take() {
                    let _ = pipe.read_to_string(&mut stderr).await;
                }
                tracing::error!("Overlay exited immediately ({}): {}", status, stderr.trim());
                Err(early_exit_failure(status, &stderr))
            }
            Ok(None) => Ok(child),
            Err(e) => {
                tracing::warn!("Could not check overlay status: {}", e);
                Ok(child)
            }
        }
    }
}

fn game_arg(game: &Utf8Path) -> String {
    format!("--game:{game}")
}

pub fn mkoverlay_args(
    installed: &Utf8Path,
    profile: &Utf8Path,
    game: &Utf8Path,
    mods: &[String],
) -> Vec<String> {
    vec![
        "mkoverlay".to_string(),
        installed.to_string(),
        profile.to_string(),
        game_arg(game),
        format!("--mods:{}", mods.join("/")),
        "--noTFT".to_string(),
        "--ignoreConflict".to_string(),
    ]
}

fn early_exit_failure(status: ExitStatus, stderr: &str) -> ToolFailure {
    let code = status.code().unwrap_or(-1);
    ToolFailure {
        message: format!("Overlay process exited immediately (code: {code})"),
        vanguard_blocked: is_vanguard_exit(code) || is_vanguard_stderr(stderr),
    }
}
