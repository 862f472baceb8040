//! League of Legends game folder discovery.
//!
//! The game folder is the `Game` directory holding `League of Legends.exe`;
//! this is what the overlay tools take as `--game:`.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use sysinfo::{Disks, ProcessRefreshKind, RefreshKind, System};

/// File name of the game executable inside the game folder.
pub const GAME_EXECUTABLE: &str = "League of Legends.exe";

const CLIENT_PROCESSES: [&str; 2] = ["LeagueClientUx.exe", "LeagueClient.exe"];
const INSTALL_PARENTS: [&str; 3] = ["", "Program Files", "Program Files (x86)"];
const REGISTRY_KEY: &str = "HKLM\\SOFTWARE\\WOW6432Node\\Riot Games, Inc\\League of Legends";

/// Where a game folder was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    /// The folder saved by the user.
    Saved,
    RiotClientInstalls,
    RunningProcess,
    CommonPaths,
    Registry,
}

impl fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Saved => "saved path",
            Self::RiotClientInstalls => "RiotClientInstalls.json",
            Self::RunningProcess => "running client",
            Self::CommonPaths => "common install paths",
            Self::Registry => "registry",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedGame {
    pub game_dir: Utf8PathBuf,
    pub source: DetectionSource,
}

/// Whether `dir` is a game folder, i.e. contains the game executable.
pub fn is_game_dir(dir: &Utf8Path) -> bool {
    dir.join(GAME_EXECUTABLE).is_file()
}

/// Auto-detect the game folder.
///
/// Sources are tried in order of reliability: RiotClientInstalls.json, a
/// running client, common install locations on every disk, then the Windows
/// registry.
pub fn detect_game_dir() -> Option<DetectedGame> {
    let probes: [(DetectionSource, fn() -> Option<Utf8PathBuf>); 4] = [
        (DetectionSource::RiotClientInstalls, from_riot_client_installs),
        (DetectionSource::RunningProcess, from_running_process),
        (DetectionSource::CommonPaths, from_common_paths),
        (DetectionSource::Registry, from_registry),
    ];

    probes.into_iter().find_map(|(source, probe)| {
        let game_dir = probe()?;
        tracing::debug!("Found game folder via {}: {}", source, game_dir);
        Some(DetectedGame { game_dir, source })
    })
}

#[derive(Deserialize)]
struct RiotClientInstalls {
    #[serde(default)]
    associated_client: HashMap<String, serde_json::Value>,
}

/// Game folder candidates listed in a RiotClientInstalls.json document.
///
/// Only the live `League of Legends` install is considered; PBE folders are skipped.
pub fn game_dirs_from_riot_installs(json: &str) -> Vec<Utf8PathBuf> {
    let Ok(installs) = serde_json::from_str::<RiotClientInstalls>(json) else {
        return Vec::new();
    };

    let mut dirs: Vec<Utf8PathBuf> = installs
        .associated_client
        .into_keys()
        .map(|root| Utf8PathBuf::from(root.trim_end_matches(['/', '\\'])))
        .filter(|root| root.file_name() == Some("League of Legends"))
        .map(|root| root.join("Game"))
        .collect();
    dirs.sort();
    dirs
}

fn from_riot_client_installs() -> Option<Utf8PathBuf> {
    let system_drive = std::env::var("SystemDrive").unwrap_or_else(|_| "C:".to_string());
    let installs = Utf8PathBuf::from(format!("{system_drive}\\"))
        .join("ProgramData")
        .join("Riot Games")
        .join("RiotClientInstalls.json");

    let contents = std::fs::read_to_string(&installs).ok()?;
    game_dirs_from_riot_installs(&contents)
        .into_iter()
        .find(|dir| is_game_dir(dir))
}

fn from_running_process() -> Option<Utf8PathBuf> {
    let system = System::new_with_specifics(
        RefreshKind::new().with_processes(ProcessRefreshKind::everything()),
    );

    let exe_of = |name: &str| {
        system
            .processes_by_name(name.as_ref())
            .filter_map(|process| process.exe())
            .filter_map(|exe| Utf8Path::from_path(exe).map(Utf8Path::to_path_buf))
            .collect::<Vec<_>>()
    };

    // Client executables live one level above the game folder.
    let from_clients = CLIENT_PROCESSES.iter().flat_map(|name| exe_of(name)).find_map(|exe| {
        let game_dir = exe.parent()?.join("Game");
        is_game_dir(&game_dir).then_some(game_dir)
    });

    from_clients.or_else(|| {
        exe_of(GAME_EXECUTABLE).into_iter().find_map(|exe| {
            let game_dir = exe.parent()?.to_path_buf();
            is_game_dir(&game_dir).then_some(game_dir)
        })
    })
}

/// `<drive>/[parent/]Riot Games/League of Legends/Game` for every mounted disk.
fn common_game_dirs(drives: &[String]) -> Vec<Utf8PathBuf> {
    drives
        .iter()
        .map(|drive| format!("{}/", drive.trim_end_matches(['\\', '/'])))
        .flat_map(|root| {
            INSTALL_PARENTS.iter().map(move |parent| {
                let mut dir = Utf8PathBuf::from(&root);
                if !parent.is_empty() {
                    dir.push(parent);
                }
                dir.join("Riot Games").join("League of Legends").join("Game")
            })
        })
        .collect()
}

fn from_common_paths() -> Option<Utf8PathBuf> {
    let mut drives: Vec<String> = Disks::new_with_refreshed_list()
        .iter()
        .filter_map(|disk| disk.mount_point().to_str().map(String::from))
        .collect();

    if drives.is_empty() && cfg!(target_os = "windows") {
        drives = ["C:", "D:", "E:", "F:"].map(String::from).to_vec();
    }

    common_game_dirs(&drives)
        .into_iter()
        .find(|dir| is_game_dir(dir))
}

/// Extract the install root from `reg query ... /v Location` output.
pub fn parse_registry_location(output: &str) -> Option<Utf8PathBuf> {
    output
        .lines()
        .filter(|line| line.contains("Location"))
        .find_map(|line| line.split_once("REG_SZ"))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(Utf8PathBuf::from)
}

fn from_registry() -> Option<Utf8PathBuf> {
    if cfg!(not(target_os = "windows")) {
        return None;
    }

    let output = std::process::Command::new("reg")
        .args(["query", REGISTRY_KEY, "/v", "Location"])
        .output()
        .ok()?;
    let stdout = String::from_utf8(output.stdout).ok()?;

    let game_dir = parse_registry_location(&stdout)?.join("Game");
    is_game_dir(&game_dir).then_some(game_dir)
}
