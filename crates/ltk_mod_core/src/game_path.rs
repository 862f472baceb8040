//! Persisted game folder configuration.

use crate::error::{Error, Result};
use crate::league_path::{detect_game_dir, is_game_dir, DetectedGame, DetectionSource};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Default file name of the saved game path.
pub const GAME_PATH_FILE: &str = "game_path.txt";

/// Stores the manually chosen game folder as a single line of text.
#[derive(Debug, Clone)]
pub struct GamePathStore {
    file: Utf8PathBuf,
}

impl GamePathStore {
    pub fn new(file: impl Into<Utf8PathBuf>) -> Self {
        Self { file: file.into() }
    }

    /// Store `game_path.txt` inside `dir`.
    pub fn in_dir(dir: &Utf8Path) -> Self {
        Self::new(dir.join(GAME_PATH_FILE))
    }

    pub fn file(&self) -> &Utf8Path {
        &self.file
    }

    /// The saved game folder, if it still contains the game.
    ///
    /// A saved folder that is no longer valid is forgotten.
    pub fn load(&self) -> Option<Utf8PathBuf> {
        let contents = fs::read_to_string(&self.file).ok()?;
        let saved = Utf8PathBuf::from(contents.trim());

        if is_game_dir(&saved) {
            return Some(saved);
        }

        tracing::warn!("Saved game path '{}' is no longer valid, removing it", saved);
        if let Err(e) = fs::remove_file(&self.file) {
            tracing::warn!("Failed to remove {}: {}", self.file, e);
        }
        None
    }

    /// Validate and persist `game_dir`.
    pub fn save(&self, game_dir: &Utf8Path) -> Result<()> {
        if !is_game_dir(game_dir) {
            return Err(Error::NotAGameDirectory(game_dir.to_path_buf()));
        }

        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.file, game_dir.as_str())?;
        tracing::info!("Game path saved: {}", game_dir);
        Ok(())
    }

    /// Forget the saved folder. Clearing an absent file succeeds.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.file) {
            Ok(()) => {
                tracing::info!("Game path cleared, auto-detection will be used");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// The saved folder, or an auto-detected one.
    pub fn resolve(&self) -> Option<DetectedGame> {
        if let Some(game_dir) = self.load() {
            return Some(DetectedGame {
                game_dir,
                source: DetectionSource::Saved,
            });
        }
        detect_game_dir()
    }
}

/// Map a picked `League of Legends.exe` to its game folder.
///
/// The file name is compared case-insensitively; the file itself does not
/// have to exist yet.
pub fn game_dir_from_executable(executable: &Utf8Path) -> Result<Utf8PathBuf> {
    let file_name = executable.file_name().unwrap_or_default();
    if !file_name.eq_ignore_ascii_case(crate::GAME_EXECUTABLE) {
        return Err(Error::NotTheGameExecutable(file_name.to_string()));
    }

    executable
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .map(Utf8Path::to_path_buf)
        .ok_or_else(|| Error::NotTheGameExecutable(executable.to_string()))
}
