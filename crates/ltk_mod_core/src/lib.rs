//! Game installation discovery shared by the activation helper and CLI.
//!
//! [`detect_game_dir`] probes the usual places a League of Legends client is
//! installed. [`GamePathStore`] keeps a manually chosen game folder that takes
//! precedence over detection.

mod error;
mod game_path;
mod league_path;

pub use error::{Error, Result};
pub use game_path::{game_dir_from_executable, GamePathStore, GAME_PATH_FILE};
pub use league_path::{
    detect_game_dir, game_dirs_from_riot_installs, is_game_dir, parse_registry_location,
    DetectedGame, DetectionSource, GAME_EXECUTABLE,
};
