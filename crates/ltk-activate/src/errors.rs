use ltk_activation::{ActivationError, ActivationErrorCode};
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Invalid skin spec: {spec}")]
    #[diagnostic(
        code(selection::invalid_skin),
        help("Use CHAMPION_ID:SKIN_ID, optionally followed by :chroma=ID or :form=ID (e.g. 103:103085:chroma=103090)")
    )]
    InvalidSkinSpec { spec: String },

    #[error("Invalid custom mod spec: {spec}")]
    #[diagnostic(
        code(selection::invalid_custom),
        help("Use ID=PATH, where PATH points to a .fantome, .zip or extracted mod folder")
    )]
    InvalidCustomSpec { spec: String },

    #[error("Selection file could not be read: {path}")]
    #[diagnostic(
        code(selection::file_error),
        help("The file must contain a JSON array of {{\"kind\": \"skin\" | \"custom\", ...}} entries")
    )]
    SelectionFile {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{message}")]
    #[diagnostic(code(activation::failed))]
    ActivationFailed {
        message: String,
        code: ActivationErrorCode,
        #[help]
        help: Option<String>,
    },

    #[error("Failed to stop the overlay: {message}")]
    #[diagnostic(
        code(overlay::stop_failed),
        help("Close mod-tools.exe from the task manager and try again")
    )]
    StopFailed { message: String },

    #[error("Invalid game path: {message}")]
    #[diagnostic(
        code(game_path::invalid),
        help("The folder must contain 'League of Legends.exe', e.g. C:\\Riot Games\\League of Legends\\Game")
    )]
    InvalidGamePath { message: String },

    #[error("League of Legends installation not found")]
    #[diagnostic(
        code(game_path::not_found),
        help("Set it manually with `ltk-activate config set-game-path <DIR>`")
    )]
    GameNotFound,

    #[error("{failures} cache entries could not be removed")]
    #[diagnostic(
        code(cache::clear_failed),
        help("Stop the overlay first, files in use cannot be deleted")
    )]
    CacheClearFailed { failures: usize },

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn invalid_skin_spec(spec: impl Into<String>) -> Self {
        Self::InvalidSkinSpec { spec: spec.into() }
    }

    pub fn invalid_custom_spec(spec: impl Into<String>) -> Self {
        Self::InvalidCustomSpec { spec: spec.into() }
    }

    pub fn selection_file(
        path: PathBuf,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SelectionFile {
            path,
            source: source.into(),
        }
    }

    pub fn invalid_game_path(message: impl Into<String>) -> Self {
        Self::InvalidGamePath {
            message: message.into(),
        }
    }
}

impl From<ActivationError> for CliError {
    fn from(error: ActivationError) -> Self {
        let help = match &error {
            ActivationError::GamePathNotFound => {
                Some("Set the game folder with `ltk-activate config set-game-path <DIR>`".to_string())
            }
            ActivationError::SecurityBlocked { refreshed: true } => {
                Some("Run the same command again".to_string())
            }
            ActivationError::SecurityBlocked { refreshed: false } => {
                Some("Set helper_refresh_url in config.toml or reinstall mod-tools".to_string())
            }
            ActivationError::AlreadyInProgress => {
                Some("Wait for the running activation to finish".to_string())
            }
            _ => None,
        };

        Self::ActivationFailed {
            message: error.to_string(),
            code: error.code(),
            help,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_errors_keep_message_and_code() {
        let err = CliError::from(ActivationError::Native {
            message: "mkoverlay failed: bad wad".to_string(),
        });
        assert_eq!(err.to_string(), "mkoverlay failed: bad wad");
        assert!(matches!(
            err,
            CliError::ActivationFailed {
                code: ActivationErrorCode::ActivationFailed,
                help: None,
                ..
            }
        ));
    }

    #[test]
    fn security_block_suggests_retry_after_refresh() {
        let err = CliError::from(ActivationError::SecurityBlocked { refreshed: true });
        let CliError::ActivationFailed { help, .. } = err else {
            panic!("expected ActivationFailed");
        };
        assert_eq!(help.as_deref(), Some("Run the same command again"));
    }
}
