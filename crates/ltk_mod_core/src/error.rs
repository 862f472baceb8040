use camino::Utf8PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("League of Legends.exe not found in '{0}'")]
    NotAGameDirectory(Utf8PathBuf),

    #[error("Invalid file: {0}. Please select League of Legends.exe")]
    NotTheGameExecutable(String),

    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8Path(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
