mod activate;
mod cache;
mod config;
mod overlay;

pub use activate::*;
pub use cache::*;
pub use config::*;
pub use overlay::*;
