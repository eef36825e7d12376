pub mod config;
pub mod error;
pub mod message;

pub use config::{HostConfig, LocalConfig, LollmsPaths, LOCAL_CONFIG_FILE};
pub use error::{BindingError, PartialGeneration};
pub use message::{ChunkCallback, MessageKind, StreamControl};
