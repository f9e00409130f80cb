pub mod config;
pub mod tool;

pub use config::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use tool::{
    empty_inventory, supported_tools, Inventory, ProbeStream, ToolKind, ToolSpec, VersionMap,
    VersionPattern,
};
