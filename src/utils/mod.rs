pub mod command;
pub mod platform;

pub use command::*;
pub use platform::*;
