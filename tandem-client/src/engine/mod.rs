mod engine_command;
mod engine_handle;
mod peer_engine;

pub use engine_command::*;
pub use engine_handle::*;
pub use peer_engine::*;
