mod room;
mod room_manager;

pub use room::*;
pub use room_manager::*;
