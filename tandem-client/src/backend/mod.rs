mod backend_event;
mod connectivity_backend;

pub use backend_event::*;
pub use connectivity_backend::*;
