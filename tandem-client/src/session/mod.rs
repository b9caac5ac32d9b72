mod candidate_buffer;
mod negotiation_state;
mod peer_session;
mod session_context;
mod session_event;

pub use candidate_buffer::*;
pub use negotiation_state::*;
pub use peer_session::*;
pub use session_context::*;
pub use session_event::*;
