mod backend;
mod engine;
mod error;
mod media;
mod role;
mod session;
mod signaling;
mod transport;

pub use backend::*;
pub use engine::*;
pub use error::*;
pub use media::*;
pub use role::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;
