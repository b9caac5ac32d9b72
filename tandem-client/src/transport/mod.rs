mod transport_config;
mod webrtc_backend;

pub use transport_config::*;
pub use webrtc_backend::*;
