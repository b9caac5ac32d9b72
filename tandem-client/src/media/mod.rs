mod media_sink;
mod media_source;

pub use media_sink::*;
pub use media_source::*;
