mod role_resolver;

pub use role_resolver::*;
