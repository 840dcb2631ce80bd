pub mod gesture;
pub mod interpreter;
pub mod library;
pub mod messages;
pub mod ops;
pub mod protocol;
pub mod render;
pub mod session;
pub mod timeline;
pub mod transport;
pub mod voice;

#[cfg(test)]
mod test_support;

pub use session::Session;
pub use timeline::*;
