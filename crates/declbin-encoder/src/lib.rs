#![warn(clippy::pedantic)]

pub mod config;
pub mod encoder;
pub mod error;

pub use config::EncoderConfig;
pub use encoder::LayoutEncoder;
pub use error::EncodeError;
