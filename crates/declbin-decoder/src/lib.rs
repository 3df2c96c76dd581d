#![warn(clippy::pedantic)]

pub mod config;
pub mod decoder;
pub mod error;

mod async_source;
mod engine;

pub use config::DecoderConfig;
pub use decoder::{DecodedRecord, LayoutDecoder, Records, decode};
pub use error::{DecodeError, FieldContext};
