#![warn(clippy::pedantic)]

pub mod cursor;
pub mod endian;
pub mod error;
pub mod sink;

pub use cursor::ByteCursor;
pub use endian::{Endian, Scalar};
pub use error::WireError;
pub use sink::ByteSink;
