#![warn(clippy::pedantic)]

pub mod config;
pub mod driver;
pub mod error;
pub mod json;
pub mod render_flat;
pub mod render_json;
pub mod render_tree;

mod format;

pub use config::{OutputMode, RenderConfig};
pub use driver::{DefaultDriver, RecordDriver};
pub use error::RenderError;
pub use json::{json_to_record, json_to_value, value_to_json};
