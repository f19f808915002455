//! Parsing of free-form model output.

pub mod html;
pub mod json;

pub use html::clean_wireframe_html;
pub use json::{extract_json_object, strip_fences, truncate_chars, JsonExtractor};
