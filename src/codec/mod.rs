//! # JSON Codec
//!
//! Mapping between store property values and JSON. Types JSON cannot
//! carry natively travel as tagged strings: ISO-8601 for dates, a `key:`
//! prefix for references and a `text:` prefix for text blobs.

pub mod errors;
pub mod json;

pub use errors::{CodecError, CodecResult};
pub use json::{apply_json, entity_to_json, from_json, parse_body, to_json, KEY_FIELD};
