//! Engine module: decoders, payload tools, CLI plumbing

pub mod arg_parser;
pub mod cli;
pub mod decoder;
pub mod progress;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::{handle_run, layer_opts, run_owned_paths};
pub use decoder::{
    Decoded, EnvelopeDecoder, NdjsonDecoder, RecordDecoder, decoder_for, envelope_record_count,
};
pub use tools::{
    flatten_object, glob_match, is_excluded, path_to_item_string, relative_under, value_text,
};
