//! Record decoders: raw payload bytes → lazy sequence of records or per-fragment errors.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::iter;

use crate::error::{DecodeError, FragmentRef};
use crate::types::{PayloadFormat, Record};
use crate::utils::config::PipelineDefaults;

use super::tools::flatten_object;

/// Lazy decode output. Errors cover one fragment only; the sequence continues after them.
pub type Decoded<'a> = Box<dyn Iterator<Item = Result<Record, DecodeError>> + 'a>;

/// Turns one item's payload into records. Must be stateless: workers share one decoder.
pub trait RecordDecoder: Send + Sync {
    fn decode<'a>(&'a self, raw: &'a [u8]) -> Decoded<'a>;
}

/// Build the bundled decoder for `format`, keyed on `key_field`.
pub fn decoder_for(format: PayloadFormat, key_field: &str) -> Box<dyn RecordDecoder> {
    match format {
        PayloadFormat::Ndjson => Box::new(NdjsonDecoder::new(key_field)),
        PayloadFormat::Envelope => Box::new(EnvelopeDecoder::new(key_field)),
    }
}

/// Build a record from a decoded JSON value: must be an object carrying `key_field`.
fn record_from_value(
    value: Value,
    key_field: &str,
    at: FragmentRef,
) -> Result<Record, DecodeError> {
    match value {
        Value::Object(obj) => record_from_object(&obj, key_field, at),
        _ => Err(DecodeError::NotAnObject { at }),
    }
}

fn record_from_object(
    obj: &Map<String, Value>,
    key_field: &str,
    at: FragmentRef,
) -> Result<Record, DecodeError> {
    let fields = flatten_object(obj);
    let key = fields
        .get(&key_field.to_lowercase())
        .filter(|k| !k.is_empty() && k.as_str() != "null")
        .cloned()
        .ok_or_else(|| DecodeError::MissingKey {
            at,
            field: key_field.to_string(),
        })?;
    Ok(Record::new(key, fields))
}

/// Newline-delimited JSON: one object per line.
///
/// Lines shorter than `min_fragment_len` bytes (after dropping a trailing `\r`) are skipped
/// without an error; that covers the empty fragment after the final newline.
#[derive(Clone, Debug)]
pub struct NdjsonDecoder {
    key_field: String,
    min_fragment_len: usize,
}

impl NdjsonDecoder {
    pub fn new(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            min_fragment_len: PipelineDefaults::MIN_FRAGMENT_LEN,
        }
    }

    pub fn with_min_fragment_len(mut self, min_fragment_len: usize) -> Self {
        self.min_fragment_len = min_fragment_len;
        self
    }

    fn parse_fragment(&self, at: FragmentRef, fragment: &[u8]) -> Result<Record, DecodeError> {
        let value: Value = serde_json::from_slice(fragment).map_err(|e| DecodeError::Syntax {
            at,
            message: e.to_string(),
        })?;
        record_from_value(value, &self.key_field, at)
    }
}

impl Default for NdjsonDecoder {
    fn default() -> Self {
        Self::new(PipelineDefaults::KEY_FIELD)
    }
}

impl RecordDecoder for NdjsonDecoder {
    fn decode<'a>(&'a self, raw: &'a [u8]) -> Decoded<'a> {
        let fragments = raw
            .split(|b| *b == b'\n')
            .scan(0_usize, |offset, fragment| {
                let start = *offset;
                *offset += fragment.len() + 1;
                Some((start, fragment))
            })
            .enumerate();
        Box::new(fragments.filter_map(move |(index, (offset, fragment))| {
            let fragment = fragment.strip_suffix(b"\r").unwrap_or(fragment);
            if fragment.len() < self.min_fragment_len {
                return None;
            }
            let at = FragmentRef {
                index,
                offset: Some(offset),
            };
            Some(self.parse_fragment(at, fragment))
        }))
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "Records", default)]
    records: Vec<Value>,
}

/// Event envelope: one JSON document with a top-level `"Records"` array; each entry is a fragment.
///
/// A payload that does not parse as an envelope yields a single error for fragment 0.
/// A blank payload yields nothing.
#[derive(Clone, Debug)]
pub struct EnvelopeDecoder {
    key_field: String,
}

impl EnvelopeDecoder {
    pub fn new(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
        }
    }
}

impl Default for EnvelopeDecoder {
    fn default() -> Self {
        Self::new(PipelineDefaults::KEY_FIELD)
    }
}

impl RecordDecoder for EnvelopeDecoder {
    fn decode<'a>(&'a self, raw: &'a [u8]) -> Decoded<'a> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Box::new(iter::empty());
        }
        match serde_json::from_slice::<Envelope>(raw) {
            Ok(envelope) => Box::new(envelope.records.into_iter().enumerate().map(
                move |(index, value)| {
                    let at = FragmentRef {
                        index,
                        offset: None,
                    };
                    record_from_value(value, &self.key_field, at)
                },
            )),
            Err(e) => Box::new(iter::once(Err(DecodeError::Syntax {
                at: FragmentRef {
                    index: 0,
                    offset: None,
                },
                message: format!("invalid envelope: {e}"),
            }))),
        }
    }
}

/// Number of entries in an envelope's `"Records"` array; 0 when the payload is not an envelope.
pub fn envelope_record_count(raw: &[u8]) -> usize {
    serde_json::from_slice::<Envelope>(raw)
        .map(|e| e.records.len())
        .unwrap_or(0)
}
