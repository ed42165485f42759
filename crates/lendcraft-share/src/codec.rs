//! The `MTG1:` share code.
//!
//! Wire format: `"MTG1:" + base64url(zlib(utf8(json array of events)))`,
//! base64url without `=` padding. The tag names both the protocol and its
//! version; it must change whenever the event schema changes incompatibly so
//! that older decoders fail cleanly instead of misreading a payload.
//!
//! The codec only checks structure. It does not deduplicate, order or
//! validate events; decoded records are checked by the event model before
//! they reach a store.

use std::io::{Read as _, Write as _};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};
use lendcraft_core::fact::{LendingEvent, RawEvent};

use crate::error::CodecError;

/// Prefix of every share code produced by this version of the format.
pub const FORMAT_TAG: &str = "MTG1:";

/// Encode `events` as a share code.
pub fn encode(events: &[LendingEvent]) -> Result<String, CodecError> {
  let json = serde_json::to_vec(events)?;

  let mut deflater = ZlibEncoder::new(Vec::new(), Compression::default());
  deflater.write_all(&json)?;
  let compressed = deflater.finish()?;

  Ok(format!("{FORMAT_TAG}{}", URL_SAFE_NO_PAD.encode(compressed)))
}

/// Decode a share code into its event records.
///
/// Surrounding whitespace and stray `=` padding are tolerated. Anything else
/// that is not exactly a tagged, compressed JSON array of objects is an
/// error, and no partial result is returned.
pub fn decode(code: &str) -> Result<Vec<RawEvent>, CodecError> {
  let code = code.trim();
  let body = match code.strip_prefix(FORMAT_TAG) {
    Some(body) => body,
    None => return Err(unrecognised_tag(code)),
  };

  let compressed = URL_SAFE_NO_PAD.decode(body.trim_end_matches('='))?;

  let mut json = Vec::new();
  ZlibDecoder::new(compressed.as_slice()).read_to_end(&mut json)?;

  let value: serde_json::Value = serde_json::from_slice(&json)?;
  if !value.is_array() {
    return Err(CodecError::NotAnArray);
  }
  Ok(serde_json::from_value(value)?)
}

/// Distinguish a later version of this format (`MTG2:…`) from text that is
/// not a share code at all.
fn unrecognised_tag(code: &str) -> CodecError {
  let Some((tag, _)) = code.split_once(':') else {
    return CodecError::MissingTag;
  };
  let is_versioned_tag = tag.len() > 3
    && tag.starts_with("MTG")
    && tag[3..].bytes().all(|b| b.is_ascii_digit());

  if is_versioned_tag {
    CodecError::UnsupportedVersion(format!("{tag}:"))
  } else {
    CodecError::MissingTag
  }
}
