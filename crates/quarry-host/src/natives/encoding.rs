// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! UTF-8 encoding natives

use quarry_engine::{Exception, JsObject, Value};
use std::sync::Arc;

/// The only encoding label the decoder accepts, in canonical form.
pub const UTF8_LABEL: &str = "utf-8";

/// Encodes a string as UTF-8 bytes.
pub fn encode_utf8(s: &str) -> Arc<[u8]> {
    Arc::from(s.as_bytes())
}

/// Decodes `bytes[offset..offset + length]` as UTF-8.
///
/// `length` defaults to the rest of the buffer. Out-of-range windows are a
/// `RangeError`. With `fatal` set, invalid UTF-8 is a `TypeError`; otherwise
/// invalid sequences become U+FFFD.
pub fn decode_utf8(
    bytes: &[u8],
    offset: usize,
    length: Option<usize>,
    fatal: bool,
) -> Result<String, Exception> {
    if offset > bytes.len() {
        return Err(Exception::range_error(format!(
            "offset {} is outside the bounds of a buffer of length {}",
            offset,
            bytes.len()
        )));
    }
    let end = match length {
        None => bytes.len(),
        Some(length) => offset
            .checked_add(length)
            .filter(|end| *end <= bytes.len())
            .ok_or_else(|| {
                Exception::range_error(format!(
                    "length {} at offset {} is outside the bounds of a buffer of length {}",
                    length,
                    offset,
                    bytes.len()
                ))
            })?,
    };

    let window = &bytes[offset..end];
    if fatal {
        std::str::from_utf8(window).map(str::to_owned).map_err(|err| {
            Exception::type_error(format!("the encoded data was not valid UTF-8: {}", err))
        })
    } else {
        Ok(String::from_utf8_lossy(window).into_owned())
    }
}

/// `TextEncoder()`: an object whose `encode(text)` returns an ArrayBuffer.
pub fn text_encoder() -> Value {
    Value::native("TextEncoder", |_, _| {
        let encoder = JsObject::new();
        encoder.set("encoding", Value::from(UTF8_LABEL));
        encoder.set(
            "encode",
            Value::native("encode", |_, args| {
                let text = match args.first() {
                    None | Some(Value::Undefined) => String::new(),
                    Some(value) => value.to_string(),
                };
                Ok(Value::ArrayBuffer(encode_utf8(&text)))
            }),
        );
        Ok(Value::Object(encoder))
    })
}

/// `TextDecoder(label?, { fatal })`: an object whose `decode(buffer)`
/// returns a string.
pub fn text_decoder() -> Value {
    Value::native("TextDecoder", |_, args| {
        if let Some(label) = args.first().filter(|label| !label.is_undefined()) {
            let label = label.to_string();
            let canonical = label.trim().to_ascii_lowercase();
            if !matches!(canonical.as_str(), "utf-8" | "utf8" | "unicode-1-1-utf-8") {
                return Err(Exception::range_error(format!(
                    "the encoding label '{}' is not supported",
                    label
                )));
            }
        }
        let fatal = match args.get(1) {
            Some(options) if !options.is_nullish() => options.get("fatal")?.to_boolean(),
            _ => false,
        };

        let decoder = JsObject::new();
        decoder.set("encoding", Value::from(UTF8_LABEL));
        decoder.set("fatal", Value::Boolean(fatal));
        decoder.set(
            "decode",
            Value::native("decode", move |_, args| match args.first() {
                None | Some(Value::Undefined) => Ok(Value::string("")),
                Some(Value::ArrayBuffer(bytes)) => {
                    decode_utf8(bytes, 0, None, fatal).map(Value::String)
                }
                Some(_) => Err(Exception::type_error("decode: expected an ArrayBuffer")),
            }),
        );
        Ok(Value::Object(decoder))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_engine::Realm;

    #[test]
    fn test_round_trip() {
        for s in ["", "ascii", "héllo wörld", "日本語", "emoji 🦀"] {
            let bytes = encode_utf8(s);
            assert_eq!(decode_utf8(&bytes, 0, None, true).unwrap(), s);
        }
    }

    #[test]
    fn test_offset_and_length() {
        let bytes = encode_utf8("hello world");
        assert_eq!(decode_utf8(&bytes, 6, None, false).unwrap(), "world");
        assert_eq!(decode_utf8(&bytes, 0, Some(5), false).unwrap(), "hello");
        assert_eq!(decode_utf8(&bytes, 11, None, false).unwrap(), "");
    }

    #[test]
    fn test_out_of_bounds_is_range_error() {
        let bytes = encode_utf8("abc");
        let err = decode_utf8(&bytes, 4, None, false).unwrap_err();
        assert!(err.message().starts_with("RangeError"));
        let err = decode_utf8(&bytes, 2, Some(2), false).unwrap_err();
        assert!(err.message().starts_with("RangeError"));
        assert!(decode_utf8(&bytes, 1, Some(usize::MAX), false).is_err());
    }

    #[test]
    fn test_fatal_rejects_invalid_sequences() {
        let bytes = [0x61, 0xff, 0x62];
        assert_eq!(decode_utf8(&bytes, 0, None, false).unwrap(), "a\u{fffd}b");
        assert!(decode_utf8(&bytes, 0, None, true).is_err());
    }

    #[test]
    fn test_encoder_and_decoder_objects() {
        let mut realm = Realm::new();
        let encoder = realm.call(&text_encoder(), &[]).unwrap();
        let bytes = realm.call(&encoder.get("encode").unwrap(), &[Value::from("日本")]).unwrap();
        assert_eq!(bytes.get("byteLength").unwrap(), Value::Number(6.0));

        let decoder = realm.call(&text_decoder(), &[Value::from("UTF-8")]).unwrap();
        let text = realm.call(&decoder.get("decode").unwrap(), &[bytes]).unwrap();
        assert_eq!(text, Value::from("日本"));
        assert_eq!(decoder.get("fatal").unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_fatal_decoder_and_unknown_label() {
        let mut realm = Realm::new();
        let options = JsObject::new();
        options.set("fatal", Value::Boolean(true));
        let decoder = realm
            .call(&text_decoder(), &[Value::Undefined, Value::Object(options)])
            .unwrap();
        let invalid = Value::ArrayBuffer(Arc::from(&[0xffu8][..]));
        let err = realm.call(&decoder.get("decode").unwrap(), &[invalid]).unwrap_err();
        assert!(err.message().starts_with("TypeError"));

        let err = realm.call(&text_decoder(), &[Value::from("latin1")]).unwrap_err();
        assert!(err.message().starts_with("RangeError"));
    }
}
