//! Byte-to-text decoding for uploaded documents

use serde::{Deserialize, Serialize};
use tracing::warn;

use docchat_core::{Error, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Text encodings understood by the ingestion pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    Utf8,
    Iso8859_1,
}

impl TextEncoding {
    /// Parse an encoding label such as `UTF-8`, `utf8`, `latin1` or `ISO-8859-1`
    pub fn from_label(label: &str) -> Result<Self> {
        let normalized: String = label
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();

        match normalized.as_str() {
            "utf8" => Ok(TextEncoding::Utf8),
            "iso88591" | "latin1" | "l1" => Ok(TextEncoding::Iso8859_1),
            _ => Err(Error::Decoding(format!("unsupported text encoding '{}'", label))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Iso8859_1 => "iso-8859-1",
        }
    }
}

/// Decoded document text with the encoding actually used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
}

/// Decode raw bytes.
///
/// With no declared encoding the bytes are tried as strict UTF-8 first and fall back to
/// ISO-8859-1, which accepts any byte sequence. A declared UTF-8 document is decoded
/// lossily: malformed sequences become U+FFFD rather than dropping the upload.
pub fn decode(bytes: &[u8], declared: Option<&str>) -> Result<DecodedText> {
    let declared = declared.map(TextEncoding::from_label).transpose()?;

    match declared {
        Some(TextEncoding::Utf8) => {
            let text = String::from_utf8_lossy(strip_bom(bytes));
            if text.contains(char::REPLACEMENT_CHARACTER) {
                warn!("Replaced malformed UTF-8 sequences while decoding");
            }
            Ok(DecodedText {
                text: text.into_owned(),
                encoding: TextEncoding::Utf8,
            })
        }
        Some(TextEncoding::Iso8859_1) => Ok(DecodedText {
            text: latin1(bytes),
            encoding: TextEncoding::Iso8859_1,
        }),
        None => match std::str::from_utf8(strip_bom(bytes)) {
            Ok(text) => Ok(DecodedText {
                text: text.to_string(),
                encoding: TextEncoding::Utf8,
            }),
            Err(e) => {
                warn!(
                    "Content is not valid UTF-8 ({}), falling back to ISO-8859-1",
                    e
                );
                Ok(DecodedText {
                    text: latin1(bytes),
                    encoding: TextEncoding::Iso8859_1,
                })
            }
        },
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

// ISO-8859-1 maps each byte to the code point of the same value
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
