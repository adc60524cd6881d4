//! Binary codec between embedded data strings and raw image bytes.
//!
//! An embedded data string has the shape `data:<mime>;base64,<payload>`.
//! Older sessions also stored bare base64 text without the header, which
//! [`decode_base64_lenient`] accepts.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD as BASE64_STANDARD, STANDARD_NO_PAD};

use pixshop_core::PixshopError;
use pixshop_core::history::DATA_URL_PREFIX;
use pixshop_core::image::DEFAULT_IMAGE_MIME;

const BASE64_MARKER: &str = ";base64";

/// Bytes and MIME type recovered from an embedded data string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl DecodedImage {
    /// Returns true when the payload decoded to zero bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encodes bytes as `data:<mime>;base64,<payload>`.
pub fn encode_data_url(bytes: &[u8], mime_type: &str) -> String {
    let mime_type = if mime_type.trim().is_empty() {
        DEFAULT_IMAGE_MIME
    } else {
        mime_type.trim()
    };
    format!(
        "{DATA_URL_PREFIX}{mime_type}{BASE64_MARKER},{}",
        BASE64_STANDARD.encode(bytes)
    )
}

/// Decodes an embedded data string.
///
/// Fails with `MalformedDataUrl` when there is no comma-delimited base64
/// section. A missing or unparseable MIME type falls back to sniffing the
/// decoded bytes and finally to `image/png`. An empty payload yields an
/// empty [`DecodedImage`] rather than an error.
pub fn decode_data_url(source: &str) -> Result<DecodedImage, PixshopError> {
    let rest = source
        .trim()
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| PixshopError::malformed_data_url("missing 'data:' prefix"))?;

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PixshopError::malformed_data_url("missing ',' before payload"))?;

    let declared_mime = header
        .strip_suffix(BASE64_MARKER)
        .ok_or_else(|| PixshopError::malformed_data_url("payload is not base64 encoded"))?;

    let bytes = decode_base64_lenient(payload)?;

    let mime_type = match parse_mime(declared_mime) {
        Some(mime) => mime,
        None => sniff_mime(&bytes).unwrap_or(DEFAULT_IMAGE_MIME).to_string(),
    };

    Ok(DecodedImage { bytes, mime_type })
}

/// Decodes base64 text that may or may not carry a data-URL header.
///
/// Whitespace is ignored and both padded and unpadded forms are accepted.
pub fn decode_base64_lenient(text: &str) -> Result<Vec<u8>, PixshopError> {
    let payload = if text.trim_start().starts_with(DATA_URL_PREFIX) {
        match text.split_once(',') {
            Some((_, payload)) => payload,
            None => return Err(PixshopError::malformed_data_url("missing ',' before payload")),
        }
    } else {
        text
    };

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Ok(Vec::new());
    }

    BASE64_STANDARD
        .decode(compact.as_bytes())
        .or_else(|_| STANDARD_NO_PAD.decode(compact.trim_end_matches('=').as_bytes()))
        .map_err(|e| PixshopError::malformed_data_url(format!("invalid base64 payload: {e}")))
}

/// Detects an image MIME type from the leading magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.is_empty() {
        return None;
    }
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type())
}

/// Guesses a MIME type from a file name's extension.
pub fn mime_for_name(name: &str) -> Option<String> {
    mime_guess::from_path(name)
        .first()
        .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .map(|mime| mime.essence_str().to_string())
}

/// Accepts `type/subtype` with optional parameters, keeping only the essence.
fn parse_mime(declared: &str) -> Option<String> {
    let essence = declared.split(';').next().unwrap_or_default().trim();
    let (kind, subtype) = essence.split_once('/')?;
    let valid = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    };
    if valid(kind) && valid(subtype) {
        Some(essence.to_ascii_lowercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_encode_data_url_shape() {
        let url = encode_data_url(b"hi", "image/jpeg");
        assert_eq!(url, "data:image/jpeg;base64,aGk=");
    }

    #[test]
    fn test_encode_blank_mime_defaults_to_png() {
        let url = encode_data_url(b"hi", "  ");
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_decode_data_url() {
        let decoded = decode_data_url("data:image/webp;base64,aGk=").unwrap();
        assert_eq!(decoded.bytes, b"hi");
        assert_eq!(decoded.mime_type, "image/webp");
    }

    #[test]
    fn test_decode_without_comma_is_malformed() {
        let err = decode_data_url("data:image/png;base64").unwrap_err();
        assert!(matches!(err, PixshopError::MalformedDataUrl(_)));
    }

    #[test]
    fn test_decode_without_base64_marker_is_malformed() {
        let err = decode_data_url("data:text/plain,hello").unwrap_err();
        assert!(matches!(err, PixshopError::MalformedDataUrl(_)));
    }

    #[test]
    fn test_unparseable_mime_falls_back_to_png() {
        let decoded = decode_data_url("data:???;base64,aGk=").unwrap();
        assert_eq!(decoded.mime_type, "image/png");
    }

    #[test]
    fn test_missing_mime_is_sniffed() {
        let url = format!(";base64,{}", BASE64_STANDARD.encode(PNG_MAGIC));
        let decoded = decode_data_url(&format!("data:{url}")).unwrap();
        assert_eq!(decoded.mime_type, "image/png");
        assert_eq!(decoded.bytes, PNG_MAGIC);
    }

    #[test]
    fn test_empty_payload_is_not_an_error() {
        let decoded = decode_data_url("data:image/png;base64,").unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_lenient_accepts_bare_unpadded_and_wrapped_text() {
        assert_eq!(decode_base64_lenient("aGk=").unwrap(), b"hi");
        assert_eq!(decode_base64_lenient("aGk").unwrap(), b"hi");
        assert_eq!(decode_base64_lenient("aG\nk=\n").unwrap(), b"hi");
        assert_eq!(
            decode_base64_lenient("data:image/png;base64,aGk=").unwrap(),
            b"hi"
        );
    }

    #[test]
    fn test_lenient_rejects_garbage() {
        assert!(decode_base64_lenient("%%not base64%%").is_err());
    }

    #[test]
    fn test_sniff_mime() {
        assert_eq!(sniff_mime(PNG_MAGIC), Some("image/png"));
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_mime(b""), None);
    }

    #[test]
    fn test_mime_for_name() {
        assert_eq!(mime_for_name("photo.JPG").as_deref(), Some("image/jpeg"));
        assert_eq!(mime_for_name("notes.txt"), None);
    }
}
