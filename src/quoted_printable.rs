//! Quoted-printable decoding for legacy vCard 2.1 payloads.
//!
//! Old exporters wrap non-ASCII field values in RFC 2045 quoted-printable,
//! frequently on top of EUC-KR rather than UTF-8. Decoding is total: any
//! malformed escape or charset problem degrades to a lossy byte-level
//! interpretation instead of failing the caller.

/// Decode a quoted-printable payload into text.
///
/// Soft line breaks (`=` immediately before a line terminator) are removed,
/// `=XX` hex escapes become single bytes, and everything else contributes
/// its UTF-8 bytes. The assembled buffer is then interpreted according to
/// `charset`: `utf-8`/`utf8` (lossy) or `euc-kr`; anything else falls back
/// to lossy UTF-8.
pub fn decode(encoded: &str, charset: &str) -> String {
    let stripped = strip_soft_breaks(encoded);
    let raw = stripped.as_bytes();

    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'=' && i + 2 < raw.len() {
            if let (Some(hi), Some(lo)) = (hex_value(raw[i + 1]), hex_value(raw[i + 2])) {
                bytes.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        // Ordinary input byte. The source is already UTF-8, so copying the
        // byte reproduces the character's encoding.
        bytes.push(raw[i]);
        i += 1;
    }

    decode_charset(&bytes, charset)
}

fn strip_soft_breaks(text: &str) -> String {
    text.replace("=\r\n", "").replace("=\n", "")
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

fn decode_charset(bytes: &[u8], charset: &str) -> String {
    match charset.trim().to_ascii_lowercase().as_str() {
        "euc-kr" => decode_euc_kr(bytes),
        // utf-8, utf8 and anything unrecognized: permissive UTF-8.
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Decode EUC-KR bytes by range mapping into the Hangul syllable block.
///
/// Lead and trail bytes in 0xA1–0xFE form a two-byte syllable; the combined
/// index is offset into U+AC00..=U+D7A3. Bytes outside the expected ranges
/// pass through as single code points; legacy files are not always
/// well-formed.
fn decode_euc_kr(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b1 = bytes[i];
        if b1 < 0x80 {
            out.push(b1 as char);
            i += 1;
            continue;
        }
        if (0xA1..=0xFE).contains(&b1) && i + 1 < bytes.len() {
            let b2 = bytes[i + 1];
            if (0xA1..=0xFE).contains(&b2) {
                let code = (b1 as u32 - 0xA1) * 94 + (b2 as u32 - 0xA1) + 0xAC00;
                if code <= 0xD7A3 {
                    if let Some(c) = char::from_u32(code) {
                        out.push(c);
                        i += 2;
                        continue;
                    }
                }
            }
        }
        out.push(b1 as char);
        i += 1;
    }
    out
}

/// Heuristic: does this value look quoted-printable encoded?
///
/// True when the text contains `=` followed by two hex digits or by a line
/// terminator. Used for fields that carry no explicit ENCODING parameter.
pub fn looks_quoted_printable(text: &str) -> bool {
    let b = text.as_bytes();
    for (i, &c) in b.iter().enumerate() {
        if c != b'=' {
            continue;
        }
        if i + 2 < b.len() && hex_value(b[i + 1]).is_some() && hex_value(b[i + 2]).is_some() {
            return true;
        }
        if i + 1 < b.len() && (b[i + 1] == b'\r' || b[i + 1] == b'\n') {
            return true;
        }
    }
    false
}

/// Pull the `CHARSET=` value out of a raw field header, e.g.
/// `NOTE;CHARSET=EUC-KR;ENCODING=QUOTED-PRINTABLE`. Defaults to `utf-8`.
pub fn extract_charset(field_header: &str) -> String {
    match header_param(field_header, "CHARSET=") {
        Some(value) => value.trim().to_string(),
        None => "utf-8".to_string(),
    }
}

/// Pull the `ENCODING=` value out of a raw field header, upper-cased.
/// Defaults to the empty string.
pub fn extract_encoding(field_header: &str) -> String {
    header_param(field_header, "ENCODING=")
        .map(|value| value.trim().to_ascii_uppercase())
        .unwrap_or_default()
}

fn header_param(header: &str, key: &str) -> Option<String> {
    // ASCII-only uppercasing keeps byte offsets valid for the original.
    let upper = header.to_ascii_uppercase();
    let start = upper.find(key)? + key.len();
    let rest = &header[start..];
    let end = rest.find([';', ':']).unwrap_or(rest.len());
    let value = &rest[..end];
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
