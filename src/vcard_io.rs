//! vCard wire format: unfolding, block parsing, and 3.0 serialization.
//!
//! Input may be vCard 2.1, 3.0 or 4.0 with CRLF or LF terminators; output is
//! always folded vCard 3.0 with CRLF. Fields the tool does not manage are
//! carried through from the original block byte-for-byte (modulo folding).

use time::{Date, OffsetDateTime};

use crate::contact::{new_id, Contact, StructuredName};
use crate::quoted_printable;

const BEGIN_VCARD: &str = "BEGIN:VCARD";
const END_VCARD: &str = "END:VCARD";
const DEFAULT_VERSION: &str = "3.0";
const FALLBACK_DISPLAY_NAME: &str = "Unnamed";
const PROD_ID: &str = "-//vdeck//vdeck 0.1.0//EN";
const FOLD_WIDTH: usize = 75;
const EXPORT_FILE_PREFIX: &str = "vdeck_export";

/// Fields re-derived from the structured contact on export. Everything else
/// found in the original block is passed through verbatim.
const MANAGED_FIELDS: [&str; 8] = [
    "FN", "N", "ORG", "TEL", "EMAIL", "NOTE", "VERSION", "PRODID",
];

// =============================================================================
// Tokenizer
// =============================================================================

/// Unfold physically wrapped lines into logical lines.
///
/// Splits on CRLF or LF; a line starting with a space or tab continues the
/// previous logical line with its first whitespace character dropped. Blank
/// lines are discarded.
pub fn unfold_lines(raw: &str) -> Vec<String> {
    let mut unfolded: Vec<String> = Vec::new();
    for line in raw.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.starts_with([' ', '\t']) {
            if let Some(prev) = unfolded.last_mut() {
                prev.push_str(&line[1..]);
                continue;
            }
        }
        if !line.trim().is_empty() {
            unfolded.push(line.to_string());
        }
    }
    unfolded
}

// =============================================================================
// Block parser
// =============================================================================

/// A decoded field value with its ordered parameters.
#[derive(Debug, Clone)]
pub struct FieldValue {
    pub value: String,
    pub params: Vec<(String, String)>,
}

impl FieldValue {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Mapping from normalized field name to its values, in order of first
/// occurrence. A plain association list: the handful of fields per card
/// never justifies a hash map, and iteration order stays obvious.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    entries: Vec<(String, Vec<FieldValue>)>,
}

impl FieldMap {
    pub fn get(&self, name: &str) -> Option<&[FieldValue]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// First value recorded for `name`, if any is non-empty.
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|values| values.first())
            .map(|v| v.value.as_str())
            .filter(|v| !v.is_empty())
    }

    /// All non-blank values recorded for `name`.
    pub fn non_blank_values(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|values| {
                values
                    .iter()
                    .map(|v| v.value.clone())
                    .filter(|v| !v.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn push(&mut self, name: &str, value: FieldValue) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name.to_string(), vec![value])),
        }
    }
}

/// One tokenized BEGIN/END block.
#[derive(Debug, Clone)]
pub struct ParsedCard {
    pub version: String,
    pub fields: FieldMap,
}

fn is_marker_line(line: &str) -> bool {
    let upper = line.to_ascii_uppercase();
    upper.starts_with("BEGIN:") || upper.starts_with("END:")
}

/// Tokenize a single vCard block into a field map.
///
/// Lines without a colon are ignored, as are the BEGIN/END markers. Values
/// carrying `ENCODING=QUOTED-PRINTABLE`, or looking quoted-printable when
/// no encoding parameter is present, are decoded with the field's CHARSET.
pub fn parse_card_block(block: &str) -> ParsedCard {
    let mut fields = FieldMap::default();
    let mut version = DEFAULT_VERSION.to_string();

    for line in unfold_lines(block) {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_marker_line(trimmed) {
            continue;
        }

        let Some(colon) = trimmed.find(':') else {
            continue;
        };
        let header = &trimmed[..colon];
        let mut value = trimmed[colon + 1..].to_string();

        let mut segments = header.split(';');
        let field_name = match segments.next() {
            Some(name) => name.trim().to_ascii_uppercase(),
            None => continue,
        };

        let mut params: Vec<(String, String)> = Vec::new();
        for segment in segments {
            // Parameters without '=' (bare vCard 2.1 types) are dropped.
            if let Some(eq) = segment.find('=') {
                let key = segment[..eq].trim().to_ascii_uppercase();
                let val = segment[eq + 1..].trim().to_string();
                params.push((key, val));
            }
        }

        if field_name == "VERSION" {
            version = value.clone();
        }

        let encoding = params
            .iter()
            .find(|(k, _)| k == "ENCODING")
            .map(|(_, v)| v.as_str())
            .unwrap_or("");
        let charset = params
            .iter()
            .find(|(k, _)| k == "CHARSET")
            .map(|(_, v)| v.as_str())
            .unwrap_or("utf-8");

        if encoding.eq_ignore_ascii_case("QUOTED-PRINTABLE")
            || (encoding.is_empty() && quoted_printable::looks_quoted_printable(&value))
        {
            value = quoted_printable::decode(&value, charset);
        }

        fields.push(&field_name, FieldValue { value, params });
    }

    ParsedCard { version, fields }
}

/// Locate every BEGIN:VCARD .. END:VCARD span, case-insensitively. A BEGIN
/// with no matching END is dropped; content outside blocks is ignored.
fn extract_card_blocks(input: &str) -> Vec<&str> {
    // ASCII uppercasing keeps byte offsets valid for slicing the original.
    let upper = input.to_ascii_uppercase();
    let mut blocks = Vec::new();
    let mut pos = 0;
    while let Some(begin) = upper[pos..].find(BEGIN_VCARD) {
        let start = pos + begin;
        let Some(end) = upper[start..].find(END_VCARD) else {
            break;
        };
        let end = start + end + END_VCARD.len();
        blocks.push(&input[start..end]);
        pos = end;
    }
    blocks
}

/// Parse a whole file worth of vCard text into contacts.
///
/// Blocks are parsed independently; a malformed block yields at worst a
/// sparsely populated contact and never aborts the rest of the batch.
pub fn parse_vcards(input: &str) -> Vec<Contact> {
    extract_card_blocks(input)
        .into_iter()
        .map(contact_from_block)
        .collect()
}

fn contact_from_block(block: &str) -> Contact {
    let parsed = parse_card_block(block);
    let fields = &parsed.fields;

    let display_name = fields
        .first_value("FN")
        .or_else(|| fields.first_value("N"))
        .unwrap_or(FALLBACK_DISPLAY_NAME)
        .to_string();

    Contact {
        id: new_id(),
        display_name,
        name: fields.first_value("N").map(parse_structured_name),
        org: fields.first_value("ORG").map(str::to_string),
        tel: fields.non_blank_values("TEL"),
        email: fields.non_blank_values("EMAIL"),
        note: fields.first_value("NOTE").map(str::to_string),
        version: Some(parsed.version),
        raw_card: Some(block.to_string()),
    }
}

/// Split an N value into its five positional components.
/// Format: Family;Given;Additional;Prefix;Suffix, each optional.
fn parse_structured_name(value: &str) -> StructuredName {
    let parts: Vec<&str> = value.split(';').collect();
    let slot = |idx: usize| {
        parts
            .get(idx)
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(String::from)
    };
    StructuredName {
        family: slot(0),
        given: slot(1),
        additional: slot(2),
        prefix: slot(3),
        suffix: slot(4),
    }
}

// =============================================================================
// Serializer
// =============================================================================

/// Escape a value for emission: backslash, semicolon, comma and newline.
pub fn escape_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

/// Fold a logical line at 75 characters; continuations get a leading space.
/// Operates on the already-escaped text.
fn fold_line(line: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = line.to_string();
    while current.chars().count() > FOLD_WIDTH {
        let split = current
            .char_indices()
            .nth(FOLD_WIDTH)
            .map(|(idx, _)| idx)
            .unwrap_or(current.len());
        let rest = current.split_off(split);
        lines.push(current);
        current = format!(" {rest}");
    }
    lines.push(current);
    lines
}

fn push_folded(lines: &mut Vec<String>, line: String) {
    lines.extend(fold_line(&line));
}

/// Render one contact as a vCard 3.0 block.
///
/// Managed fields are re-derived from the structured contact; every other
/// logical line of the original block (addresses, photos, vendor X- fields)
/// is spliced back in unchanged before the end marker.
pub fn contact_to_vcard(contact: &Contact) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(BEGIN_VCARD.to_string());
    lines.push(format!("VERSION:{DEFAULT_VERSION}"));
    lines.push(format!("PRODID:{PROD_ID}"));

    push_folded(
        &mut lines,
        format!("FN:{}", escape_value(&contact.display_name)),
    );

    match &contact.name {
        Some(name) => {
            let components = [
                name.family.as_deref().unwrap_or(""),
                name.given.as_deref().unwrap_or(""),
                name.additional.as_deref().unwrap_or(""),
                name.prefix.as_deref().unwrap_or(""),
                name.suffix.as_deref().unwrap_or(""),
            ];
            let joined = components
                .iter()
                .map(|c| escape_value(c))
                .collect::<Vec<_>>()
                .join(";");
            push_folded(&mut lines, format!("N:{joined}"));
        }
        None => {
            push_folded(
                &mut lines,
                format!("N:{};;;", escape_value(&contact.display_name)),
            );
        }
    }

    if let Some(org) = contact.org.as_deref() {
        if !org.is_empty() {
            push_folded(&mut lines, format!("ORG:{}", escape_value(org)));
        }
    }

    for tel in &contact.tel {
        if !tel.trim().is_empty() {
            push_folded(&mut lines, format!("TEL:{}", escape_value(tel)));
        }
    }

    for email in &contact.email {
        if !email.trim().is_empty() {
            push_folded(&mut lines, format!("EMAIL:{}", escape_value(email)));
        }
    }

    if let Some(note) = contact.note.as_deref() {
        if !note.is_empty() {
            push_folded(&mut lines, format!("NOTE:{}", escape_value(note)));
        }
    }

    if let Some(raw) = contact.raw_card.as_deref() {
        for line in unmanaged_lines(raw) {
            push_folded(&mut lines, line);
        }
    }

    lines.push(END_VCARD.to_string());
    lines.join("\r\n")
}

/// Render the whole working set, blocks joined by CRLF.
pub fn contacts_to_vcard_file(contacts: &[Contact]) -> String {
    contacts
        .iter()
        .map(contact_to_vcard)
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// Logical lines of the original block whose field the tool does not manage.
fn unmanaged_lines(raw: &str) -> Vec<String> {
    unfold_lines(raw)
        .into_iter()
        .filter(|line| {
            let Some(colon) = line.find(':') else {
                return false;
            };
            let name = line[..colon]
                .split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_uppercase();
            name != "BEGIN" && name != "END" && !MANAGED_FIELDS.contains(&name.as_str())
        })
        .collect()
}

// =============================================================================
// Export filename
// =============================================================================

/// Export filename for a given date: `vdeck_export_YYYYMMDD.vcf`.
pub fn export_filename(date: Date) -> String {
    format!(
        "{}_{:04}{:02}{:02}.vcf",
        EXPORT_FILE_PREFIX,
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Export filename for today (UTC).
pub fn suggested_export_filename() -> String {
    export_filename(OffsetDateTime::now_utc().date())
}
