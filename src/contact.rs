//! Plain data model for the working set: contacts, structured names and
//! prefix/suffix decoration items. All types are serde-serializable so the
//! whole set can round-trip through the JSON state file.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single imported contact.
///
/// `raw_card` holds the unmodified BEGIN/END block the contact was parsed
/// from; the serializer uses it to re-emit fields this tool does not manage.
/// Contacts never created by the parser carry no raw block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub display_name: String,
    pub name: Option<StructuredName>,
    pub org: Option<String>,
    pub tel: Vec<String>,
    pub email: Vec<String>,
    pub note: Option<String>,
    pub version: Option<String>,
    pub raw_card: Option<String>,
}

impl Contact {
    /// Create an empty contact with a fresh id.
    pub fn new(display_name: impl Into<String>) -> Self {
        Contact {
            id: new_id(),
            display_name: display_name.into(),
            name: None,
            org: None,
            tel: Vec::new(),
            email: Vec::new(),
            note: None,
            version: None,
            raw_card: None,
        }
    }
}

/// The five components of a vCard N field. Each is independent: a missing
/// family name says nothing about the given name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredName {
    pub family: Option<String>,
    pub given: Option<String>,
    pub additional: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

/// Whether a decoration item attaches before or after the target text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecorationRole {
    Prefix,
    Suffix,
}

/// One prefix or suffix token. List order is significant: enabled items are
/// concatenated in the order they appear in their containing list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecorationItem {
    pub id: String,
    pub text: String,
    pub enabled: bool,
    pub role: DecorationRole,
}

impl DecorationItem {
    pub fn new(text: impl Into<String>, role: DecorationRole) -> Self {
        DecorationItem {
            id: new_id(),
            text: text.into(),
            enabled: true,
            role,
        }
    }
}

/// Everything the tool persists between invocations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkingSet {
    pub contacts: Vec<Contact>,
    pub name_prefixes: Vec<DecorationItem>,
    pub name_suffixes: Vec<DecorationItem>,
    pub org_prefixes: Vec<DecorationItem>,
    pub org_suffixes: Vec<DecorationItem>,
}

/// Mint an opaque unique id. Uniqueness and stability are the only
/// requirements; the concrete format is not load-bearing.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
