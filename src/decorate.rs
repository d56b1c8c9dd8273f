//! Prefix/suffix decoration of contact names and organizations.
//!
//! Every transform is pure: it borrows a contact and returns a new one, so
//! callers can preview a batch without committing it and concurrent readers
//! never observe a half-updated record.

use std::collections::HashSet;

use thiserror::Error;

use crate::contact::{Contact, DecorationItem, DecorationRole};

/// Options governing how decoration tokens attach and detach.
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Skip a token when the target text already contains it. This is a
    /// plain substring check against the whole value, not an anchored one:
    /// a token in the middle of the name also counts as present.
    pub prevent_duplicates: bool,
    pub prefix_separator: String,
    pub suffix_separator: String,
    /// Also decorate the structured name's prefix/suffix components.
    pub apply_to_structured_name: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        ApplyOptions {
            prevent_duplicates: true,
            prefix_separator: " ".to_string(),
            suffix_separator: " ".to_string(),
            apply_to_structured_name: true,
        }
    }
}

/// Which variant of the four sub-operations a batch run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    Add,
    Remove,
}

fn enabled_texts(items: &[DecorationItem]) -> Vec<&str> {
    items
        .iter()
        .filter(|item| item.enabled)
        .map(|item| item.text.as_str())
        .collect()
}

fn prepend_tokens(mut value: String, texts: &[&str], options: &ApplyOptions) -> String {
    for text in texts {
        if options.prevent_duplicates && value.contains(text) {
            continue;
        }
        value = format!("{}{}{}", text, options.prefix_separator, value);
    }
    value
}

fn append_tokens(mut value: String, texts: &[&str], options: &ApplyOptions) -> String {
    for text in texts {
        if options.prevent_duplicates && value.contains(text) {
            continue;
        }
        value = format!("{}{}{}", value, options.suffix_separator, text);
    }
    value
}

/// Strip one leading occurrence of `text`, together with the configured
/// separator or whitespace run after it, whichever consumes more.
fn strip_leading_token(value: &str, text: &str, separator: &str) -> String {
    match value.strip_prefix(text) {
        Some(rest) => {
            let ws = rest.len() - rest.trim_start().len();
            let sep = if !separator.is_empty() && rest.starts_with(separator) {
                separator.len()
            } else {
                0
            };
            rest[ws.max(sep)..].to_string()
        }
        None => value.to_string(),
    }
}

/// Mirror of [`strip_leading_token`], anchored at the end of the string.
fn strip_trailing_token(value: &str, text: &str, separator: &str) -> String {
    match value.strip_suffix(text) {
        Some(head) => {
            let ws = head.len() - head.trim_end().len();
            let sep = if !separator.is_empty() && head.ends_with(separator) {
                separator.len()
            } else {
                0
            };
            head[..head.len() - ws.max(sep)].to_string()
        }
        None => value.to_string(),
    }
}

// =============================================================================
// Display-name and structured-name operations
// =============================================================================

/// Prepend every enabled prefix, in list order, to the display name and,
/// when configured, to the structured name's prefix component.
pub fn add_prefixes(
    contact: &Contact,
    prefixes: &[DecorationItem],
    options: &ApplyOptions,
) -> Contact {
    let texts = enabled_texts(prefixes);
    if texts.is_empty() {
        return contact.clone();
    }

    let mut updated = contact.clone();
    updated.display_name = prepend_tokens(updated.display_name, &texts, options);

    if options.apply_to_structured_name {
        if let Some(name) = updated.name.as_mut() {
            let component = name.prefix.take().unwrap_or_default();
            name.prefix = Some(prepend_tokens(component, &texts, options));
        }
    }

    updated
}

/// Append every enabled suffix, in list order, to the display name and,
/// when configured, to the structured name's suffix component.
pub fn add_suffixes(
    contact: &Contact,
    suffixes: &[DecorationItem],
    options: &ApplyOptions,
) -> Contact {
    let texts = enabled_texts(suffixes);
    if texts.is_empty() {
        return contact.clone();
    }

    let mut updated = contact.clone();
    updated.display_name = append_tokens(updated.display_name, &texts, options);

    if options.apply_to_structured_name {
        if let Some(name) = updated.name.as_mut() {
            let component = name.suffix.take().unwrap_or_default();
            name.suffix = Some(append_tokens(component, &texts, options));
        }
    }

    updated
}

/// Strip every enabled prefix from the front of the display name and, when
/// configured, from the structured name's prefix component.
pub fn remove_prefixes(
    contact: &Contact,
    prefixes: &[DecorationItem],
    options: &ApplyOptions,
) -> Contact {
    let texts = enabled_texts(prefixes);
    if texts.is_empty() {
        return contact.clone();
    }

    let mut updated = contact.clone();
    for text in &texts {
        updated.display_name =
            strip_leading_token(&updated.display_name, text, &options.prefix_separator);
    }

    if options.apply_to_structured_name {
        if let Some(name) = updated.name.as_mut() {
            if let Some(mut component) = name.prefix.take() {
                for text in &texts {
                    component = strip_leading_token(&component, text, &options.prefix_separator);
                }
                name.prefix = Some(component);
            }
        }
    }

    updated
}

/// Strip every enabled suffix from the end of the display name and, when
/// configured, from the structured name's suffix component.
pub fn remove_suffixes(
    contact: &Contact,
    suffixes: &[DecorationItem],
    options: &ApplyOptions,
) -> Contact {
    let texts = enabled_texts(suffixes);
    if texts.is_empty() {
        return contact.clone();
    }

    let mut updated = contact.clone();
    for text in &texts {
        updated.display_name =
            strip_trailing_token(&updated.display_name, text, &options.suffix_separator);
    }

    if options.apply_to_structured_name {
        if let Some(name) = updated.name.as_mut() {
            if let Some(mut component) = name.suffix.take() {
                for text in &texts {
                    component = strip_trailing_token(&component, text, &options.suffix_separator);
                }
                name.suffix = Some(component);
            }
        }
    }

    updated
}

// =============================================================================
// Organization operations
// =============================================================================

fn with_org(contact: &Contact, f: impl FnOnce(String) -> String) -> Contact {
    let mut updated = contact.clone();
    if let Some(org) = updated.org.take() {
        if org.is_empty() {
            updated.org = Some(org);
        } else {
            updated.org = Some(f(org));
        }
    }
    updated
}

/// Organization variant of [`add_prefixes`]; a no-op without an organization.
pub fn add_org_prefixes(
    contact: &Contact,
    prefixes: &[DecorationItem],
    options: &ApplyOptions,
) -> Contact {
    let texts = enabled_texts(prefixes);
    if texts.is_empty() {
        return contact.clone();
    }
    with_org(contact, |org| prepend_tokens(org, &texts, options))
}

/// Organization variant of [`add_suffixes`]; a no-op without an organization.
pub fn add_org_suffixes(
    contact: &Contact,
    suffixes: &[DecorationItem],
    options: &ApplyOptions,
) -> Contact {
    let texts = enabled_texts(suffixes);
    if texts.is_empty() {
        return contact.clone();
    }
    with_org(contact, |org| append_tokens(org, &texts, options))
}

/// Organization variant of [`remove_prefixes`].
pub fn remove_org_prefixes(
    contact: &Contact,
    prefixes: &[DecorationItem],
    options: &ApplyOptions,
) -> Contact {
    let texts = enabled_texts(prefixes);
    if texts.is_empty() {
        return contact.clone();
    }
    with_org(contact, |org| {
        let mut org = org;
        for text in &texts {
            org = strip_leading_token(&org, text, &options.prefix_separator);
        }
        org
    })
}

/// Organization variant of [`remove_suffixes`].
pub fn remove_org_suffixes(
    contact: &Contact,
    suffixes: &[DecorationItem],
    options: &ApplyOptions,
) -> Contact {
    let texts = enabled_texts(suffixes);
    if texts.is_empty() {
        return contact.clone();
    }
    with_org(contact, |org| {
        let mut org = org;
        for text in &texts {
            org = strip_trailing_token(&org, text, &options.suffix_separator);
        }
        org
    })
}

// =============================================================================
// Batch apply
// =============================================================================

/// Apply decorations to every selected contact; unselected ones pass
/// through untouched.
///
/// The four sub-operations run in fixed order (name prefixes, name
/// suffixes, org prefixes, org suffixes), each on the output of the
/// previous. All four run regardless of list contents; `action` picks the
/// add or remove variant for all of them.
#[allow(clippy::too_many_arguments)]
pub fn batch_apply(
    contacts: &[Contact],
    selected_ids: &HashSet<String>,
    name_prefixes: &[DecorationItem],
    name_suffixes: &[DecorationItem],
    org_prefixes: &[DecorationItem],
    org_suffixes: &[DecorationItem],
    action: BatchAction,
    options: &ApplyOptions,
) -> Vec<Contact> {
    contacts
        .iter()
        .map(|contact| {
            if !selected_ids.contains(&contact.id) {
                return contact.clone();
            }
            match action {
                BatchAction::Add => {
                    let step = add_prefixes(contact, name_prefixes, options);
                    let step = add_suffixes(&step, name_suffixes, options);
                    let step = add_org_prefixes(&step, org_prefixes, options);
                    add_org_suffixes(&step, org_suffixes, options)
                }
                BatchAction::Remove => {
                    let step = remove_prefixes(contact, name_prefixes, options);
                    let step = remove_suffixes(&step, name_suffixes, options);
                    let step = remove_org_prefixes(&step, org_prefixes, options);
                    remove_org_suffixes(&step, org_suffixes, options)
                }
            }
        })
        .collect()
}

// =============================================================================
// Decoration list management
// =============================================================================

/// Rejected list operations. These are expected user-input failures, kept
/// apart from I/O faults so the shell can print them and move on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecorationError {
    #[error("decoration text must not be empty")]
    EmptyText,
    #[error("\"{0}\" is already in the list")]
    DuplicateText(String),
}

/// Append a new item to a list, rejecting blank or duplicate text.
/// Returns the id of the created item.
pub fn add_item(
    list: &mut Vec<DecorationItem>,
    text: &str,
    role: DecorationRole,
) -> Result<String, DecorationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DecorationError::EmptyText);
    }
    if list.iter().any(|item| item.text == text) {
        return Err(DecorationError::DuplicateText(text.to_string()));
    }
    let item = DecorationItem::new(text, role);
    let id = item.id.clone();
    list.push(item);
    Ok(id)
}

/// Delete an item by id.
pub fn remove_item(list: &mut Vec<DecorationItem>, id: &str) -> bool {
    let before = list.len();
    list.retain(|item| item.id != id);
    list.len() != before
}

/// Flip an item's enabled flag.
pub fn toggle_item(list: &mut [DecorationItem], id: &str) -> bool {
    match list.iter_mut().find(|item| item.id == id) {
        Some(item) => {
            item.enabled = !item.enabled;
            true
        }
        None => false,
    }
}

/// Swap an item with its predecessor.
pub fn move_item_up(list: &mut [DecorationItem], index: usize) -> bool {
    if index == 0 || index >= list.len() {
        return false;
    }
    list.swap(index, index - 1);
    true
}

/// Swap an item with its successor.
pub fn move_item_down(list: &mut [DecorationItem], index: usize) -> bool {
    if index + 1 >= list.len() {
        return false;
    }
    list.swap(index, index + 1);
    true
}
