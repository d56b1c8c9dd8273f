//! vdeck: import vCard contact files, bulk-edit display names and
//! organizations with configurable prefix/suffix tokens, and export the
//! result back to vCard 3.0.
//!
//! The engine is split into pure, total functions: [`vcard_io`] handles the
//! wire format (unfolding, parsing, serialization), [`quoted_printable`]
//! the legacy byte encodings, and [`decorate`] the name transforms. The
//! [`store`] and [`config`] modules are the thin persistence shell the CLI
//! binary drives.

pub mod config;
pub mod contact;
pub mod decorate;
pub mod quoted_printable;
pub mod store;
pub mod vcard_io;
