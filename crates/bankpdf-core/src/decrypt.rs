//! Password removal for protected statements
//!
//! Banks commonly mail statements encrypted with the standard security
//! handler. Unlocking decrypts every object with lopdf, drops the `/Encrypt`
//! entry from the trailer and re-serializes, so later stages see an ordinary
//! unprotected PDF.

use lopdf::encryption::DecryptionError;
use lopdf::{Document, Object};
use std::borrow::Cow;
use tracing::debug;

use crate::error::ConvertError;

/// Remove password protection from a document
///
/// Without a password, unprotected input is returned untouched and a
/// protected document is tried with the empty user password, which opens
/// statements that only carry an owner password. With a password, the
/// document is always rebuilt, even when it was never protected.
pub fn unlock<'a>(document: &'a [u8], password: Option<&str>) -> Result<Cow<'a, [u8]>, ConvertError> {
    let mut doc = match password.filter(|p| !p.is_empty()) {
        Some(password) => {
            let mut doc = load_document(document, ConvertError::InvalidCredentials)?;
            if is_protected(&doc) {
                open_protected(&mut doc, password)?;
            }
            doc
        }
        None => {
            if !has_encrypt_marker(document) {
                return Ok(Cow::Borrowed(document));
            }
            let mut doc = load_document(document, ConvertError::PasswordRequired)?;
            if !is_protected(&doc) {
                return Ok(Cow::Borrowed(document));
            }
            open_protected(&mut doc, "")?;
            doc
        }
    };

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(|e| {
        ConvertError::MalformedDocument(format!("Failed to save unlocked PDF: {}", e))
    })?;

    debug!(
        input_bytes = document.len(),
        output_bytes = buffer.len(),
        "Unlocked PDF"
    );
    Ok(Cow::Owned(buffer))
}

/// Decrypt a protected document in place and drop its `/Encrypt` entry
///
/// A rejected non-empty password falls back to the empty user password, so
/// an owner password still opens owner-only documents. Rejection maps to
/// `InvalidCredentials` when a password was given and to `PasswordRequired`
/// otherwise. Encryption lopdf cannot handle (AES, revision 4 and up) is
/// reported as `UnsupportedEncryption` whatever the password.
pub(crate) fn open_protected(doc: &mut Document, password: &str) -> Result<(), ConvertError> {
    let rejected = if password.is_empty() {
        ConvertError::PasswordRequired
    } else {
        ConvertError::InvalidCredentials
    };

    if !try_decrypt(doc, password)? {
        if password.is_empty() || !try_decrypt(doc, "")? {
            return Err(rejected);
        }
        debug!("Password rejected but document opens with an empty user password");
    }

    doc.trailer.remove(b"Encrypt");
    Ok(())
}

/// `Ok(false)` when the password is wrong, errors for everything else
fn try_decrypt(doc: &mut Document, password: &str) -> Result<bool, ConvertError> {
    match doc.decrypt(password) {
        Ok(()) => Ok(true),
        Err(lopdf::Error::Decryption(DecryptionError::IncorrectPassword)) => Ok(false),
        Err(lopdf::Error::Decryption(e @ DecryptionError::UnsupportedEncryption)) => {
            debug!("Decryption unsupported: {}", e);
            Err(ConvertError::UnsupportedEncryption(describe_scheme(doc)))
        }
        Err(e) => Err(ConvertError::MalformedDocument(format!(
            "Broken encryption dictionary: {}",
            e
        ))),
    }
}

/// `V`/`R` of the encryption dictionary, e.g. `AESV2 (V4 R4)`
fn describe_scheme(doc: &Document) -> String {
    let Ok(dict) = doc.get_encrypted() else {
        return "unknown scheme".to_string();
    };
    let version = dict.get(b"V").and_then(Object::as_i64).unwrap_or(0);
    let revision = dict.get(b"R").and_then(Object::as_i64).unwrap_or(0);
    let filter = dict
        .get_deref(b"CF", doc)
        .and_then(|o| o.as_dict())
        .and_then(|cf| cf.get_deref(b"StdCF", doc))
        .and_then(|o| o.as_dict())
        .and_then(|std| std.get(b"CFM"))
        .and_then(|o| o.as_name_str())
        .unwrap_or("Standard");
    format!("{} (V{} R{})", filter, version, revision)
}

/// Parse a PDF, classifying failures on encrypted input as `when_encrypted`
pub(crate) fn load_document(bytes: &[u8], when_encrypted: ConvertError) -> Result<Document, ConvertError> {
    Document::load_mem(bytes).map_err(|e| {
        if has_encrypt_marker(bytes) {
            debug!("Encrypted PDF could not be parsed: {}", e);
            when_encrypted
        } else {
            ConvertError::MalformedDocument(e.to_string())
        }
    })
}

/// Whether the trailer still references an encryption dictionary
pub fn is_protected(doc: &Document) -> bool {
    doc.trailer.get(b"Encrypt").is_ok()
}

fn has_encrypt_marker(bytes: &[u8]) -> bool {
    bytes.windows(b"/Encrypt".len()).any(|w| w == b"/Encrypt")
}
