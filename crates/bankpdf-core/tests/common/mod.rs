//! In-process statement PDF builder for integration tests

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::encryption::{decrypt_object, get_encryption_key};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat, Stream};

pub const FONT_SIZE: i64 = 8;
pub const ROW_HEIGHT: f64 = 12.0;

/// Left edges of the five statement columns
pub const COLUMNS: [f64; 5] = [40.0, 100.0, 300.0, 380.0, 460.0];

pub const HDFC_HEADER: [&str; 5] = [
    "Date",
    "Narration",
    "Chq/Ref No.",
    "Withdrawal Amt.",
    "Deposit Amt.",
];

/// A string drawn at a fixed position
#[derive(Debug, Clone)]
pub struct PlacedText {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

pub fn text_at(text: &str, x: f64, y: f64) -> PlacedText {
    PlacedText {
        text: text.to_string(),
        x,
        y,
    }
}

/// Lay rows out on the statement columns, starting at `top` and moving down
pub fn table(rows: &[&[&str]], top: f64) -> Vec<PlacedText> {
    let mut out = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let y = top - i as f64 * ROW_HEIGHT;
        for (cell, x) in row.iter().zip(COLUMNS) {
            if !cell.is_empty() {
                out.push(text_at(cell, x, y));
            }
        }
    }
    out
}

fn page_content(items: &[PlacedText]) -> Vec<u8> {
    let mut operations = Vec::new();
    for item in items {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![Object::Name(b"F1".to_vec()), Object::Integer(FONT_SIZE)],
        ));
        operations.push(Operation::new(
            "Td",
            vec![Object::Real(item.x as _), Object::Real(item.y as _)],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(
                item.text.clone().into_bytes(),
                StringFormat::Literal,
            )],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }.encode().unwrap()
}

fn build_document(pages: &[Vec<PlacedText>]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )]));

    let mut page_ids = Vec::new();
    for items in pages {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), page_content(items)));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(595),
                    Object::Integer(842),
                ]),
            ),
            ("Resources", Object::Reference(resources_id)),
            ("Contents", Object::Reference(content_id)),
        ]));
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(page_ids.len() as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// An unprotected PDF with one entry per page
pub fn statement_pdf(pages: &[Vec<PlacedText>]) -> Vec<u8> {
    save(build_document(pages))
}

/// Padding string of the standard security handler
const PASSWORD_PAD: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut state: Vec<u8> = (0..=255).collect();
    let mut j = 0u8;
    for i in 0..256 {
        j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
        state.swap(i, j as usize);
    }

    let (mut i, mut j) = (0u8, 0u8);
    data.iter()
        .map(|byte| {
            i = i.wrapping_add(1);
            j = j.wrapping_add(state[i as usize]);
            state.swap(i as usize, j as usize);
            byte ^ state[state[i as usize].wrapping_add(state[j as usize]) as usize]
        })
        .collect()
}

/// Attach an encryption dictionary and file identifier to the trailer
fn attach_encrypt(doc: &mut Document, encrypt: Dictionary) -> ObjectId {
    let encrypt_id = doc.add_object(encrypt);
    doc.trailer.set("Encrypt", Object::Reference(encrypt_id));
    let file_id = Object::String(vec![0x1D; 16], StringFormat::Hexadecimal);
    doc.trailer
        .set("ID", Object::Array(vec![file_id.clone(), file_id]));
    encrypt_id
}

fn standard_handler(version: i64, revision: i64, key_bits: i64) -> Dictionary {
    Dictionary::from_iter(vec![
        ("Filter", Object::Name(b"Standard".to_vec())),
        ("V", Object::Integer(version)),
        ("R", Object::Integer(revision)),
        ("Length", Object::Integer(key_bits)),
        ("O", Object::String(vec![0x4F; 32], StringFormat::Hexadecimal)),
        ("U", Object::String(vec![0x55; 32], StringFormat::Hexadecimal)),
        ("P", Object::Integer(-44)),
    ])
}

/// A PDF encrypted with the 40-bit RC4 standard handler under `user_password`
///
/// Every stream and string is encrypted with its per-object key, so only
/// the right password (or the empty one, when `user_password` is empty)
/// yields readable content.
pub fn encrypted_pdf(pages: &[Vec<PlacedText>], user_password: &str) -> Vec<u8> {
    let mut doc = build_document(pages);
    let encrypt_id = attach_encrypt(&mut doc, standard_handler(1, 2, 40));

    let key = get_encryption_key(&doc, user_password, false).unwrap();
    doc.get_object_mut(encrypt_id)
        .and_then(Object::as_dict_mut)
        .unwrap()
        .set(
            "U",
            Object::String(rc4(&key, &PASSWORD_PAD), StringFormat::Hexadecimal),
        );

    // RC4 is symmetric, so the object decryptor doubles as the encryptor.
    for (&id, object) in doc.objects.iter_mut() {
        if id == encrypt_id {
            continue;
        }
        let Ok(cipher) = decrypt_object(&key, id, &*object) else {
            continue;
        };
        match object {
            Object::Stream(stream) => stream.set_content(cipher),
            Object::String(bytes, _) => *bytes = cipher,
            _ => {}
        }
    }
    save(doc)
}

/// A PDF declaring AES-128 (V4 R4) security, which lopdf cannot decrypt
pub fn aes_encrypted_pdf(pages: &[Vec<PlacedText>]) -> Vec<u8> {
    let mut doc = build_document(pages);
    let std_cf = Object::Dictionary(Dictionary::from_iter(vec![
        ("CFM", Object::Name(b"AESV2".to_vec())),
        ("Length", Object::Integer(16)),
    ]));
    let mut handler = standard_handler(4, 4, 128);
    handler.set("CF", Object::Dictionary(Dictionary::from_iter(vec![("StdCF", std_cf)])));
    handler.set("StmF", Object::Name(b"StdCF".to_vec()));
    handler.set("StrF", Object::Name(b"StdCF".to_vec()));
    attach_encrypt(&mut doc, handler);
    save(doc)
}

/// Scenario A: one page, one table, one ATM withdrawal
pub fn single_withdrawal_pdf() -> Vec<u8> {
    statement_pdf(&[table(
        &[&HDFC_HEADER, &["01/04/2024", "ATM WDL", "", "500.00", ""]],
        700.0,
    )])
}
