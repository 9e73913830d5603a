use std::sync::LazyLock;

use folio_models::contact::{
    ContactAuthor, ContactSubject, ContactSubmission, Honeypot,
};
use serde_json::{json, Value};

pub const ANTI_BOT_TOKEN: &str = "tok";

pub static JOHN_DOE_JSON: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "name": "John Doe",
        "email": "john@example.com",
        "subject": "consulting",
        "message": "A".repeat(10),
        "antiBotToken": ANTI_BOT_TOKEN,
        "honeypot": "",
    })
});

pub static JOHN_DOE: LazyLock<ContactSubmission> = LazyLock::new(|| ContactSubmission {
    author: ContactAuthor {
        name: "John Doe".try_into().unwrap(),
        email: "john@example.com".parse().unwrap(),
        company: None,
    },
    subject: ContactSubject::Consulting,
    message: "A".repeat(10).try_into().unwrap(),
    anti_bot_token: ANTI_BOT_TOKEN.try_into().unwrap(),
    honeypot: Honeypot::default(),
});

pub static JANE_ROE_JSON: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "name": "Jane O'Roe-Müller",
        "email": "jane.roe@example.org",
        "company": "Roe Consulting Ltd.",
        "subject": "project_opportunity",
        "message": "Hi!\nWe are looking for help with a <b>new</b> product launch.",
        "antiBotToken": "success-0.9",
        "honeypot": "",
    })
});

/// Serializes `value` like a browser would send it.
pub fn body(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap()
}

/// [`JOHN_DOE_JSON`] with `field` replaced by `value`.
pub fn john_doe_with(field: &str, value: Value) -> Value {
    let mut json = JOHN_DOE_JSON.clone();
    json[field] = value;
    json
}
