use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};
use folio_models::email_address::EmailAddressWithName;

pub mod contact;

pub const CLIENT_KEY1: &str = "203.0.113.7";
pub const CLIENT_KEY2: &str = "198.51.100.23";

pub static NOW: LazyLock<DateTime<Utc>> =
    LazyLock::new(|| Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());

pub static OWNER: LazyLock<EmailAddressWithName> =
    LazyLock::new(|| "Folio Owner <hello@folio.example.com>".parse().unwrap());

pub static SENDER: LazyLock<EmailAddressWithName> =
    LazyLock::new(|| "Folio <noreply@folio.example.com>".parse().unwrap());
