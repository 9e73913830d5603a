use std::{str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{email_address::EmailAddress, macros::nutype_string};

/// A fully validated contact form submission.
///
/// Only ever constructed by [`ContactSubmission::from_json`] (or by hand in
/// tests), so holding one means every field constraint was satisfied at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub author: ContactAuthor,
    pub subject: ContactSubject,
    pub message: ContactMessageContent,
    pub anti_bot_token: AntiBotToken,
    pub honeypot: Honeypot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactAuthor {
    pub name: ContactAuthorName,
    pub email: EmailAddress,
    pub company: Option<ContactCompany>,
}

pub static CONTACT_AUTHOR_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-ZÀ-ÿ '.-]+$").unwrap());

nutype_string!(
    /// Letters (including accented ones), spaces, hyphens, apostrophes and periods.
    ContactAuthorName(validate(
        len_char_min = 2,
        len_char_max = 50,
        regex = CONTACT_AUTHOR_NAME_REGEX
    ))
);

nutype_string!(ContactCompany(validate(len_char_max = 100)));

nutype_string!(ContactMessageContent(validate(
    len_char_min = 10,
    len_char_max = 1000
)));

nutype_string!(
    /// Opaque verification token issued to the browser by the captcha provider.
    AntiBotToken(validate(len_char_min = 1, len_char_max = 4096))
);

pub const CONTACT_EMAIL_MAX_LENGTH: usize = 100;

/// Value of the form field that is hidden from human visitors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Honeypot(pub String);

impl Honeypot {
    /// Returns `true` if the field was filled in, which only automated
    /// submitters do.
    pub fn is_tripped(&self) -> bool {
        !self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactSubject {
    ProjectOpportunity,
    Consulting,
    Networking,
}

impl ContactSubject {
    pub const ALL: [Self; 3] = [Self::ProjectOpportunity, Self::Consulting, Self::Networking];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProjectOpportunity => "project_opportunity",
            Self::Consulting => "consulting",
            Self::Networking => "networking",
        }
    }

    /// Human readable label used in email subjects and bodies.
    pub fn label(self) -> &'static str {
        match self {
            Self::ProjectOpportunity => "Project Opportunity",
            Self::Consulting => "Consulting",
            Self::Networking => "Networking",
        }
    }

    /// What the submitter can expect next, included in the auto-reply.
    pub fn guidance(self) -> &'static str {
        match self {
            Self::ProjectOpportunity => {
                "I review every project inquiry personally and will get back to you within \
                 two business days. If you have a brief, timeline or budget range at hand, \
                 feel free to reply to this email with it."
            }
            Self::Consulting => {
                "I will follow up within two business days to suggest a short introductory \
                 call. It helps to know a bit about your current setup and the problem you \
                 would like to solve."
            }
            Self::Networking => {
                "Thanks for reaching out! I usually answer networking messages within a \
                 week. In the meantime, feel free to connect with me on LinkedIn."
            }
        }
    }
}

impl std::fmt::Display for ContactSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown contact subject")]
pub struct UnknownContactSubject;

impl FromStr for ContactSubject {
    type Err = UnknownContactSubject;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|subject| subject.as_str() == s)
            .ok_or(UnknownContactSubject)
    }
}

/// The form field a submission was rejected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactField {
    /// The body is not a JSON object.
    Form,
    Name,
    Email,
    Company,
    Subject,
    Message,
    AntiBotToken,
    Honeypot,
}

impl ContactField {
    pub fn key(self) -> &'static str {
        match self {
            Self::Form => "",
            Self::Name => "name",
            Self::Email => "email",
            Self::Company => "company",
            Self::Subject => "subject",
            Self::Message => "message",
            Self::AntiBotToken => "antiBotToken",
            Self::Honeypot => "honeypot",
        }
    }

    /// User facing description of the constraint that was violated.
    pub fn message(self) -> &'static str {
        match self {
            Self::Form => "Invalid form data",
            Self::Name => {
                "Please enter a valid name (2-50 characters, letters, spaces, hyphens, \
                 apostrophes and periods only)"
            }
            Self::Email => "Please enter a valid email address",
            Self::Company => "Company name must be at most 100 characters",
            Self::Subject => "Please select a valid subject",
            Self::Message => "Message must be between 10 and 1000 characters",
            Self::AntiBotToken => "Verification token is missing",
            Self::Honeypot => "Invalid submission",
        }
    }
}

/// Rejection of a submission, scoped to the first field that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{}", .field.message())]
pub struct ContactValidationError {
    pub field: ContactField,
}

impl From<ContactField> for ContactValidationError {
    fn from(field: ContactField) -> Self {
        Self { field }
    }
}

impl ContactSubmission {
    /// Validates a parsed request body.
    ///
    /// Fields are checked in declaration order and the first violation is
    /// returned. The honeypot is only required to be a string here, whether it
    /// is empty is decided by the bot defense.
    pub fn from_json(value: &Value) -> Result<Self, ContactValidationError> {
        let fields = value.as_object().ok_or(ContactField::Form)?;

        let name = ContactAuthorName::try_new(required(fields, ContactField::Name)?.to_owned())
            .map_err(|_| ContactField::Name)?;

        let email = parse_email(required(fields, ContactField::Email)?)
            .ok_or(ContactField::Email)?;

        let company = optional(fields, ContactField::Company)?
            .filter(|company| !company.is_empty())
            .map(|company| ContactCompany::try_new(company.to_owned()))
            .transpose()
            .map_err(|_| ContactField::Company)?;

        let subject = required(fields, ContactField::Subject)?
            .parse::<ContactSubject>()
            .map_err(|_| ContactField::Subject)?;

        let message =
            ContactMessageContent::try_new(required(fields, ContactField::Message)?.to_owned())
                .map_err(|_| ContactField::Message)?;

        let anti_bot_token =
            AntiBotToken::try_new(required(fields, ContactField::AntiBotToken)?.to_owned())
                .map_err(|_| ContactField::AntiBotToken)?;

        let honeypot = Honeypot(
            optional(fields, ContactField::Honeypot)?
                .unwrap_or_default()
                .to_owned(),
        );

        Ok(Self {
            author: ContactAuthor {
                name,
                email,
                company,
            },
            subject,
            message,
            anti_bot_token,
            honeypot,
        })
    }
}

fn required(fields: &Map<String, Value>, field: ContactField) -> Result<&str, ContactField> {
    fields
        .get(field.key())
        .and_then(Value::as_str)
        .ok_or(field)
}

fn optional(fields: &Map<String, Value>, field: ContactField) -> Result<Option<&str>, ContactField> {
    match fields.get(field.key()) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.as_str())),
        Some(_) => Err(field),
    }
}

fn parse_email(email: &str) -> Option<EmailAddress> {
    if email.chars().count() > CONTACT_EMAIL_MAX_LENGTH || email.matches('@').count() != 1 {
        return None;
    }
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || !domain.contains('.') {
        return None;
    }
    email.parse().ok()
}
