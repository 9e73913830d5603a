use std::sync::Arc;

use anyhow::Context;
use folio_templates_contracts::{
    RenderedTemplate, Template, TemplateService, BASE_TEMPLATE, TEMPLATES,
};
use tera::Tera;

pub mod sanitize;

#[derive(Debug, Clone)]
pub struct TemplateServiceImpl {
    tera: Arc<Tera>,
}

impl TemplateServiceImpl {
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.register_filter("sanitize", sanitize::sanitize_filter);

        tera.add_raw_template("base.html", BASE_TEMPLATE)
            .context("Failed to load base template")?;

        for &(name, html, text) in TEMPLATES {
            tera.add_raw_templates([(html_name(name), html), (text_name(name), text)])
                .with_context(|| format!("Failed to load template {name}"))?;
        }

        Ok(Self { tera: tera.into() })
    }
}

impl TemplateService for TemplateServiceImpl {
    #[tracing::instrument(skip_all, fields(template = T::NAME))]
    fn render<T: Template>(&self, template: &T) -> anyhow::Result<RenderedTemplate> {
        let context = tera::Context::from_serialize(template)?;
        Ok(RenderedTemplate {
            html: self.tera.render(&html_name(T::NAME), &context)?,
            text: self.tera.render(&text_name(T::NAME), &context)?,
        })
    }
}

// Template names decide whether tera escapes interpolated values.
fn html_name(name: &str) -> String {
    format!("{name}.html")
}

fn text_name(name: &str) -> String {
    format!("{name}.txt")
}

#[cfg(test)]
mod tests {
    use folio_templates_contracts::{ContactAutoReplyTemplate, ContactNotificationTemplate};

    use super::*;

    fn notification() -> ContactNotificationTemplate {
        ContactNotificationTemplate {
            name: "John Doe".into(),
            email: "john@example.com".into(),
            company: Some("Acme & Co".into()),
            subject: "Consulting".into(),
            message: "Hello there,\nlet's <b>talk</b>.".into(),
        }
    }

    fn auto_reply() -> ContactAutoReplyTemplate {
        ContactAutoReplyTemplate {
            name: "John Doe".into(),
            subject: "Consulting".into(),
            guidance: "I will follow up soon.".into(),
            message: "Hello there,\nlet's talk.".into(),
        }
    }

    #[test]
    fn contact_notification() {
        // Arrange
        let sut = TemplateServiceImpl::new().unwrap();

        // Act
        let result = sut.render(&notification()).unwrap();

        // Assert
        assert!(result.html.contains("<!DOCTYPE html>"));
        assert!(result.html.contains("John Doe"));
        assert!(result.html.contains("Acme &amp; Co"));
        assert!(result.html.contains("Hello there,<br>let&#x27;s <b>talk</b>."));
        assert!(result.text.contains("Company: Acme & Co"));
        assert!(result.text.contains("Hello there,\nlet's <b>talk</b>."));
    }

    #[test]
    fn contact_notification_without_company() {
        // Arrange
        let sut = TemplateServiceImpl::new().unwrap();

        // Act
        let result = sut
            .render(&ContactNotificationTemplate {
                company: None,
                ..notification()
            })
            .unwrap();

        // Assert
        assert!(!result.html.contains("Company"));
        assert!(!result.text.contains("Company"));
    }

    #[test]
    fn contact_auto_reply() {
        // Arrange
        let sut = TemplateServiceImpl::new().unwrap();

        // Act
        let result = sut.render(&auto_reply()).unwrap();

        // Assert
        assert!(result.html.contains("Hi John Doe,"));
        assert!(result.html.contains("I will follow up soon."));
        assert!(result.text.starts_with("Hi John Doe,"));
    }

    #[test]
    fn markup_injection() {
        // Arrange
        let sut = TemplateServiceImpl::new().unwrap();
        let template = ContactNotificationTemplate {
            name: "<script>alert('name')</script>Mallory".into(),
            company: Some("<iframe src=\"https://evil.example\"></iframe>".into()),
            message: "<img src=x onerror=alert(1)><script>alert('message')</script><em>hi</em>"
                .into(),
            ..notification()
        };

        // Act
        let result = sut.render(&template).unwrap();

        // Assert
        let html = result.html.to_lowercase();
        for tag in ["<script", "<img", "<iframe", "onerror"] {
            assert!(!html.contains(tag), "{tag} survived sanitization");
        }
        assert!(html.contains("mallory"));
        assert!(html.contains("<em>hi</em>"));
    }
}
