//! Email template management with Handlebars

use eyre::{eyre, Result};
use handlebars::Handlebars;
use serde_json::Value;
use std::collections::HashMap;

pub const PASSWORD_RESET: &str = "password_reset";

/// Rendered template result
#[derive(Debug, Clone)]
pub struct RenderedTemplate {
    pub subject: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
}

/// Email template definition
#[derive(Clone, Debug)]
pub struct EmailTemplate {
    pub name: String,
    pub subject: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
}

/// Handlebars-based template engine.
///
/// Variables use `{{name}}`; HTML bodies are escaped unless `{{{raw}}}` is used.
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
    templates: HashMap<String, EmailTemplate>,
}

impl TemplateEngine {
    /// Engine with the built-in templates registered.
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);

        let mut engine = Self {
            handlebars,
            templates: HashMap::new(),
        };
        engine.register_defaults()?;
        Ok(engine)
    }

    pub fn register(&mut self, template: EmailTemplate) -> Result<()> {
        self.handlebars
            .register_template_string(&format!("{}_subject", template.name), &template.subject)
            .map_err(|e| eyre!("Failed to register subject template: {}", e))?;

        if let Some(text) = &template.body_text {
            self.handlebars
                .register_template_string(&format!("{}_text", template.name), text)
                .map_err(|e| eyre!("Failed to register text template: {}", e))?;
        }

        if let Some(html) = &template.body_html {
            self.handlebars
                .register_template_string(&format!("{}_html", template.name), html)
                .map_err(|e| eyre!("Failed to register HTML template: {}", e))?;
        }

        self.templates.insert(template.name.clone(), template);
        Ok(())
    }

    pub fn render(&self, name: &str, data: &Value) -> Result<RenderedTemplate> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| eyre!("Template not found: {}", name))?;

        let subject = self
            .handlebars
            .render(&format!("{}_subject", name), data)
            .map_err(|e| eyre!("Failed to render subject: {}", e))?;

        let body_text = template
            .body_text
            .as_ref()
            .map(|_| self.handlebars.render(&format!("{}_text", name), data))
            .transpose()
            .map_err(|e| eyre!("Failed to render text: {}", e))?;

        let body_html = template
            .body_html
            .as_ref()
            .map(|_| self.handlebars.render(&format!("{}_html", name), data))
            .transpose()
            .map_err(|e| eyre!("Failed to render HTML: {}", e))?;

        Ok(RenderedTemplate {
            subject,
            body_text,
            body_html,
        })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    fn register_defaults(&mut self) -> Result<()> {
        self.register(EmailTemplate {
            name: PASSWORD_RESET.to_string(),
            subject: "Password Reset Request".to_string(),
            body_text: Some(
                r#"Hello {{name}},

You requested a password reset for your {{app_name}} account.

Open the link below to choose a new password:

{{reset_link}}

This link expires in {{expiry_minutes}} minutes. If you did not request a reset, ignore this email.

The {{app_name}} Team"#
                    .to_string(),
            ),
            body_html: Some(
                r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h1 style="color: #2563eb;">Password Reset</h1>
    <p>Hello {{name}},</p>
    <p>You requested a password reset for your {{app_name}} account.</p>
    <p style="text-align: center; margin: 30px 0;">
        <a href="{{reset_link}}"
           style="background-color: #dc2626; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; display: inline-block;">
            Reset Password
        </a>
    </p>
    <p style="color: #666; font-size: 14px;">This link expires in {{expiry_minutes}} minutes. If you did not request a reset, ignore this email.</p>
    <p>The {{app_name}} Team</p>
</body>
</html>"#
                    .to_string(),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reset_data() -> Value {
        serde_json::json!({
            "name": "Ada",
            "app_name": "EventHub",
            "reset_link": "http://localhost:3000/reset-password/abc",
            "expiry_minutes": 60
        })
    }

    #[test]
    fn test_password_reset_template() {
        let engine = TemplateEngine::new().unwrap();
        let rendered = engine.render(PASSWORD_RESET, &reset_data()).unwrap();

        assert_eq!(rendered.subject, "Password Reset Request");
        let text = rendered.body_text.unwrap();
        assert!(text.contains("http://localhost:3000/reset-password/abc"));
        assert!(text.contains("60 minutes"));
        assert!(rendered.body_html.unwrap().contains("Hello Ada"));
    }

    #[test]
    fn test_strict_mode_rejects_missing_variables() {
        let engine = TemplateEngine::new().unwrap();
        let data = serde_json::json!({ "name": "Ada" });
        assert!(engine.render(PASSWORD_RESET, &data).is_err());
    }

    #[test]
    fn test_custom_template() {
        let mut engine = TemplateEngine::new().unwrap();
        engine
            .register(EmailTemplate {
                name: "custom".to_string(),
                subject: "Custom: {{title}}".to_string(),
                body_text: Some("{{content}}".to_string()),
                body_html: None,
            })
            .unwrap();

        let data = serde_json::json!({ "title": "Test", "content": "Hello World" });
        let rendered = engine.render("custom", &data).unwrap();
        assert_eq!(rendered.subject, "Custom: Test");
        assert_eq!(rendered.body_text.unwrap(), "Hello World");
        assert!(rendered.body_html.is_none());
    }

    #[test]
    fn test_unknown_template() {
        let engine = TemplateEngine::new().unwrap();
        assert!(engine.render("nope", &Value::Null).is_err());
    }
}
