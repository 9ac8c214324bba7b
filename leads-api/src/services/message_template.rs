//! Placeholder templates for personalised lead messages
//!
//! A placeholder is `{name}` with `name` made of ASCII letters, digits and
//! underscores. Anything else in braces is literal text.

use leads_common::db::{Lead, TEMPLATE_FIELDS};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").unwrap());

/// Why a template was refused before any lead was read
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("template must be a non-empty string")]
    Empty,

    #[error("{}", unknown_fields_message(.0))]
    UnknownFields(Vec<String>),
}

fn unknown_fields_message(unknown: &[String]) -> String {
    let label = if unknown.len() == 1 { "Field" } else { "Fields" };
    format!(
        "{} not available: {}. Valid fields are: {}",
        label,
        unknown.join(", "),
        TEMPLATE_FIELDS.join(", ")
    )
}

/// A checked template
#[derive(Debug, Clone, PartialEq)]
pub struct MessageTemplate {
    text: String,
    fields: Vec<String>,
}

impl MessageTemplate {
    /// Collect placeholders and reject names outside the template field set
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        if text.is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut fields: Vec<String> = Vec::new();
        for capture in PLACEHOLDER.captures_iter(text) {
            let name = &capture[1];
            if !fields.iter().any(|f| f == name) {
                fields.push(name.to_string());
            }
        }

        let unknown: Vec<String> = fields
            .iter()
            .filter(|f| !TEMPLATE_FIELDS.contains(&f.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(TemplateError::UnknownFields(unknown));
        }

        Ok(Self {
            text: text.to_string(),
            fields,
        })
    }

    /// Placeholder names in order of first appearance
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Substitute every placeholder with the lead's value
    ///
    /// Fails with the referenced fields the lead has no value for.
    pub fn render(&self, lead: &Lead) -> Result<String, Vec<String>> {
        let missing: Vec<String> = self
            .fields
            .iter()
            .filter(|f| lead.field_value(f).map_or(true, str::is_empty))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }

        let rendered = PLACEHOLDER.replace_all(&self.text, |caps: &regex::Captures| {
            lead.field_value(&caps[1]).unwrap_or_default().to_string()
        });
        Ok(rendered.into_owned())
    }
}

/// Per-lead error text for fields a lead lacks
pub fn missing_fields_message(missing: &[String]) -> String {
    let label = if missing.len() == 1 { "field" } else { "fields" };
    format!("Missing {}: {}", label, missing.join(", "))
}
