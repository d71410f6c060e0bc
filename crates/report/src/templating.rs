//! Minijinja templates for the report title and file name.
//!
//! Both templates are plain strings from configuration, so they are
//! validated once at construction and rendered against a fresh
//! [`minijinja::Environment`] per call.

use chrono::NaiveDate;

use crate::error::ReportError;

/// Context data available to report templates.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TemplateContext {
    /// Customer name.
    pub customer: String,
    /// Report date as `DD/MM/YYYY`.
    pub date: String,
    /// Report date as `DD-MM-YYYY`, safe for file and directory names.
    pub file_date: String,
    /// Report date as `YYYY-MM-DD`.
    pub iso_date: String,
}

impl TemplateContext {
    pub fn new(customer: &str, report_date: NaiveDate) -> Self {
        Self {
            customer: customer.to_string(),
            date: report_date.format("%d/%m/%Y").to_string(),
            file_date: report_date.format("%d-%m-%Y").to_string(),
            iso_date: report_date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Title and file-name templates, validated at construction.
#[derive(Debug, Clone)]
pub struct ReportTemplates {
    title: String,
    file_name: String,
}

impl ReportTemplates {
    pub fn new(title: impl Into<String>, file_name: impl Into<String>) -> Result<Self, ReportError> {
        let templates = Self {
            title: title.into(),
            file_name: file_name.into(),
        };
        validate(&templates.title)
            .map_err(|e| ReportError::Template(format!("invalid title template: {e}")))?;
        validate(&templates.file_name)
            .map_err(|e| ReportError::Template(format!("invalid file name template: {e}")))?;
        Ok(templates)
    }

    pub fn title(&self, ctx: &TemplateContext) -> Result<String, ReportError> {
        render(&self.title, ctx)
    }

    /// Rendered file name with path separators replaced.
    pub fn file_name(&self, ctx: &TemplateContext) -> Result<String, ReportError> {
        let name = render(&self.file_name, ctx)?;
        let name: String = name
            .trim()
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
            .collect();
        if name.is_empty() {
            return Err(ReportError::Template(
                "file name template rendered an empty name".to_string(),
            ));
        }
        Ok(name)
    }
}

impl Default for ReportTemplates {
    fn default() -> Self {
        Self {
            title: digest_core::config::DEFAULT_TITLE_TEMPLATE.to_string(),
            file_name: digest_core::config::DEFAULT_FILE_TEMPLATE.to_string(),
        }
    }
}

/// Build a configured minijinja environment with custom filters and globals.
fn build_env() -> minijinja::Environment<'static> {
    let mut env = minijinja::Environment::new();
    env.add_filter("lower", lower_filter);
    env.add_filter("upper", upper_filter);
    env.add_function("env", env_function);
    env
}

fn render(template_str: &str, ctx: &TemplateContext) -> Result<String, ReportError> {
    build_env()
        .render_str(template_str, ctx)
        .map_err(|e| ReportError::Template(e.to_string()))
}

fn validate(template_str: &str) -> Result<(), minijinja::Error> {
    build_env().template_from_str(template_str)?;
    Ok(())
}

fn lower_filter(value: String) -> String {
    value.to_lowercase()
}

fn upper_filter(value: String) -> String {
    value.to_uppercase()
}

/// Global function: read an environment variable by name.
///
/// Returns an empty string (with a warning) if the variable is not set.
fn env_function(name: String) -> String {
    match std::env::var(&name) {
        Ok(val) => val,
        Err(_) => {
            tracing::warn!(var = %name, "Environment variable not found, returning empty string");
            String::new()
        }
    }
}
