//! Template generation for new records

use chrono::{DateTime, Utc};
use rust_embed::Embed;
use tera::Tera;
use thiserror::Error;

use crate::conformance::{Axis, Direction, DEFAULT_DEVIATION_LIMIT_MM};
use crate::core::identity::EntityId;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

/// Context for template generation
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub id: EntityId,
    pub author: String,
    pub created: DateTime<Utc>,
    pub title: Option<String>,
    pub client: Option<String>,
    pub tags: Vec<String>,
    // RPT fields
    pub instrument: Option<String>,
    // CERT fields
    pub probe_model: Option<String>,
    pub serial_number: Option<String>,
    pub deviation_limit: Option<f64>,
}

impl TemplateContext {
    pub fn new(id: EntityId, author: String) -> Self {
        Self {
            id,
            author,
            created: Utc::now(),
            title: None,
            client: None,
            tags: Vec::new(),
            instrument: None,
            probe_model: None,
            serial_number: None,
            deviation_limit: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_instrument(mut self, instrument: impl Into<String>) -> Self {
        self.instrument = Some(instrument.into());
        self
    }

    pub fn with_probe(mut self, model: Option<String>, serial_number: Option<String>) -> Self {
        self.probe_model = model;
        self.serial_number = serial_number;
        self
    }

    pub fn with_deviation_limit(mut self, limit: f64) -> Self {
        self.deviation_limit = Some(limit);
        self
    }

    fn limit(&self) -> f64 {
        self.deviation_limit
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(DEFAULT_DEVIATION_LIMIT_MM)
    }
}

/// Template generator using Tera
pub struct TemplateGenerator {
    tera: Tera,
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template rendering error: {0}")]
    RenderError(String),
}

/// Quote a value as a YAML double-quoted scalar
fn quoted(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.replace('"', "'")))
}

fn quoted_tags(tags: &[String]) -> String {
    tags.iter().map(|t| quoted(t)).collect::<Vec<_>>().join(", ")
}

impl TemplateGenerator {
    /// Create a new template generator with embedded templates
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template_str) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template_str)
                        .map_err(|e| TemplateError::RenderError(e.to_string()))?;
                }
            }
        }

        Ok(Self { tera })
    }

    fn base_context(ctx: &TemplateContext) -> tera::Context {
        let title = ctx.title.clone().unwrap_or_default();
        let mut context = tera::Context::new();
        context.insert("id", &ctx.id.to_string());
        context.insert("author", &quoted(&ctx.author));
        context.insert("created", &ctx.created.to_rfc3339());
        context.insert("title", &quoted(&title));
        context.insert("title_plain", &title);
        context.insert("client", &quoted(ctx.client.as_deref().unwrap_or_default()));
        context.insert("tags", &quoted_tags(&ctx.tags));
        context
    }

    fn render(
        &self,
        name: &str,
        context: &tera::Context,
        fallback: impl FnOnce() -> String,
    ) -> Result<String, TemplateError> {
        if self.tera.get_template_names().any(|n| n == name) {
            self.tera
                .render(name, context)
                .map_err(|e| TemplateError::RenderError(e.to_string()))
        } else {
            tracing::debug!(template = name, "template not embedded, using fallback");
            Ok(fallback())
        }
    }

    /// Generate an inspection report
    pub fn generate_report(&self, ctx: &TemplateContext) -> Result<String, TemplateError> {
        let mut context = Self::base_context(ctx);
        context.insert(
            "instrument",
            &ctx.instrument.as_deref().map(quoted).unwrap_or_default(),
        );

        self.render("report.yaml.tera", &context, || {
            self.hardcoded_report_template(ctx)
        })
    }

    /// Generate a probe-repair certificate
    pub fn generate_certificate(&self, ctx: &TemplateContext) -> Result<String, TemplateError> {
        let limit = ctx.limit();
        let mut context = Self::base_context(ctx);
        context.insert(
            "model",
            &ctx.probe_model.as_deref().map(quoted).unwrap_or_default(),
        );
        context.insert(
            "serial_number",
            &ctx.serial_number.as_deref().map(quoted).unwrap_or_default(),
        );
        context.insert("limit_max", &limit);
        context.insert("limit_min", &-limit);
        context.insert(
            "axes",
            &Axis::all().iter().map(|a| a.to_string()).collect::<Vec<_>>(),
        );
        context.insert(
            "directions",
            &Direction::all().iter().map(|d| d.as_str()).collect::<Vec<_>>(),
        );

        self.render("certificate.yaml.tera", &context, || {
            self.hardcoded_certificate_template(ctx)
        })
    }

    fn hardcoded_report_template(&self, ctx: &TemplateContext) -> String {
        let title = ctx.title.clone().unwrap_or_default();
        let mut yaml = format!(
            "# Inspection report: {}\n# Created by MCT - Metrology Conformance Toolkit\n\nid: {}\ntitle: {}\nclient: {}\n",
            title,
            ctx.id,
            quoted(&title),
            quoted(ctx.client.as_deref().unwrap_or_default()),
        );
        if let Some(instrument) = &ctx.instrument {
            yaml.push_str(&format!("instrument: {}\n", quoted(instrument)));
        }
        yaml.push_str("\nrows: []\n\nverdict: APPROVED\n");
        if !ctx.tags.is_empty() {
            yaml.push_str(&format!("tags: [{}]\n", quoted_tags(&ctx.tags)));
        }
        yaml.push_str(&format!(
            "\ncreated: {}\nauthor: {}\nentity_revision: 1\n",
            ctx.created.to_rfc3339(),
            quoted(&ctx.author),
        ));
        yaml
    }

    fn hardcoded_certificate_template(&self, ctx: &TemplateContext) -> String {
        let title = ctx.title.clone().unwrap_or_default();
        let limit = ctx.limit();
        let mut yaml = format!(
            "# Probe repair certificate: {}\n# Created by MCT - Metrology Conformance Toolkit\n\nid: {}\ntitle: {}\nclient: {}\n\nprobe:\n",
            title,
            ctx.id,
            quoted(&title),
            quoted(ctx.client.as_deref().unwrap_or_default()),
        );
        if let Some(model) = &ctx.probe_model {
            yaml.push_str(&format!("  model: {}\n", quoted(model)));
        }
        if let Some(serial) = &ctx.serial_number {
            yaml.push_str(&format!("  serial_number: {}\n", quoted(serial)));
        }

        yaml.push_str("\ndeviation_tests:\n");
        for axis in Axis::all() {
            let positive = if *axis == Axis::Z { " 0.0" } else { "" };
            yaml.push_str(&format!(
                "  - axis: {}\n    deviation_positive:{}\n    deviation_negative:\n    limit_max: {}\n    limit_min: {}\n",
                axis, positive, limit, -limit
            ));
        }

        yaml.push_str("\nseries:\n");
        for direction in Direction::all() {
            yaml.push_str(&format!("  - direction: \"{}\"\n    points: []\n", direction));
        }

        yaml.push_str("\ncreated: ");
        yaml.push_str(&ctx.created.to_rfc3339());
        yaml.push_str(&format!("\nauthor: {}\nentity_revision: 1\n", quoted(&ctx.author)));
        yaml
    }
}
