//! Markdown rendering with sanitization and non-fatal degradation.
//!
//! Rendering never fails the calling request: a missing body yields empty
//! markup, converter warnings are logged and the degraded output returned,
//! and a converter error is logged and swallowed (empty markup). Sanitation
//! strips script and other unsafe markup from the converted HTML.

use pulldown_cmark::{html, Event, Parser};
use tracing::{error, warn};

/// Conversion result: HTML plus any non-fatal warnings encountered.
#[derive(Debug, Clone, Default)]
pub struct Converted {
    pub html: String,
    pub warnings: Vec<String>,
}

/// Markdown-to-markup converter seam.
///
/// Implementations may fail outright; [`render`] absorbs both failure and
/// warnings so callers never see an error.
pub trait MarkupConverter: Send + Sync {
    fn convert(&self, raw: &str) -> std::result::Result<Converted, String>;
}

/// CommonMark converter with HTML sanitization.
///
/// Raw HTML in the source is reported as a warning; whatever survives
/// conversion is passed through an allowlist sanitizer, so embedded
/// scripts never reach the page.
#[derive(Debug, Default)]
pub struct CmarkConverter;

impl CmarkConverter {
    pub fn new() -> Self {
        Self
    }
}

impl MarkupConverter for CmarkConverter {
    fn convert(&self, raw: &str) -> std::result::Result<Converted, String> {
        let events: Vec<Event> = Parser::new(raw).collect();

        let mut warnings = Vec::new();
        if events
            .iter()
            .any(|e| matches!(e, Event::Html(_) | Event::InlineHtml(_)))
        {
            warnings.push("raw HTML in markdown source was sanitized".to_string());
        }

        let mut unsafe_html = String::new();
        html::push_html(&mut unsafe_html, events.into_iter());

        Ok(Converted {
            html: ammonia::clean(&unsafe_html),
            warnings,
        })
    }
}

/// Render an optional note body to sanitized display markup.
///
/// `None` or empty bodies produce empty markup. Converter warnings are
/// logged at WARN and the degraded output is still returned; a converter
/// error is logged at ERROR and produces empty markup. This function never
/// returns an error and never panics.
pub fn render(converter: &dyn MarkupConverter, body: Option<&str>) -> String {
    let raw = match body {
        Some(text) if !text.is_empty() => text,
        _ => return String::new(),
    };

    match converter.convert(raw) {
        Ok(converted) => {
            for warning in &converted.warnings {
                warn!(
                    subsystem = "core",
                    component = "render",
                    warning = %warning,
                    "markdown rendered with warnings"
                );
            }
            converted.html
        }
        Err(reason) => {
            error!(
                subsystem = "core",
                component = "render",
                error = %reason,
                "markdown rendering failed, returning empty markup"
            );
            String::new()
        }
    }
}
