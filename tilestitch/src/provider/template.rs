//! Tile URL templates.
//!
//! Templates use the common slippy-map placeholders:
//!
//! - `{z}`, `{x}`, `{y}`: zoom and tile index, required
//! - `{s}`: optional subdomain, one of `a`, `b`, `c`

use std::fmt;

const REQUIRED_PLACEHOLDERS: [&str; 3] = ["{z}", "{x}", "{y}"];
const SUBDOMAINS: [char; 3] = ['a', 'b', 'c'];

/// Errors raised when a URL template is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    Empty,
    MissingPlaceholder {
        template: String,
        placeholder: &'static str,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Empty => write!(f, "URL template is empty"),
            TemplateError::MissingPlaceholder {
                template,
                placeholder,
            } => write!(
                f,
                "URL template '{}' is missing the {} placeholder",
                template, placeholder
            ),
        }
    }
}

impl std::error::Error for TemplateError {}

/// A validated tile URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    template: String,
}

impl UrlTemplate {
    /// Validates and wraps a template string.
    pub fn parse(template: impl Into<String>) -> Result<Self, TemplateError> {
        let template = template.into();
        if template.trim().is_empty() {
            return Err(TemplateError::Empty);
        }
        for placeholder in REQUIRED_PLACEHOLDERS {
            if !template.contains(placeholder) {
                return Err(TemplateError::MissingPlaceholder {
                    template,
                    placeholder,
                });
            }
        }
        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Builds the request URL for a tile.
    ///
    /// The subdomain is `'a' + (x + y) mod 3`, so the same tile always
    /// maps to the same host.
    pub fn build(&self, zoom: u8, x: u32, y: u32) -> String {
        let mut url = self
            .template
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string());

        if url.contains("{s}") {
            let index = ((u64::from(x) + u64::from(y)) % 3) as usize;
            url = url.replace("{s}", &SUBDOMAINS[index].to_string());
        }

        url
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
