//! SVG output.

use serde_json::Value;

use super::RenderSurface;

/// A surface that records primitives and serializes them as an SVG document.
#[derive(Debug, Clone, Default)]
pub struct SvgSurface {
    width: f64,
    height: f64,
    items: Vec<SvgItem>,
}

#[derive(Debug, Clone)]
struct SvgItem {
    tag: String,
    attributes: Vec<(String, String)>,
}

impl SvgSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of primitives drawn so far.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Serialize the drawing.
    pub fn to_svg(&self) -> String {
        let mut out = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}">"#,
            self.width, self.height
        );
        for item in &self.items {
            out.push('<');
            out.push_str(&escape(&item.tag));
            for (name, value) in &item.attributes {
                out.push_str(&format!(r#" {}="{}""#, escape(name), escape(value)));
            }
            out.push_str("/>");
        }
        out.push_str("</svg>");
        out
    }
}

impl RenderSurface for SvgSurface {
    fn begin(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.items.clear();
    }

    fn push_primitive(&mut self, primitive: &str) {
        self.items.push(SvgItem {
            tag: primitive.to_string(),
            attributes: Vec::new(),
        });
    }

    fn set_attribute(&mut self, name: &str, value: &Value) {
        let Some(item) = self.items.last_mut() else {
            return;
        };
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Null => "NaN".to_string(),
            other => other.to_string(),
        };
        match item.attributes.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = text,
            None => item.attributes.push((name.to_string(), text)),
        }
    }
}

/// Escape text for use in XML attributes and tag names.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
