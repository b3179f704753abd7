use crate::core::catalog::AdTaxonomy;
use crate::core::generator::div_id;
use crate::core::script::json_literal;
use serde_json::Value;

/// Optional presentation attributes for a placeholder container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    pub classes: Option<String>,
    pub styles: Option<String>,
}

/// Renders the placeholder that displays a previously defined slot.
#[derive(Debug, Clone)]
pub struct DisplayCallEmitter<'a> {
    taxonomy: &'a AdTaxonomy,
}

impl<'a> DisplayCallEmitter<'a> {
    pub fn new(taxonomy: &'a AdTaxonomy) -> Self {
        Self { taxonomy }
    }

    /// `None` when no unit id is given. Unknown units still render: the
    /// container is harmless and keeps template markup stable.
    pub fn emit(&self, unit_id: &str, position: Option<&str>, options: &DisplayOptions) -> Option<String> {
        if unit_id.is_empty() {
            return None;
        }
        let position = position.filter(|p| !p.is_empty());
        let id = div_id(unit_id, position);

        let label = match (self.taxonomy.path_of(unit_id), position) {
            (Some(path), Some(pos)) => format!("{} {}", path, pos),
            (Some(path), None) => path.to_string(),
            (None, Some(pos)) => format!("{} {}", unit_id, pos),
            (None, None) => unit_id.to_string(),
        };

        let mut attributes = format!("id=\"{}\"", html_attr(&id));
        if let Some(classes) = options.classes.as_deref().filter(|c| !c.is_empty()) {
            attributes.push_str(&format!(" class=\"{}\"", html_attr(classes)));
        }
        if let Some(styles) = options.styles.as_deref().filter(|s| !s.is_empty()) {
            attributes.push_str(&format!(" style=\"{}\"", html_attr(styles)));
        }

        Some(format!(
            "<!-- {label} -->\n<div {attributes}>\n    <script type=\"text/javascript\">\n        googletag.cmd.push(function() {{ googletag.display({id}); }});\n    </script>\n</div>\n",
            label = label.replace("--", "- -"),
            attributes = attributes,
            id = json_literal(&Value::String(id.clone())),
        ))
    }
}

fn html_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
