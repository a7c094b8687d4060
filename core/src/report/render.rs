use super::StructuralReport;
use crate::scan::BlockConstruct;
use anyhow::{Context, Result};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Json,
    Yaml,
    Text,
}

impl StructuralReport {
    pub fn render(&self, format: ReportFormat, compact: bool) -> Result<String> {
        match format {
            ReportFormat::Json => self.to_json(compact),
            ReportFormat::Yaml => serde_yaml::to_string(self).context("Failed to serialize report as YAML"),
            ReportFormat::Text => Ok(self.render_text()),
        }
    }

    pub fn to_json(&self, compact: bool) -> Result<String> {
        let out = if compact {
            serde_json::to_string(self)
        } else {
            serde_json::to_string_pretty(self)
        };
        out.context("Failed to serialize report as JSON")
    }

    /// Flattened plain-text listing of every section, one item per line. Empty
    /// sections are omitted.
    pub fn render_text(&self) -> String {
        let mut doc = String::from("The VBA script contains the following components:\n");

        section(&mut doc, "Comments", &self.comments, |out, c| {
            writeln!(out, "- {}", c.text.trim())
        });
        section(&mut doc, "Variables", &self.variables, |out, v| {
            writeln!(out, "- Variable '{}' of type '{}'", v.name, v.declared_type)
        });
        section(&mut doc, "Functions", &self.functions, |out, f| {
            writeln!(
                out,
                "- Function '{}' with parameters '{}' returning '{}'",
                name_of(f),
                f.parameter_text.as_deref().unwrap_or(""),
                f.return_type.as_deref().unwrap_or("Variant")
            )?;
            writeln!(out, "  Function Body: {}", f.body.trim())
        });
        section(&mut doc, "Subroutines", &self.subroutines, |out, s| {
            writeln!(
                out,
                "- Subroutine '{}' with parameters '{}'",
                name_of(s),
                s.parameter_text.as_deref().unwrap_or("")
            )?;
            writeln!(out, "  Subroutine Body: {}", s.body.trim())
        });
        section(&mut doc, "Properties", &self.properties, |out, p| {
            write!(
                out,
                "- Property '{}' with parameters '{}'",
                name_of(p),
                p.parameter_text.as_deref().unwrap_or("")
            )?;
            match &p.return_type {
                Some(ret) => writeln!(out, " returning '{ret}'"),
                None => writeln!(out),
            }
        });
        section(&mut doc, "Loops", &self.loops, |out, l| writeln!(out, "- Loop: {}", opening(l)));
        section(&mut doc, "Conditionals", &self.conditionals, |out, c| {
            writeln!(out, "- Conditional: {}", opening(c))
        });
        section(&mut doc, "Error Handling", &self.error_handling, |out, e| {
            writeln!(out, "- Error Handling: {}", opening(e))
        });
        section(&mut doc, "Classes", &self.classes, |out, c| writeln!(out, "- Class: {}", opening(c)));
        section(&mut doc, "Errors Detected", &self.diagnostics, |out, d| writeln!(out, "- {d}"));
        doc
    }
}

fn section<T>(doc: &mut String, title: &str, items: &[T], mut item: impl FnMut(&mut String, &T) -> std::fmt::Result) {
    if items.is_empty() {
        return;
    }
    // Writing into a String cannot fail.
    let _ = writeln!(doc, "\n**{title}:**");
    for it in items {
        let _ = item(doc, it);
    }
}

fn name_of(block: &BlockConstruct) -> &str {
    block.name.as_deref().unwrap_or("")
}

/// The construct's opening line: its keyword phrase followed by the header text.
fn opening(block: &BlockConstruct) -> String {
    match &block.header {
        Some(header) => format!("{} {}", block.kind, header),
        None => block.kind.to_string(),
    }
}
