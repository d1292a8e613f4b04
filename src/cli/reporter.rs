use colored::Colorize;

use dynscope_common::{Diagnostic, DiagnosticCategory, DiagnosticRelatedInformation};
use dynscope_resolver::{ResolvedReference, ScopeChain, TypeCatalog, TypeParameterRef};

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    pub fn render(&self, diagnostics: &[Diagnostic]) -> String {
        diagnostics
            .iter()
            .map(|diag| self.format_diagnostic(diag))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `file(start,length): error AS0103: message`, then one indented line
    /// per related location.
    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let file = if diagnostic.file.is_empty() {
            "<unknown>"
        } else {
            &diagnostic.file
        };
        let mut output = format!(
            "{}: {} {}: {}",
            self.paint_location(file, diagnostic.start, diagnostic.length),
            self.format_category(diagnostic.category),
            self.format_code(diagnostic.code),
            diagnostic.message_text
        );
        for related in &diagnostic.related_information {
            output.push('\n');
            output.push_str(&self.format_related(related));
        }
        output
    }

    fn format_related(&self, related: &DiagnosticRelatedInformation) -> String {
        format!(
            "    {}: {}",
            self.paint_location(&related.file, related.start, related.length),
            related.message_text
        )
    }

    fn paint_location(&self, file: &str, start: u32, length: u32) -> String {
        let text = format!("{file}({start},{length})");
        if self.color {
            text.cyan().to_string()
        } else {
            text
        }
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = match category {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        };
        if !self.color {
            return label.to_string();
        }
        match category {
            DiagnosticCategory::Error => label.red().to_string(),
            DiagnosticCategory::Warning => label.yellow().to_string(),
            _ => label.blue().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        let text = format!("AS{code:04}");
        if self.color {
            text.bright_black().to_string()
        } else {
            text
        }
    }
}

/// One-line description of a resolved name.
pub fn describe_reference(
    catalog: &TypeCatalog,
    scopes: &ScopeChain,
    reference: &ResolvedReference,
) -> String {
    match reference {
        ResolvedReference::Local { id, forward } => {
            let name = scopes.local(*id).map_or("?", |local| local.name.as_str());
            if *forward {
                format!("local {name} (forward use)")
            } else {
                format!("local {name}")
            }
        }
        ResolvedReference::Member(member) => {
            let kind = if member.is_method_group {
                "method group"
            } else if member.is_static {
                "static member"
            } else {
                "instance member"
            };
            let owner = catalog.qualified_name(member.declaring_type);
            match member.members.first().and_then(|&id| catalog.member(id)) {
                Some(def) => format!("{kind} {owner}.{}", def.name),
                None => format!("{kind} of {owner}"),
            }
        }
        ResolvedReference::Global(member) => {
            let owner = catalog.qualified_name(member.declaring_type);
            match member.members.first().and_then(|&id| catalog.member(id)) {
                Some(def) => format!("global {owner}.{}", def.name),
                None => format!("global in {owner}"),
            }
        }
        ResolvedReference::Type(ty) => format!("type {}", catalog.qualified_name(*ty)),
        ResolvedReference::Namespace(ns) => format!("namespace {}", catalog.namespace_path(*ns)),
        ResolvedReference::TypeParameter(TypeParameterRef::Method { index }) => {
            format!("method type parameter #{index}")
        }
        ResolvedReference::TypeParameter(TypeParameterRef::Type { owner, index }) => {
            format!(
                "type parameter #{index} of {}",
                catalog.qualified_name(*owner)
            )
        }
        ResolvedReference::CompilerAlias(builtin) => format!("compiler alias {builtin}"),
    }
}
