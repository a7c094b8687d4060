use super::{Builtins, Diagnostic, DiagnosticKind, Severity};
use crate::decl::{Declaration, DeclarationTable};
use crate::scan::BlockScan;
use crate::token::{Keyword, Token};
use crate::util::fast_map::{FastHashMap, FastHashSet, fast_hash_map_new, fast_hash_set_new};
use std::collections::BTreeMap;

/// Findings for one file: the scanner's unmatched blocks followed by the
/// undeclared-use and unused-declaration checks, plus a per-kind unmatched count.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticSet {
    pub diagnostics: Vec<Diagnostic>,
    pub unmatched_summary: BTreeMap<String, usize>,
}

pub struct DiagnosticEngine<'a> {
    tokens: &'a [Token],
    blocks: &'a BlockScan,
    decls: &'a DeclarationTable,
    builtins: &'a Builtins,
    /// Report undeclared uses as errors even without `Option Explicit`.
    pub strict_undeclared: bool,
}

impl<'a> DiagnosticEngine<'a> {
    pub fn new(
        tokens: &'a [Token],
        blocks: &'a BlockScan,
        decls: &'a DeclarationTable,
        builtins: &'a Builtins,
    ) -> Self {
        Self {
            tokens,
            blocks,
            decls,
            builtins,
            strict_undeclared: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_undeclared = strict;
        self
    }

    pub fn run(&self) -> DiagnosticSet {
        let mut diagnostics = self.blocks.diagnostics.clone();
        let undeclared = self.undeclared_uses();
        let unused = self.unused_declarations();
        tracing::debug!(
            unmatched = diagnostics.len(),
            undeclared = undeclared.len(),
            unused = unused.len(),
            "diagnostics computed"
        );
        diagnostics.extend(undeclared);
        diagnostics.extend(unused);
        DiagnosticSet {
            diagnostics,
            unmatched_summary: self.unmatched_summary(),
        }
    }

    pub fn unmatched_summary(&self) -> BTreeMap<String, usize> {
        let mut summary = BTreeMap::new();
        for diag in &self.blocks.diagnostics {
            if let DiagnosticKind::UnmatchedBlock(kind) = &diag.kind {
                *summary.entry(kind.as_str().to_string()).or_insert(0) += 1;
            }
        }
        summary
    }

    /// One diagnostic per distinct undeclared name, at its first occurrence.
    pub fn undeclared_uses(&self) -> Vec<Diagnostic> {
        let known = self.known_names();
        let severity = if self.decls.option_explicit || self.strict_undeclared {
            Severity::Error
        } else {
            Severity::Warning
        };

        let mut reported: FastHashSet<String> = fast_hash_set_new();
        let mut out = Vec::new();
        for (idx, token) in self.tokens.iter().enumerate() {
            if !token.is_identifier()
                || self.decls.is_declaration_name(idx)
                || !self.is_variable_position(idx)
            {
                continue;
            }
            let key = token.text.to_ascii_lowercase();
            if known.contains(&key) || self.builtins.contains(&token.text) || reported.contains(&key) {
                continue;
            }
            let message = format!("`{}` is used but never declared", token.text);
            out.push(Diagnostic {
                severity,
                kind: DiagnosticKind::UndeclaredVariableUse(token.text.clone()),
                message,
                related_name: Some(token.text.clone()),
                line: token.line,
                column: token.column,
            });
            reported.insert(key);
        }
        out
    }

    /// One diagnostic per declaration that no identifier token is attributed to.
    /// Type names and tokens of the declaring statement itself are not uses.
    pub fn unused_declarations(&self) -> Vec<Diagnostic> {
        let mut uses = vec![0usize; self.decls.declarations.len()];
        let mut by_name: FastHashMap<String, Vec<usize>> = fast_hash_map_new();
        for (i, decl) in self.decls.declarations.iter().enumerate() {
            by_name.entry(decl.name.to_ascii_lowercase()).or_default().push(i);
        }

        for (idx, token) in self.tokens.iter().enumerate() {
            if !token.is_identifier() || self.decls.is_declaration_name(idx) || self.is_type_position(idx) {
                continue;
            }
            let Some(candidates) = by_name.get(&token.text.to_ascii_lowercase()) else {
                continue;
            };
            let Some(target) = self.attribute(idx, candidates) else {
                continue;
            };
            if !self.decls.declarations[target].statement.as_range().contains(&idx) {
                uses[target] += 1;
            }
        }

        self.decls
            .declarations
            .iter()
            .zip(uses)
            .filter(|(_, n)| *n == 0)
            .map(|(decl, _)| unused_diagnostic(decl))
            .collect()
    }

    /// Pick the declaration a use at `idx` refers to. Locals live for their whole
    /// procedure, so an owner is widened to its enclosing procedure or class; the
    /// innermost such scope containing the use wins (later declarations win ties).
    /// Otherwise the last module-level declaration, else the last one of the name.
    fn attribute(&self, idx: usize, candidates: &[usize]) -> Option<usize> {
        let decls = &self.decls.declarations;
        let scoped = candidates
            .iter()
            .filter_map(|&c| {
                let scope = self.blocks.scope_of(decls[c].owning_construct_id?);
                self.blocks.contains(scope, idx).then_some((scope, c))
            })
            .max();
        if let Some((_, c)) = scoped {
            return Some(c);
        }
        candidates
            .iter()
            .rev()
            .find(|&&c| decls[c].owning_construct_id.is_none())
            .or_else(|| candidates.last())
            .copied()
    }

    /// Lowercased names that are bound without a `Dim`-style declaration, or by one.
    fn known_names(&self) -> FastHashSet<String> {
        let mut known: FastHashSet<String> = fast_hash_set_new();
        known.extend(self.decls.declarations.iter().map(|d| d.name.to_ascii_lowercase()));
        known.extend(self.blocks.declared_names().map(str::to_ascii_lowercase));
        known.extend(self.external_names().into_iter().map(str::to_ascii_lowercase));
        known
    }

    /// Names bound by `Declare`, `Type` and `Enum` statements: the declared name,
    /// `Declare` parameters, and each member or field up to the matching `End`.
    fn external_names(&self) -> Vec<&'a str> {
        let tokens = self.tokens;
        let mut names = Vec::new();
        // `Type` or `Enum` while inside its body.
        let mut body: Option<&'a str> = None;
        let mut at_head = true;
        for (idx, token) in tokens.iter().enumerate() {
            if at_head {
                match body {
                    Some(kind) if token.is_keyword(Keyword::End) => {
                        if tokens.get(idx + 1).is_some_and(|t| t.text.eq_ignore_ascii_case(kind)) {
                            body = None;
                        }
                    }
                    Some(_) if token.is_identifier() => names.push(token.text.as_str()),
                    Some(_) => {}
                    None => body = self.introduced_names(idx, &mut names),
                }
            }
            at_head = token.is_statement_break()
                || (at_head && token.keyword().is_some_and(Keyword::is_modifier));
        }
        names
    }

    /// Record what the statement starting at `idx` introduces. Returns the body
    /// kind when it opens a `Type` or `Enum` block.
    fn introduced_names(&self, idx: usize, names: &mut Vec<&'a str>) -> Option<&'a str> {
        let tokens = self.tokens;
        let head = tokens.get(idx).filter(|t| t.is_identifier())?;
        let name = tokens.get(idx + 1).filter(|t| t.is_identifier());
        if head.text.eq_ignore_ascii_case("Declare") {
            self.declare_names(idx, names);
            return None;
        }
        if !(head.text.eq_ignore_ascii_case("Type") || head.text.eq_ignore_ascii_case("Enum")) {
            return None;
        }
        names.push(name?.text.as_str());
        Some(head.text.as_str())
    }

    /// `Declare [PtrSafe] Function|Sub Name Lib "..." [Alias "..."] (params) [As T]`
    fn declare_names(&self, idx: usize, names: &mut Vec<&'a str>) {
        let tokens = self.tokens;
        let end = (idx..tokens.len())
            .find(|&i| tokens[i].is_statement_break())
            .unwrap_or(tokens.len());
        let Some(kw) = (idx + 1..end)
            .find(|&i| tokens[i].is_keyword(Keyword::Function) || tokens[i].is_keyword(Keyword::Sub))
        else {
            return;
        };
        if let Some(name) = tokens.get(kw + 1).filter(|t| t.is_identifier()) {
            names.push(name.text.as_str());
        }
        let mut depth = 0usize;
        for i in kw + 1..end {
            let tok = &tokens[i];
            if tok.is_operator("(") {
                depth += 1;
            } else if tok.is_operator(")") {
                depth = depth.saturating_sub(1);
            } else if depth == 1 && tok.is_identifier() && starts_parameter(&tokens[i - 1]) {
                names.push(tok.text.as_str());
            }
        }
    }

    /// True for identifiers naming a type: after `As` or `New`, including the later
    /// parts of a dotted name such as `Scripting.Dictionary`.
    fn is_type_position(&self, idx: usize) -> bool {
        let mut first = idx;
        while first >= 2
            && self.tokens[first - 1].is_operator(".")
            && self.tokens[first - 2].is_identifier()
        {
            first -= 2;
        }
        first
            .checked_sub(1)
            .and_then(|prev| self.tokens[prev].keyword())
            .is_some_and(|kw| matches!(kw, Keyword::As | Keyword::New))
    }

    /// False for identifiers that name something other than a variable: members
    /// after `.`, type names, labels and jump targets, named arguments.
    fn is_variable_position(&self, idx: usize) -> bool {
        let prev = idx.checked_sub(1).map(|i| &self.tokens[i]);
        let next = self.tokens.get(idx + 1);
        if let Some(prev) = prev {
            if prev.is_operator(".") || prev.is_operator("!") {
                return false;
            }
            if matches!(
                prev.keyword(),
                Some(Keyword::As | Keyword::New | Keyword::GoTo | Keyword::Resume)
            ) {
                return false;
            }
        }
        if next.is_some_and(|t| t.is_operator(":=")) {
            return false;
        }
        let at_line_start = prev.is_none_or(Token::is_line_end);
        let label = at_line_start && next.is_some_and(|t| t.is_operator(":"));
        !label
    }
}

fn starts_parameter(prev: &Token) -> bool {
    prev.is_operator("(")
        || prev.is_operator(",")
        || matches!(
            prev.keyword(),
            Some(Keyword::ByVal | Keyword::ByRef | Keyword::Optional | Keyword::ParamArray)
        )
}

fn unused_diagnostic(decl: &Declaration) -> Diagnostic {
    Diagnostic::warning(
        DiagnosticKind::UnusedDeclaration(decl.name.clone()),
        format!("`{}` is declared but never used", decl.name),
        decl.line,
        decl.column,
    )
    .with_related_name(Some(decl.name.clone()))
}
