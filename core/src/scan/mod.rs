//! Block scanner: a single-pass stack machine that recovers procedure, loop,
//! conditional, class, and error-handler boundaries from a token stream.
//!
//! End markers only pop a matching top of stack. A mismatched top is diagnosed,
//! popped, and matching is retried against the new top until a match is found or
//! the stack is empty. Anything still open at end of input is finalized as
//! unterminated and diagnosed.

use crate::diag::{Diagnostic, DiagnosticKind};
use crate::token::{Keyword, Span, Token, TokenKind};
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Range;

mod header;


pub use header::Parameter;
pub(crate) use header::type_name;
use header::{HeaderInfo, statement_break_after};

/// Opening order of a construct; also its index in [`BlockScan::constructs`].
pub type BlockId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProcedureKind {
    Function,
    Sub,
    Property,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LoopKind {
    For,
    Do,
    While,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockKind {
    Procedure(ProcedureKind),
    Loop(LoopKind),
    Conditional,
    ErrorHandler,
    Class,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Procedure(ProcedureKind::Function) => "Function",
            BlockKind::Procedure(ProcedureKind::Sub) => "Sub",
            BlockKind::Procedure(ProcedureKind::Property) => "Property",
            BlockKind::Loop(LoopKind::For) => "For",
            BlockKind::Loop(LoopKind::Do) => "Do",
            BlockKind::Loop(LoopKind::While) => "While",
            BlockKind::Conditional => "If",
            BlockKind::ErrorHandler => "On Error",
            BlockKind::Class => "Class",
        }
    }

    /// The end marker that closes this kind of block.
    pub fn end_marker(self) -> &'static str {
        match self {
            BlockKind::Procedure(ProcedureKind::Function) => "End Function",
            BlockKind::Procedure(ProcedureKind::Sub) => "End Sub",
            BlockKind::Procedure(ProcedureKind::Property) => "End Property",
            BlockKind::Loop(LoopKind::For) => "Next",
            BlockKind::Loop(LoopKind::Do) => "Loop",
            BlockKind::Loop(LoopKind::While) => "Wend",
            BlockKind::Conditional => "End If",
            // Closed implicitly at the next procedure boundary.
            BlockKind::ErrorHandler => "procedure boundary",
            BlockKind::Class => "End Class",
        }
    }

    pub fn is_procedure(self) -> bool {
        matches!(self, BlockKind::Procedure(_))
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BlockKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A reference to one token of the scanned stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRef {
    pub index: usize,
    pub text: String,
    pub line: u32,
    pub column: u32,
}

impl TokenRef {
    pub fn new(index: usize, token: &Token) -> Self {
        Self {
            index,
            text: token.text.clone(),
            line: token.line,
            column: token.column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenRange {
    pub start: usize,
    pub end: usize,
}

impl TokenRange {
    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// One recovered block. `end` is `None` exactly when the block was never closed by
/// its own end marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockConstruct {
    pub id: BlockId,
    pub kind: BlockKind,
    pub name: Option<String>,
    pub header: Option<String>,
    pub parameter_text: Option<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub start: TokenRef,
    pub end: Option<TokenRef>,
    pub body_range: TokenRange,
    pub body: String,
}

impl BlockConstruct {
    pub fn is_terminated(&self) -> bool {
        self.end.is_some()
    }
}

/// Output of [`BlockScanner::scan`].
#[derive(Debug, Clone)]
pub struct BlockScan {
    /// All constructs in opening (source) order; `constructs[id].id == id`.
    pub constructs: Vec<BlockConstruct>,
    /// UnmatchedBlock diagnostics in the order the scanner raised them.
    pub diagnostics: Vec<Diagnostic>,
    owners: Vec<Option<BlockId>>,
    end_of_input: usize,
}

impl BlockScan {
    pub fn get(&self, id: BlockId) -> Option<&BlockConstruct> {
        self.constructs.get(id)
    }

    /// Innermost construct open on the block stack when `index` was scanned.
    pub fn owner_at(&self, index: usize) -> Option<BlockId> {
        self.owners.get(index).copied().flatten()
    }

    /// Token extent of a construct: from its start token through its end token, or
    /// through end of input when unterminated.
    pub fn extent(&self, id: BlockId) -> Option<Range<usize>> {
        let block = self.get(id)?;
        let last = block.end.as_ref().map_or(self.end_of_input, |end| end.index);
        Some(block.start.index..last + 1)
    }

    pub fn contains(&self, id: BlockId, index: usize) -> bool {
        self.extent(id).is_some_and(|r| r.contains(&index))
    }

    /// The construct that was open when `id` itself opened.
    pub fn parent(&self, id: BlockId) -> Option<BlockId> {
        self.get(id).and_then(|b| self.owner_at(b.start.index))
    }

    /// Nearest procedure or class enclosing `id` (itself included). A construct
    /// outside any of those is its own scope.
    pub fn scope_of(&self, id: BlockId) -> BlockId {
        let mut current = Some(id);
        while let Some(cur) = current {
            match self.get(cur) {
                Some(b) if b.kind.is_procedure() || b.kind == BlockKind::Class => return cur,
                _ => current = self.parent(cur),
            }
        }
        id
    }

    /// Every procedure, property, and class name, plus every parameter name.
    pub fn declared_names(&self) -> impl Iterator<Item = &str> {
        self.constructs.iter().flat_map(|b| {
            let own = match b.kind {
                BlockKind::Procedure(_) | BlockKind::Class => b.name.as_deref(),
                _ => None,
            };
            own.into_iter().chain(b.parameters.iter().map(|p| p.name.as_str()))
        })
    }

    pub fn of_kind(&self, pred: impl Fn(BlockKind) -> bool) -> impl Iterator<Item = &BlockConstruct> {
        self.constructs.iter().filter(move |b| pred(b.kind))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closer {
    EndFunction,
    EndSub,
    EndProperty,
    EndIf,
    EndClass,
    Next,
    Loop,
    Wend,
}

impl Closer {
    fn closes(self) -> BlockKind {
        match self {
            Closer::EndFunction => BlockKind::Procedure(ProcedureKind::Function),
            Closer::EndSub => BlockKind::Procedure(ProcedureKind::Sub),
            Closer::EndProperty => BlockKind::Procedure(ProcedureKind::Property),
            Closer::EndIf => BlockKind::Conditional,
            Closer::EndClass => BlockKind::Class,
            Closer::Next => BlockKind::Loop(LoopKind::For),
            Closer::Loop => BlockKind::Loop(LoopKind::Do),
            Closer::Wend => BlockKind::Loop(LoopKind::While),
        }
    }
}

pub struct BlockScanner<'a> {
    tokens: &'a [Token],
    source: &'a str,
    constructs: Vec<BlockConstruct>,
    stack: Vec<BlockId>,
    open_handlers: Vec<BlockId>,
    diagnostics: Vec<Diagnostic>,
    end_of_input: usize,
}

impl<'a> BlockScanner<'a> {
    /// Scan `tokens` (as produced by the tokenizer for `source`).
    pub fn scan(tokens: &'a [Token], source: &'a str) -> BlockScan {
        let mut scanner = BlockScanner {
            tokens,
            source,
            constructs: Vec::new(),
            stack: Vec::new(),
            open_handlers: Vec::new(),
            diagnostics: Vec::new(),
            end_of_input: tokens.len().saturating_sub(1),
        };
        let owners = scanner.run();
        tracing::debug!(
            constructs = scanner.constructs.len(),
            unmatched = scanner.diagnostics.len(),
            "block scan finished"
        );
        BlockScan {
            constructs: scanner.constructs,
            diagnostics: scanner.diagnostics,
            owners,
            end_of_input: scanner.end_of_input,
        }
    }

    fn run(&mut self) -> Vec<Option<BlockId>> {
        let tokens = self.tokens;
        let mut owners = Vec::with_capacity(tokens.len());
        let mut at_head = true;
        for (idx, token) in tokens.iter().enumerate() {
            owners.push(self.stack.last().copied());
            if at_head {
                self.statement_head(idx);
            }
            at_head = token.is_statement_break()
                || (at_head && token.keyword().is_some_and(Keyword::is_modifier));
        }
        self.finish();
        owners
    }

    fn keyword_at(&self, idx: usize) -> Option<Keyword> {
        self.tokens.get(idx).and_then(Token::keyword)
    }

    fn statement_head(&mut self, idx: usize) {
        let Some(kw) = self.keyword_at(idx) else {
            return;
        };
        match kw {
            Keyword::Function => self.open_procedure(idx, idx, ProcedureKind::Function),
            Keyword::Sub => self.open_procedure(idx, idx, ProcedureKind::Sub),
            Keyword::Property => {
                if matches!(self.keyword_at(idx + 1), Some(Keyword::Get | Keyword::Let | Keyword::Set)) {
                    self.open_procedure(idx, idx + 1, ProcedureKind::Property);
                }
            }
            Keyword::Class => self.open_block(idx, idx, BlockKind::Class),
            Keyword::For => self.open_block(idx, idx, BlockKind::Loop(LoopKind::For)),
            Keyword::Do => self.open_block(idx, idx, BlockKind::Loop(LoopKind::Do)),
            Keyword::While => self.open_block(idx, idx, BlockKind::Loop(LoopKind::While)),
            Keyword::If => self.open_conditional(idx),
            Keyword::On if self.keyword_at(idx + 1) == Some(Keyword::Error) => self.open_error_handler(idx),
            Keyword::End => {
                let closer = match self.keyword_at(idx + 1) {
                    Some(Keyword::Function) => Closer::EndFunction,
                    Some(Keyword::Sub) => Closer::EndSub,
                    Some(Keyword::Property) => Closer::EndProperty,
                    Some(Keyword::If) => Closer::EndIf,
                    Some(Keyword::Class) => Closer::EndClass,
                    // `End`, `End With`, `End Select`, ...: not a tracked block.
                    _ => return,
                };
                self.close(idx, closer);
            }
            Keyword::Next => {
                // `Next j, i` closes one For per named counter.
                for _ in 0..self.next_counters(idx) {
                    self.close(idx, Closer::Next);
                }
            }
            Keyword::Loop => self.close(idx, Closer::Loop),
            Keyword::Wend => self.close(idx, Closer::Wend),
            _ => {}
        }
    }

    /// Allocate a construct for `kind` starting at `start`; header parsing begins
    /// after `phrase_end` (the last keyword of the opening phrase).
    fn new_construct(&mut self, start: usize, phrase_end: usize, kind: BlockKind) -> BlockId {
        let info = HeaderInfo::parse(self.tokens, self.source, phrase_end, kind);
        let body_start = statement_break_after(self.tokens, phrase_end) + 1;
        let id = self.constructs.len();
        self.constructs.push(BlockConstruct {
            id,
            kind,
            name: info.name,
            header: info.header,
            parameter_text: info.parameter_text,
            parameters: info.parameters,
            return_type: info.return_type,
            start: TokenRef::new(start, &self.tokens[start]),
            end: None,
            body_range: TokenRange {
                start: body_start.min(self.end_of_input),
                end: self.end_of_input,
            },
            body: String::new(),
        });
        id
    }

    fn open_block(&mut self, start: usize, phrase_end: usize, kind: BlockKind) {
        let id = self.new_construct(start, phrase_end, kind);
        self.stack.push(id);
    }

    fn open_procedure(&mut self, start: usize, phrase_end: usize, kind: ProcedureKind) {
        // `Private Sub ...`: the boundary is the first modifier, not the keyword.
        let mut boundary = start;
        while boundary > 0 && self.tokens[boundary - 1].keyword().is_some_and(Keyword::is_modifier) {
            boundary -= 1;
        }
        self.close_error_handlers(boundary);
        self.open_block(start, phrase_end, BlockKind::Procedure(kind));
    }

    fn open_error_handler(&mut self, start: usize) {
        // Phrase is `On Error`; the header is what follows (`Resume Next`, `GoTo L`).
        let id = self.new_construct(start, start + 1, BlockKind::ErrorHandler);
        self.open_handlers.push(id);
    }

    fn open_conditional(&mut self, start: usize) {
        let line_end = self.line_end_after(start);
        let then_idx = (start + 1..line_end).find(|&i| self.tokens[i].is_keyword(Keyword::Then));
        let single_line = then_idx.is_some_and(|t| {
            let next = &self.tokens[t + 1];
            !next.is_line_end() && next.kind != TokenKind::CommentText
        });
        if !single_line {
            self.open_block(start, start, BlockKind::Conditional);
            return;
        }
        // `If cond Then stmt`: closed by the end of its own line.
        let then_idx = then_idx.unwrap_or(start);
        let id = self.new_construct(start, start, BlockKind::Conditional);
        let body_start = then_idx + 1;
        let body_end = (body_start..line_end)
            .find(|&i| self.tokens[i].kind == TokenKind::CommentText)
            .unwrap_or(line_end);
        let body_span = Span::new(self.tokens[body_start].span.start, self.tokens[body_end].span.start);
        let text = body_span.slice(self.source);
        let end_ref = TokenRef::new(line_end, &self.tokens[line_end]);
        let block = &mut self.constructs[id];
        block.body_range = TokenRange {
            start: body_start,
            end: body_end,
        };
        block.body = text.trim_end().to_string();
        block.end = Some(end_ref);
    }

    /// Number of loops a `Next` at `idx` closes: one, or one per comma-separated
    /// counter name.
    fn next_counters(&self, idx: usize) -> usize {
        let end = statement_break_after(self.tokens, idx);
        let commas = (idx + 1..end)
            .take_while(|&i| self.tokens[i].kind != TokenKind::CommentText)
            .filter(|&i| self.tokens[i].is_operator(","))
            .count();
        commas + 1
    }

    fn line_end_after(&self, idx: usize) -> usize {
        (idx..self.tokens.len())
            .find(|&i| self.tokens[i].is_line_end())
            .unwrap_or(self.end_of_input)
    }

    fn close(&mut self, idx: usize, closer: Closer) {
        let wanted = closer.closes();
        if wanted.is_procedure() {
            self.close_error_handlers(idx);
        }
        while let Some(top) = self.stack.pop() {
            if self.constructs[top].kind == wanted {
                self.finalize(top, Some(idx));
                return;
            }
            tracing::trace!(block = top, found = wanted.end_marker(), "popping mismatched block");
            self.report_mismatch(top, idx, wanted);
            self.finalize(top, None);
        }
        self.report_stray_closer(idx, wanted);
    }

    fn close_error_handlers(&mut self, boundary: usize) {
        for id in std::mem::take(&mut self.open_handlers) {
            self.finalize(id, Some(boundary));
        }
    }

    fn finish(&mut self) {
        let eoi = self.end_of_input;
        self.close_error_handlers(eoi);
        while let Some(top) = self.stack.pop() {
            self.report_unterminated(top);
            self.finalize(top, None);
        }
    }

    /// Record the end token (if any) and slice the body text.
    fn finalize(&mut self, id: BlockId, end: Option<usize>) {
        let body_end = end.unwrap_or(self.end_of_input);
        let body_start = self.constructs[id].body_range.start.min(body_end);
        let start_offset = match body_start.checked_sub(1) {
            Some(prev) if prev > self.constructs[id].start.index => self.tokens[prev].span.end.offset,
            _ => self.tokens[body_start].span.start.offset,
        };
        let end_offset = match end {
            Some(idx) => self.line_start_before(self.tokens[idx].span.start.offset),
            None => self.source.len(),
        };
        let body = self.source_between(start_offset, end_offset.max(start_offset)).to_string();
        let end_ref = end.map(|idx| TokenRef::new(idx, &self.tokens[idx]));

        let block = &mut self.constructs[id];
        block.body_range = TokenRange {
            start: body_start,
            end: body_end,
        };
        block.body = body;
        block.end = end_ref;
    }

    /// If only blanks precede `offset` on its line, back up to the start of that
    /// line so the closing line's indentation is not part of the body.
    fn line_start_before(&self, offset: usize) -> usize {
        let bytes = self.source.as_bytes();
        let mut i = offset;
        while i > 0 && matches!(bytes[i - 1], b' ' | b'\t') {
            i -= 1;
        }
        if i == 0 || bytes[i - 1] == b'\n' { i } else { offset }
    }

    fn source_between(&self, start: usize, end: usize) -> &'a str {
        let source = self.source;
        source.get(start..end).unwrap_or("")
    }

    fn describe(&self, id: BlockId) -> String {
        let block = &self.constructs[id];
        match &block.name {
            Some(name) => format!("`{}` block '{}'", block.kind, name),
            None => format!("`{}` block", block.kind),
        }
    }

    fn report_mismatch(&mut self, id: BlockId, closer_idx: usize, found: BlockKind) {
        let block = &self.constructs[id];
        let closer = &self.tokens[closer_idx];
        let message = format!(
            "{} opened at {}:{} was closed by `{}` at {}:{}; expected `{}`",
            self.describe(id),
            block.start.line,
            block.start.column,
            found.end_marker(),
            closer.line,
            closer.column,
            block.kind.end_marker()
        );
        let diag = Diagnostic::error(
            DiagnosticKind::UnmatchedBlock(block.kind),
            message,
            block.start.line,
            block.start.column,
        )
        .with_related_name(block.name.clone());
        self.diagnostics.push(diag);
    }

    fn report_unterminated(&mut self, id: BlockId) {
        let block = &self.constructs[id];
        let message = format!(
            "{} opened at {}:{} is never closed; expected `{}`",
            self.describe(id),
            block.start.line,
            block.start.column,
            block.kind.end_marker()
        );
        let diag = Diagnostic::error(
            DiagnosticKind::UnmatchedBlock(block.kind),
            message,
            block.start.line,
            block.start.column,
        )
        .with_related_name(block.name.clone());
        self.diagnostics.push(diag);
    }

    fn report_stray_closer(&mut self, idx: usize, kind: BlockKind) {
        let token = &self.tokens[idx];
        let message = format!(
            "`{}` at {}:{} has no open `{}` block",
            kind.end_marker(),
            token.line,
            token.column,
            kind
        );
        self.diagnostics
            .push(Diagnostic::error(DiagnosticKind::UnmatchedBlock(kind), message, token.line, token.column));
    }
}
