use crate::scan::{BlockId, BlockScan, TokenRange, type_name};
use crate::token::{Keyword, Token, TokenKind};
use crate::util::fast_map::{FastHashSet, fast_hash_set_new};
use serde::Serialize;


/// Type recorded for declarations without an `As` clause.
pub const IMPLICIT_TYPE: &str = "Variant";

/// A name bound by a `Dim`-style statement. Redeclarations are kept as separate
/// entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    pub name: String,
    pub declared_type: String,
    pub owning_construct_id: Option<BlockId>,
    pub keyword: Keyword,
    pub line: u32,
    pub column: u32,
    #[serde(skip)]
    pub token_index: usize,
    #[serde(skip)]
    pub statement: TokenRange,
}

impl Declaration {
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub text: String,
    pub line: u32,
    pub column: u32,
}

/// Declarations and comments of one file, in source order.
#[derive(Debug, Clone, Default)]
pub struct DeclarationTable {
    pub declarations: Vec<Declaration>,
    pub comments: Vec<Comment>,
    /// Whether the module carries `Option Explicit`.
    pub option_explicit: bool,
    name_tokens: FastHashSet<usize>,
}

impl DeclarationTable {
    /// True if the token at `index` is the name of some declaration.
    pub fn is_declaration_name(&self, index: usize) -> bool {
        self.name_tokens.contains(&index)
    }

    pub fn named<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s Declaration> + 's {
        self.declarations.iter().filter(move |d| d.matches(name))
    }

    /// Last-write-wins lookup.
    pub fn lookup<'s>(&'s self, name: &'s str) -> Option<&'s Declaration> {
        self.named(name).last()
    }
}

pub struct DeclarationCollector<'a> {
    tokens: &'a [Token],
    blocks: &'a BlockScan,
    table: DeclarationTable,
}

impl<'a> DeclarationCollector<'a> {
    /// Walk `tokens`, using `blocks` to find the construct that owns each declaration.
    pub fn collect(tokens: &'a [Token], blocks: &'a BlockScan) -> DeclarationTable {
        let mut collector = DeclarationCollector {
            tokens,
            blocks,
            table: DeclarationTable {
                name_tokens: fast_hash_set_new(),
                ..Default::default()
            },
        };
        collector.run();
        tracing::debug!(
            declarations = collector.table.declarations.len(),
            comments = collector.table.comments.len(),
            "declarations collected"
        );
        collector.table
    }

    fn run(&mut self) {
        let tokens = self.tokens;
        let mut at_head = true;
        for (idx, token) in tokens.iter().enumerate() {
            if token.kind == TokenKind::CommentText {
                self.table.comments.push(Comment {
                    text: token.text.clone(),
                    line: token.line,
                    column: token.column,
                });
            }
            if at_head {
                self.statement_head(idx);
            }
            at_head = token.is_statement_break();
        }
    }

    fn keyword_at(&self, idx: usize) -> Option<Keyword> {
        self.tokens.get(idx).and_then(Token::keyword)
    }

    fn statement_head(&mut self, idx: usize) {
        let Some(kw) = self.keyword_at(idx) else {
            return;
        };
        match kw {
            Keyword::Dim => self.declaration_list(idx, idx + 1, Keyword::Dim),
            Keyword::Const => self.declaration_list(idx, idx + 1, Keyword::Const),
            Keyword::Option => {
                if self.keyword_at(idx + 1) == Some(Keyword::Explicit) {
                    self.table.option_explicit = true;
                }
            }
            kw if kw.is_modifier() => self.modified_statement(idx, kw),
            _ => {}
        }
    }

    /// `Private x As T`, `Public Const C = 1`, `Static n As Long`, or a modified
    /// procedure header (ignored here).
    fn modified_statement(&mut self, head: usize, first: Keyword) {
        let mut idx = head;
        while self.keyword_at(idx).is_some_and(Keyword::is_modifier) {
            idx += 1;
        }
        let Some(next) = self.tokens.get(idx) else {
            return;
        };
        match next.keyword() {
            Some(Keyword::Const) => self.declaration_list(head, idx + 1, Keyword::Const),
            Some(Keyword::Dim) => self.declaration_list(head, idx + 1, first),
            None if next.is_identifier() && !is_non_variable_statement(&next.text) => {
                self.declaration_list(head, idx, first)
            }
            _ => {}
        }
    }

    /// Parse `name [(bounds)] [As [New] Type] [= value]` items separated by commas,
    /// starting at `first` and ending at the statement break.
    fn declaration_list(&mut self, head: usize, first: usize, keyword: Keyword) {
        let tokens = self.tokens;
        let end = (first..tokens.len())
            .find(|&i| tokens[i].is_statement_break() || tokens[i].kind == TokenKind::CommentText)
            .unwrap_or(tokens.len().saturating_sub(1));
        let statement = TokenRange { start: head, end };
        let owner = self.blocks.owner_at(head);

        let mut idx = first;
        while idx < end {
            if tokens[idx].is_identifier() && tokens[idx].text.eq_ignore_ascii_case("WithEvents") {
                idx += 1;
            }
            let item_end = item_end(tokens, idx, end);
            if let Some(name_tok) = tokens.get(idx).filter(|t| t.is_identifier() && idx < item_end) {
                let item = &tokens[idx + 1..item_end];
                let declared_type = item
                    .iter()
                    .position(|t| t.is_keyword(Keyword::As))
                    .and_then(|p| type_name(&item[p + 1..]))
                    .unwrap_or_else(|| IMPLICIT_TYPE.to_string());
                self.table.name_tokens.insert(idx);
                self.table.declarations.push(Declaration {
                    name: name_tok.text.clone(),
                    declared_type,
                    owning_construct_id: owner,
                    keyword,
                    line: name_tok.line,
                    column: name_tok.column,
                    token_index: idx,
                    statement,
                });
            }
            idx = item_end + 1;
        }
    }
}

/// End (exclusive) of one comma-separated declarator: the next top-level `,` or
/// the statement end.
fn item_end(tokens: &[Token], start: usize, end: usize) -> usize {
    let mut depth = 0i32;
    for i in start..end {
        let tok = &tokens[i];
        if tok.is_operator("(") {
            depth += 1;
        } else if tok.is_operator(")") {
            depth -= 1;
        } else if tok.is_operator(",") && depth <= 0 {
            return i;
        }
    }
    end
}

/// Identifiers that can follow `Private`/`Public` without declaring a variable.
fn is_non_variable_statement(word: &str) -> bool {
    ["Declare", "Type", "Enum", "Event", "Implements"]
        .iter()
        .any(|w| w.eq_ignore_ascii_case(word))
}
