use super::{BlockKind, LoopKind};
use crate::token::{Keyword, Span, Token, TokenKind};
use serde::Serialize;

/// One formal parameter of a procedure header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    pub declared_type: Option<String>,
    pub optional: bool,
}

/// Header fields parsed from the tokens between the opening phrase and the end of
/// its statement.
#[derive(Debug, Default)]
pub(super) struct HeaderInfo {
    pub name: Option<String>,
    pub header: Option<String>,
    pub parameter_text: Option<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
}

/// Index of the first statement break (newline, `:`, end of input) after `idx`.
pub(super) fn statement_break_after(tokens: &[Token], idx: usize) -> usize {
    (idx + 1..tokens.len())
        .find(|&i| tokens[i].is_statement_break())
        .unwrap_or(tokens.len().saturating_sub(1))
}

/// End of the header: the statement break, or a trailing comment before it.
fn header_end(tokens: &[Token], phrase_end: usize) -> usize {
    (phrase_end + 1..tokens.len())
        .find(|&i| tokens[i].is_statement_break() || tokens[i].kind == TokenKind::CommentText)
        .unwrap_or(tokens.len().saturating_sub(1))
}

impl HeaderInfo {
    pub fn parse(tokens: &[Token], source: &str, phrase_end: usize, kind: BlockKind) -> Self {
        let end = header_end(tokens, phrase_end);
        let header_tokens = &tokens[(phrase_end + 1).min(end)..end];

        let mut info = HeaderInfo {
            header: verbatim(source, tokens, phrase_end, end),
            ..Default::default()
        };
        match kind {
            BlockKind::Procedure(_) => info.parse_procedure(source, header_tokens),
            BlockKind::Class => {
                info.name = header_tokens.first().filter(|t| t.is_identifier()).map(|t| t.text.clone());
            }
            BlockKind::Loop(LoopKind::For) => {
                let mut rest = header_tokens;
                if rest.first().is_some_and(|t| t.is_keyword(Keyword::Each)) {
                    rest = &rest[1..];
                }
                info.name = rest.first().filter(|t| t.is_identifier()).map(|t| t.text.clone());
            }
            _ => {}
        }
        info
    }

    fn parse_procedure(&mut self, source: &str, tokens: &[Token]) {
        let Some(first) = tokens.first() else {
            return;
        };
        if first.is_identifier() {
            self.name = Some(first.text.clone());
        }
        let rest = &tokens[1..];
        let Some(open) = rest.iter().position(|t| t.is_operator("(")) else {
            return;
        };

        let mut depth = 0usize;
        let mut close = None;
        let mut segment_start = open + 1;
        let mut segments: Vec<&[Token]> = Vec::new();
        for (i, tok) in rest.iter().enumerate().skip(open) {
            if tok.is_operator("(") {
                depth += 1;
            } else if tok.is_operator(")") {
                depth -= 1;
                if depth == 0 {
                    segments.push(&rest[segment_start..i]);
                    close = Some(i);
                    break;
                }
            } else if tok.is_operator(",") && depth == 1 {
                segments.push(&rest[segment_start..i]);
                segment_start = i + 1;
            }
        }
        let Some(close) = close else {
            // Unbalanced parameter list: keep whatever follows the paren verbatim.
            let from = rest[open].span.end.offset;
            let to = rest.last().map_or(from, |t| t.span.end.offset);
            self.parameter_text = source.get(from..to).map(|s| s.trim().to_string());
            return;
        };

        let from = rest[open].span.end.offset;
        let to = rest[close].span.start.offset;
        self.parameter_text = source.get(from..to).map(|s| s.trim().to_string());
        self.parameters = segments.into_iter().filter_map(parse_parameter).collect();

        let after = &rest[close + 1..];
        if after.first().is_some_and(|t| t.is_keyword(Keyword::As)) {
            self.return_type = type_name(&after[1..]);
        }
    }
}

fn parse_parameter(tokens: &[Token]) -> Option<Parameter> {
    let mut optional = false;
    let mut i = 0;
    while let Some(kw) = tokens.get(i).and_then(Token::keyword) {
        match kw {
            Keyword::Optional => optional = true,
            Keyword::ByVal | Keyword::ByRef | Keyword::ParamArray => {}
            _ => break,
        }
        i += 1;
    }
    let name = tokens.get(i).filter(|t| t.is_identifier())?.text.clone();
    let declared_type = tokens[i + 1..]
        .iter()
        .position(|t| t.is_keyword(Keyword::As))
        .and_then(|p| type_name(&tokens[i + 1 + p + 1..]));
    Some(Parameter {
        name,
        declared_type,
        optional,
    })
}

/// Type name after `As`: `Long`, `New Collection`, `Scripting.Dictionary`.
pub(crate) fn type_name(tokens: &[Token]) -> Option<String> {
    let mut iter = tokens.iter().peekable();
    if iter.peek().is_some_and(|t| t.is_keyword(Keyword::New)) {
        iter.next();
    }
    let mut name = String::new();
    let mut expect_part = true;
    for tok in iter {
        if expect_part && (tok.is_identifier() || tok.keyword().is_some()) {
            name.push_str(&tok.text);
            expect_part = false;
        } else if !expect_part && tok.is_operator(".") {
            name.push('.');
            expect_part = true;
        } else {
            break;
        }
    }
    let name = name.trim_end_matches('.');
    (!name.is_empty()).then(|| name.to_string())
}

fn verbatim(source: &str, tokens: &[Token], phrase_end: usize, end: usize) -> Option<String> {
    let text = Span::new(tokens[phrase_end].span.end, tokens[end].span.start)
        .slice(source)
        .trim();
    (!text.is_empty()).then(|| text.to_string())
}
