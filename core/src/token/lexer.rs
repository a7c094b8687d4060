use crate::token::{Keyword, Position, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier,
    Operator,
    StringLiteral,
    NumberLiteral,
    CommentText,
    Newline,
    EndOfInput,
}

/// One classified lexeme. `text` is the verbatim lexeme, except for comments (leading
/// marker removed) and strings (quotes removed, doubled quotes collapsed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub column: u32,
    pub span: Span,
}

impl Token {
    pub fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(kw) => Some(kw),
            _ => None,
        }
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind == TokenKind::Keyword(kw)
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }

    /// Newline or end of input: the tokens that terminate a logical line.
    pub fn is_line_end(&self) -> bool {
        matches!(self.kind, TokenKind::Newline | TokenKind::EndOfInput)
    }

    /// Statement separators: line ends and the `:` operator.
    pub fn is_statement_break(&self) -> bool {
        self.is_line_end() || self.is_operator(":")
    }
}

const ASCII_WHITESPACE: u8 = 1 << 0;
const ASCII_DIGIT: u8 = 1 << 1;
const ASCII_ALPHA: u8 = 1 << 2;
const ASCII_IDENT_CONT: u8 = 1 << 3;
const ASCII_TYPE_SUFFIX: u8 = 1 << 4;

const fn build_ascii_class() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let c = i as u8;
        // '\n' is significant in VBA and is never skipped as whitespace.
        if matches!(c, b' ' | b'\t' | b'\r' | 0x0B | 0x0C) {
            table[i] |= ASCII_WHITESPACE;
        }
        if c >= b'0' && c <= b'9' {
            table[i] |= ASCII_DIGIT | ASCII_IDENT_CONT;
        }
        if (c >= b'a' && c <= b'z') || (c >= b'A' && c <= b'Z') {
            table[i] |= ASCII_ALPHA | ASCII_IDENT_CONT;
        }
        if c == b'_' {
            table[i] |= ASCII_IDENT_CONT;
        }
        if matches!(c, b'$' | b'%' | b'&' | b'!' | b'#' | b'@') {
            table[i] |= ASCII_TYPE_SUFFIX;
        }
        i += 1;
    }
    table
}

const ASCII_CLASS: [u8; 256] = build_ascii_class();

#[inline]
fn ascii_flags(c: char) -> u8 {
    if c.is_ascii() { ASCII_CLASS[c as usize] } else { 0 }
}

#[inline]
fn is_space_char(c: char) -> bool {
    if c.is_ascii() {
        ascii_flags(c) & ASCII_WHITESPACE != 0
    } else {
        c.is_whitespace()
    }
}

#[inline]
fn is_ident_start(c: char) -> bool {
    if c.is_ascii() {
        ascii_flags(c) & ASCII_ALPHA != 0
    } else {
        c.is_alphabetic()
    }
}

#[inline]
fn is_ident_continue(c: char) -> bool {
    if c.is_ascii() {
        ascii_flags(c) & ASCII_IDENT_CONT != 0
    } else {
        c.is_alphanumeric()
    }
}

#[inline]
fn is_type_suffix(c: char) -> bool {
    ascii_flags(c) & ASCII_TYPE_SUFFIX != 0
}

/// Single-pass VBA tokenizer. Never fails: unknown characters become one-character
/// operator tokens, unterminated strings stop at the end of their line.
pub struct Tokenizer<'a> {
    chars: Vec<char>,
    idx: usize,
    len: usize,
    offset: usize,
    line: u32,
    column: u32,
    pub tokens: Vec<Token>,
    input: &'a str,
}

impl<'a> Tokenizer<'a> {
    /// Tokenize `s`. The result always ends with exactly one `EndOfInput` token.
    pub fn tokenize(s: &str) -> Vec<Token> {
        let mut t = Tokenizer::new(s);
        t.run();
        t.tokens
    }

    pub fn new(input: &'a str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        Self {
            len: chars.len(),
            chars,
            idx: 0,
            offset: 0,
            line: 1,
            column: 1,
            tokens: Vec::with_capacity(input.len() / 4),
            input,
        }
    }

    pub fn current_position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    fn eof(&self) -> bool {
        self.idx >= self.len
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.idx + ahead).copied()
    }

    fn advance_char(&mut self) {
        if self.eof() {
            return;
        }
        let c = self.chars[self.idx];
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.offset += c.len_utf8();
        self.idx += 1;
    }

    fn skip_whitespace(&mut self) {
        while !self.eof() && is_space_char(self.chars[self.idx]) {
            self.advance_char();
        }
    }

    /// True when the next token would begin a statement: start of input, after a
    /// line break, or after a `:` separator.
    fn at_statement_start(&self) -> bool {
        self.tokens.last().is_none_or(|t| t.is_statement_break())
    }

    fn push(&mut self, kind: TokenKind, text: String, start: Position) {
        let end = self.current_position();
        self.tokens.push(Token {
            kind,
            text,
            line: start.line,
            column: start.column,
            span: Span::new(start, end),
        });
    }

    /// Consume the rest of the line (not the newline) and return it verbatim.
    fn take_rest_of_line(&mut self) -> String {
        let begin = self.offset;
        while !self.eof() && self.chars[self.idx] != '\n' {
            self.advance_char();
        }
        let text = &self.input[begin..self.offset];
        text.strip_suffix('\r').unwrap_or(text).to_string()
    }

    fn parse_comment(&mut self) {
        let start = self.current_position();
        self.advance_char(); // skip '
        let text = self.take_rest_of_line();
        self.push(TokenKind::CommentText, text, start);
    }

    fn parse_str(&mut self) {
        let start = self.current_position();
        self.advance_char(); // skip opening quote
        let mut content = String::new();
        while !self.eof() {
            let c = self.chars[self.idx];
            if c == '"' {
                if self.peek_at(1) == Some('"') {
                    content.push('"');
                    self.advance_char();
                    self.advance_char();
                    continue;
                }
                self.advance_char();
                break;
            }
            if c == '\n' {
                // Unterminated: the literal ends with its line.
                break;
            }
            content.push(c);
            self.advance_char();
        }
        self.push(TokenKind::StringLiteral, content, start);
    }

    fn parse_num(&mut self) {
        let start = self.current_position();
        let mut seen_dot = false;
        let mut seen_exp = false;
        while let Some(c) = self.peek_at(0) {
            if c.is_ascii_digit() {
                self.advance_char();
            } else if c == '.' && !seen_dot && !seen_exp {
                seen_dot = true;
                self.advance_char();
            } else if matches!(c, 'e' | 'E')
                && !seen_exp
                && self.peek_at(1).is_some_and(|n| n.is_ascii_digit() || n == '+' || n == '-')
            {
                seen_exp = true;
                self.advance_char();
                if matches!(self.peek_at(0), Some('+' | '-')) {
                    self.advance_char();
                }
            } else {
                break;
            }
        }
        self.take_type_suffix();
        let text = self.input[start.offset..self.offset].to_string();
        self.push(TokenKind::NumberLiteral, text, start);
    }

    /// `&H1F` / `&O17` style literals.
    fn parse_radix_num(&mut self) {
        let start = self.current_position();
        self.advance_char(); // '&'
        self.advance_char(); // 'H' or 'O'
        while self.peek_at(0).is_some_and(|c| c.is_ascii_hexdigit()) {
            self.advance_char();
        }
        self.take_type_suffix();
        let text = self.input[start.offset..self.offset].to_string();
        self.push(TokenKind::NumberLiteral, text, start);
    }

    /// A type-declaration character directly after a name or number (`Left$`, `10#`)
    /// belongs to that lexeme unless it starts something longer.
    fn take_type_suffix(&mut self) -> bool {
        match (self.peek_at(0), self.peek_at(1)) {
            (Some(c), next) if is_type_suffix(c) && !next.is_some_and(is_ident_continue) => {
                self.advance_char();
                true
            }
            _ => false,
        }
    }

    fn parse_word(&mut self) {
        let start = self.current_position();
        let statement_start = self.at_statement_start();
        while self.peek_at(0).is_some_and(is_ident_continue) {
            self.advance_char();
        }
        let word_end = self.offset;
        let suffixed = self.take_type_suffix();
        let word = &self.input[start.offset..word_end];

        let keyword = if suffixed { None } else { Keyword::lookup(word) };
        match keyword {
            Some(Keyword::Rem) if statement_start => {
                // `Rem` comment: drop the keyword and one separating blank.
                if matches!(self.peek_at(0), Some(' ' | '\t')) {
                    self.advance_char();
                }
                let text = self.take_rest_of_line();
                self.push(TokenKind::CommentText, text, start);
            }
            Some(kw) => {
                let text = word.to_string();
                self.push(TokenKind::Keyword(kw), text, start);
            }
            None => {
                let text = self.input[start.offset..self.offset].to_string();
                self.push(TokenKind::Identifier, text, start);
            }
        }
    }

    /// ` _` followed by optional blanks and a line break joins two physical lines.
    fn try_line_continuation(&mut self) -> bool {
        let preceded_by_space = self.idx > 0 && is_space_char(self.chars[self.idx - 1]);
        if !preceded_by_space {
            return false;
        }
        let mut ahead = 1;
        while let Some(c) = self.peek_at(ahead) {
            if c == '\n' {
                for _ in 0..=ahead {
                    self.advance_char();
                }
                return true;
            }
            if !is_space_char(c) {
                return false;
            }
            ahead += 1;
        }
        false
    }

    fn parse_operator(&mut self) {
        let start = self.current_position();
        let c = self.chars[self.idx];
        let two = match (c, self.peek_at(1)) {
            ('<', Some('=' | '>')) | ('>', Some('=')) | (':', Some('=')) => true,
            _ => false,
        };
        self.advance_char();
        if two {
            self.advance_char();
        }
        let text = self.input[start.offset..self.offset].to_string();
        self.push(TokenKind::Operator, text, start);
    }

    fn run(&mut self) {
        while !self.eof() {
            self.skip_whitespace();
            if self.eof() {
                break;
            }
            let c = self.chars[self.idx];
            match c {
                '\n' => {
                    let start = self.current_position();
                    self.advance_char();
                    self.push(TokenKind::Newline, "\n".to_string(), start);
                }
                '\'' => self.parse_comment(),
                '"' => self.parse_str(),
                '0'..='9' => self.parse_num(),
                '.' if self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => self.parse_num(),
                '&' if matches!(self.peek_at(1), Some('h' | 'H' | 'o' | 'O'))
                    && self.peek_at(2).is_some_and(|n| n.is_ascii_hexdigit()) =>
                {
                    self.parse_radix_num()
                }
                '_' if self.try_line_continuation() => {}
                c if is_ident_start(c) => self.parse_word(),
                _ => self.parse_operator(),
            }
        }
        let end = self.current_position();
        self.tokens.push(Token {
            kind: TokenKind::EndOfInput,
            text: String::new(),
            line: end.line,
            column: end.column,
            span: Span::single(end),
        });
    }
}
