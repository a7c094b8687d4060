use crate::util::fast_map::{FastHashMap, fast_hash_map_with_capacity};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;

/// Reserved words recognised by the lexer. Matching is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Keyword {
    // Procedures and classes
    Function,
    Sub,
    Property,
    Get,
    Let,
    Set,
    Class,
    End,
    // Declarations and modifiers
    Dim,
    Static,
    Const,
    Private,
    Public,
    Friend,
    As,
    New,
    ByVal,
    ByRef,
    Optional,
    ParamArray,
    // Loops
    For,
    Each,
    In,
    To,
    Step,
    Next,
    Do,
    Loop,
    While,
    Until,
    Wend,
    Exit,
    // Conditionals
    If,
    Then,
    Else,
    ElseIf,
    // Error handling
    On,
    Error,
    Resume,
    GoTo,
    // Statements and operators
    Call,
    Not,
    And,
    Or,
    Xor,
    Mod,
    Is,
    Option,
    Explicit,
    Rem,
}

impl Keyword {
    pub const ALL: [Keyword; 50] = [
        Keyword::Function,
        Keyword::Sub,
        Keyword::Property,
        Keyword::Get,
        Keyword::Let,
        Keyword::Set,
        Keyword::Class,
        Keyword::End,
        Keyword::Dim,
        Keyword::Static,
        Keyword::Const,
        Keyword::Private,
        Keyword::Public,
        Keyword::Friend,
        Keyword::As,
        Keyword::New,
        Keyword::ByVal,
        Keyword::ByRef,
        Keyword::Optional,
        Keyword::ParamArray,
        Keyword::For,
        Keyword::Each,
        Keyword::In,
        Keyword::To,
        Keyword::Step,
        Keyword::Next,
        Keyword::Do,
        Keyword::Loop,
        Keyword::While,
        Keyword::Until,
        Keyword::Wend,
        Keyword::Exit,
        Keyword::If,
        Keyword::Then,
        Keyword::Else,
        Keyword::ElseIf,
        Keyword::On,
        Keyword::Error,
        Keyword::Resume,
        Keyword::GoTo,
        Keyword::Call,
        Keyword::Not,
        Keyword::And,
        Keyword::Or,
        Keyword::Xor,
        Keyword::Mod,
        Keyword::Is,
        Keyword::Option,
        Keyword::Explicit,
        Keyword::Rem,
    ];

    /// Canonical spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Function => "Function",
            Keyword::Sub => "Sub",
            Keyword::Property => "Property",
            Keyword::Get => "Get",
            Keyword::Let => "Let",
            Keyword::Set => "Set",
            Keyword::Class => "Class",
            Keyword::End => "End",
            Keyword::Dim => "Dim",
            Keyword::Static => "Static",
            Keyword::Const => "Const",
            Keyword::Private => "Private",
            Keyword::Public => "Public",
            Keyword::Friend => "Friend",
            Keyword::As => "As",
            Keyword::New => "New",
            Keyword::ByVal => "ByVal",
            Keyword::ByRef => "ByRef",
            Keyword::Optional => "Optional",
            Keyword::ParamArray => "ParamArray",
            Keyword::For => "For",
            Keyword::Each => "Each",
            Keyword::In => "In",
            Keyword::To => "To",
            Keyword::Step => "Step",
            Keyword::Next => "Next",
            Keyword::Do => "Do",
            Keyword::Loop => "Loop",
            Keyword::While => "While",
            Keyword::Until => "Until",
            Keyword::Wend => "Wend",
            Keyword::Exit => "Exit",
            Keyword::If => "If",
            Keyword::Then => "Then",
            Keyword::Else => "Else",
            Keyword::ElseIf => "ElseIf",
            Keyword::On => "On",
            Keyword::Error => "Error",
            Keyword::Resume => "Resume",
            Keyword::GoTo => "GoTo",
            Keyword::Call => "Call",
            Keyword::Not => "Not",
            Keyword::And => "And",
            Keyword::Or => "Or",
            Keyword::Xor => "Xor",
            Keyword::Mod => "Mod",
            Keyword::Is => "Is",
            Keyword::Option => "Option",
            Keyword::Explicit => "Explicit",
            Keyword::Rem => "Rem",
        }
    }

    /// Look up a word as a keyword, ignoring ASCII case.
    pub fn lookup(word: &str) -> Option<Keyword> {
        if word.len() > MAX_KEYWORD_LEN {
            return None;
        }
        KEYWORDS.get(word.to_ascii_lowercase().as_str()).copied()
    }

    /// Modifiers that may precede a procedure, class, or field declaration.
    pub fn is_modifier(self) -> bool {
        matches!(self, Keyword::Private | Keyword::Public | Keyword::Friend | Keyword::Static)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const MAX_KEYWORD_LEN: usize = 10;

static KEYWORDS: Lazy<FastHashMap<String, Keyword>> = Lazy::new(|| {
    let mut map = fast_hash_map_with_capacity(Keyword::ALL.len());
    for kw in Keyword::ALL {
        map.insert(kw.as_str().to_ascii_lowercase(), kw);
    }
    map
});
