mod keyword;
mod lexer;
mod span;


pub use keyword::Keyword;
pub use lexer::{Token, TokenKind, Tokenizer};
pub use span::{Position, Span};
