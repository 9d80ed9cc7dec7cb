pub mod lexer;
pub mod token;

pub use lexer::{ByteValidation, Lexer};
pub use token::{SpannedToken, Token, KEYWORD_TOKENS};
