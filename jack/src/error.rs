//! Result and errors.
use std::{
    fmt::{self, Display, Formatter},
    string::FromUtf8Error,
};

use smol_str::SmolStr;

use crate::{
    lex::{Position, Token, TokenKind},
    symbols::SymbolKind,
};

pub type JackResult<T> = std::result::Result<T, JackError>;

#[derive(Debug)]
pub enum JackError {
    /// Token did not match any of the alternatives accepted
    /// at a grammar decision point.
    Token(TokenError),
    /// Token stream was consumed past the end-of-file token.
    EndOfSource,
    /// Identifier used as a storage location, but it's declared
    /// in neither the subroutine nor the class scope.
    UnresolvedSymbol { name: SmolStr, position: Position },
    /// Name declared twice in the same scope.
    DuplicateSymbol { name: SmolStr, kind: SymbolKind },
    /// Call target qualified by a name that is neither a variable
    /// nor a known class.
    UnknownCallee { name: SmolStr, position: Position },
    /// Integer literal doesn't fit the VM's constant range.
    IntegerOutOfRange { lexeme: SmolStr, position: Position },
    /// String literal has more characters than a constant can count.
    StringTooLong { length: usize, position: Position },
    /// String literal character without a code in the VM's constant range.
    CharOutOfRange { character: char, position: Position },
    /// Scope ran out of indices for the kind.
    TooManySymbols { name: SmolStr, kind: SymbolKind },
    Io(std::io::Error),
    Utf8(FromUtf8Error),
    Fmt(fmt::Error),
}

impl Display for JackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(err) => write!(f, "{}", err),
            Self::EndOfSource => write!(f, "unexpected end of source code"),
            Self::UnresolvedSymbol { name, position } => {
                write!(f, "{position}: undefined variable '{name}'")
            }
            Self::DuplicateSymbol { name, kind } => {
                write!(f, "{kind} '{name}' is already defined in this scope")
            }
            Self::UnknownCallee { name, position } => {
                write!(f, "{position}: '{name}' is neither a variable nor a known class")
            }
            Self::IntegerOutOfRange { lexeme, position } => {
                write!(f, "{position}: integer constant {lexeme} is out of range 0..=32767")
            }
            Self::StringTooLong { length, position } => {
                write!(f, "{position}: string constant of {length} characters is longer than 32767")
            }
            Self::CharOutOfRange { character, position } => {
                write!(f, "{position}: character {character:?} in string constant is out of range 0..=32767")
            }
            Self::TooManySymbols { name, kind } => {
                write!(f, "{kind} '{name}' exceeds the maximum number of {kind} variables")
            }
            Self::Io(err) => write!(f, "{}", err),
            Self::Utf8(err) => write!(f, "{}", err),
            Self::Fmt(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for JackError {}

impl From<TokenError> for JackError {
    fn from(err: TokenError) -> Self {
        JackError::Token(err)
    }
}

impl From<std::io::Error> for JackError {
    fn from(err: std::io::Error) -> Self {
        JackError::Io(err)
    }
}

impl From<FromUtf8Error> for JackError {
    fn from(err: FromUtf8Error) -> Self {
        JackError::Utf8(err)
    }
}

impl From<fmt::Error> for JackError {
    fn from(err: fmt::Error) -> Self {
        JackError::Fmt(err)
    }
}

/// Error returned when an unexpected token kind is encountered.
#[derive(Debug)]
pub struct TokenError {
    pub expected: Box<[TokenKind]>,
    pub encountered: Token,
    pub position: Position,
}

impl TokenError {
    pub fn new(expected: &[TokenKind], encountered: Token, source_code: &str) -> Self {
        let position = encountered.span.position(source_code);
        Self {
            expected: expected.into(),
            encountered,
            position,
        }
    }
}

impl Display for TokenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: encountered unexpected {}", self.position, self.encountered.kind)?;
        if matches!(self.encountered.kind, TokenKind::Ident | TokenKind::Number | TokenKind::String) {
            write!(f, " \"{}\"", self.encountered.lexeme)?;
        }

        match self.expected.as_ref() {
            [] => Ok(()),
            [kind] => write!(f, ", expected {}", kind),
            kinds => {
                let names = kinds.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, ", expected one of: {}", names.join(", "))
            }
        }
    }
}
