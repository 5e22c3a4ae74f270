//! Peekable token stream.
use std::iter::Peekable;

use crate::error::{JackError, JackResult, TokenError};

use super::{lexer::LexerIter, Lexer, Token, TokenKind};

/// Stream of tokens with one token of look ahead.
///
/// Tokens are lazily lexed. Peeking or consuming the next token
/// triggers the internal lexer. Together with the previously
/// consumed token this gives the parser its current and peek tokens.
pub struct TokenStream<'a> {
    lexer: Peekable<LexerIter<'a>>,
    /// Keep reference to the source so errors can
    /// locate tokens.
    original: &'a str,
    /// A copy of the previous token.
    prev: Option<Token>,
}

impl<'a> TokenStream<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            original: lexer.source_code(),
            lexer: lexer.into_iter().peekable(),
            prev: None,
        }
    }

    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// The most recently consumed token.
    pub fn previous_token(&self) -> Option<&Token> {
        self.prev.as_ref()
    }

    /// Consumes the current token regardless of type.
    ///
    /// Returns `None` when the cursor is past the end of the token stream.
    #[inline]
    pub fn next_token(&mut self) -> Option<Token> {
        self.prev = self.lexer.next();
        self.prev.clone()
    }

    /// Return the current token without advancing the cursor.
    ///
    /// Returns `None` when lexing is done.
    #[inline]
    pub fn peek(&mut self) -> Option<&Token> {
        self.lexer.peek()
    }

    /// Return the current token kind without advancing the cursor.
    #[inline]
    pub fn peek_kind(&mut self) -> Option<TokenKind> {
        self.lexer.peek().map(|token| token.kind)
    }

    /// Test whether the upcoming token has the given kind.
    #[inline]
    pub fn check(&mut self, token_kind: TokenKind) -> bool {
        self.peek_kind() == Some(token_kind)
    }

    /// Test whether the upcoming token has one of the given kinds.
    pub fn check_any(&mut self, token_kinds: &[TokenKind]) -> bool {
        match self.peek_kind() {
            Some(kind) => token_kinds.contains(&kind),
            None => false,
        }
    }

    /// Consumes the current token if it matches the given token kind.
    ///
    /// Returns true when matched. Does not consume the token if the
    /// kinds do not match.
    pub fn match_token(&mut self, token_kind: TokenKind) -> bool {
        let is_match = self.check(token_kind);
        if is_match {
            let _ = self.next_token(); // discard
        }
        is_match
    }

    /// Return the current token and advance the cursor.
    ///
    /// The consumed token must match the given token type, otherwise
    /// a parsing error is returned. The cursor is not advanced if
    /// the token kind does not match.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] if the token kind doesn't match.
    pub fn consume(&mut self, token_kind: TokenKind) -> JackResult<Token> {
        self.consume_any(&[token_kind])
    }

    /// Return the current token and advance the cursor, if the
    /// token matches any of the given kinds.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] listing the accepted kinds if none match.
    pub fn consume_any(&mut self, token_kinds: &[TokenKind]) -> JackResult<Token> {
        match self.lexer.peek() {
            Some(token) if token_kinds.contains(&token.kind) => {
                self.next_token().ok_or(JackError::EndOfSource)
            }
            Some(token) => {
                let encountered = token.clone();
                Err(TokenError::new(token_kinds, encountered, self.original).into())
            }
            None => Err(JackError::EndOfSource),
        }
    }
}
