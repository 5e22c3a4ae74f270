//! Lexical analysis
use log::warn;
use smol_str::SmolStr;

use super::{
    cursor::{Cursor, EOF_CHAR},
    tokens::{Keyword, Span, Token, TokenKind},
};

pub struct Lexer<'a> {
    /// Character scanner
    cursor: Cursor<'a>,
    /// Keep reference to the source so the parser can
    /// slice fragments from it.
    original: &'a str,
    /// Start absolute byte position of the current token
    /// in the source.
    start_pos: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source_code: &'a str) -> Self {
        let mut cursor = Cursor::new(source_code);

        // Initial state of the cursor is a non-existant EOF char,
        // but the initial state of the lexer should be a valid
        // token starting character.
        //
        // Prime the cursor for the first iteration.
        cursor.next();

        let start_pos = cursor.offset();

        Self {
            cursor,
            original: source_code,
            start_pos,
        }
    }

    /// Original source code that was passed in during construction.
    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// Scan the source characters and construct the next token.
    ///
    /// Scanning never fails. Characters that can't start a token are
    /// skipped, and once the source is exhausted every call returns
    /// an [`TokenKind::EOF`] token.
    ///
    /// ## Implementation
    ///
    /// Each iteration starts with the assumption that the internal cursor
    /// is pointing to the start of the remaining source to be consumed.
    /// When an iteration is done building a token, it must leave the cursor
    /// at the start of the next token's text.
    pub fn next_token(&mut self) -> Token {
        use TokenKind as TK;

        loop {
            self.erase_trivia();
            self.start_token();

            let kind = match self.cursor.current() {
                '{' => TK::LeftBrace,
                '}' => TK::RightBrace,
                '(' => TK::LeftParen,
                ')' => TK::RightParen,
                '[' => TK::LeftBracket,
                ']' => TK::RightBracket,
                '.' => TK::Dot,
                ',' => TK::Comma,
                ';' => TK::Semicolon,
                '+' => TK::Plus,
                '-' => TK::Minus,
                '*' => TK::Star,
                '/' => TK::Slash,
                '&' => TK::Amp,
                '|' => TK::Pipe,
                '<' => TK::Lt,
                '>' => TK::Gt,
                '=' => TK::Eq,
                '~' => TK::Tilde,
                '"' => return self.consume_string(),
                '_' | 'a'..='z' | 'A'..='Z' => return self.consume_ident(),
                '0'..='9' => return self.consume_number(),
                EOF_CHAR if self.cursor.at_end() => TK::EOF,
                c => {
                    warn!("skipping unexpected character {:?} at byte {}", c, self.cursor.offset());
                    self.cursor.next();
                    continue;
                }
            };

            return self.make_token(kind);
        }
    }

    /// Indicates whether the lexer is at the end of the source.
    pub fn at_end(&self) -> bool {
        self.cursor.at_end()
    }

    /// Create a span using the starting position of the current token,
    /// and the offset just past the cursor's current character.
    fn make_span(&mut self) -> Span {
        let start = self.start_pos;
        let end = if self.cursor.at_end() {
            self.cursor.offset()
        } else {
            self.cursor.peek_offset()
        };

        // start and end can be equal, and a token can have 0 size.
        debug_assert!(end >= start);
        Span::new(start, end - start)
    }

    /// Primes the lexer to consume the next token.
    fn start_token(&mut self) {
        self.start_pos = self.cursor.offset();
    }

    /// Build a token, using the source text from the position
    /// stored by `start_token` up to and including the current
    /// character.
    ///
    /// Also prepare the cursor for the next iteration.
    fn make_token(&mut self, kind: TokenKind) -> Token {
        let span = self.make_span();
        let token = Token {
            lexeme: SmolStr::from(span.fragment(self.original)),
            span,
            kind,
        };

        // Position the cursor to the starting character for the
        // next token.
        self.cursor.next();

        token
    }
}

/// Specialised tokens.
impl<'a> Lexer<'a> {
    /// Erase whitespace and comments in front of the next token.
    fn erase_trivia(&mut self) {
        loop {
            while is_whitespace(self.cursor.current()) {
                self.cursor.next();
            }

            match (self.cursor.current(), self.cursor.peek()) {
                ('/', '/') => self.erase_line_comment(),
                ('/', '*') => self.erase_block_comment(),
                _ => return,
            }
        }
    }

    /// Erase comment line up to, but not including, the trailing newline.
    fn erase_line_comment(&mut self) {
        debug_assert_eq!(self.cursor.current(), '/');

        while !is_newline(self.cursor.current()) && !self.cursor.at_end() {
            self.cursor.next();
        }
    }

    /// Erase a `/* ... */` comment, including the closing delimiter.
    ///
    /// An unterminated comment swallows the rest of the source.
    fn erase_block_comment(&mut self) {
        debug_assert_eq!(self.cursor.current(), '/');

        // Step over the opening `/*`
        self.cursor.next();
        self.cursor.next();

        while !self.cursor.at_end() {
            if self.cursor.current() == '*' && self.cursor.peek() == '/' {
                self.cursor.next();
                self.cursor.next();
                return;
            }
            self.cursor.next();
        }
    }

    /// Make an identifier or keyword token.
    fn consume_ident(&mut self) -> Token {
        debug_assert!(is_letter(self.cursor.current()));

        while is_letter_or_digit(self.cursor.peek()) {
            self.cursor.next();
        }

        let fragment = self.make_span().fragment(self.original);
        let token_kind = match Keyword::parse(fragment) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Ident,
        };

        self.make_token(token_kind)
    }

    /// Make a number literal token.
    ///
    /// The value is not checked here, the lexeme is passed on as is.
    fn consume_number(&mut self) -> Token {
        debug_assert!(is_digit(self.cursor.current()));

        while is_digit(self.cursor.peek()) {
            self.cursor.next();
        }

        self.make_token(TokenKind::Number)
    }

    /// Make a string literal token.
    ///
    /// Strings may not span lines. The literal ends at the closing quote,
    /// or at the end of the line or source when the quote is missing.
    /// The token's span and lexeme exclude the quotes.
    fn consume_string(&mut self) -> Token {
        debug_assert_eq!(self.cursor.current(), '"');

        // Opening quote is not part of the contents.
        self.cursor.next();
        let start = self.cursor.offset();

        while !self.cursor.at_end() && !matches!(self.cursor.current(), '"' | '\n' | '\r') {
            self.cursor.next();
        }

        let span = Span::new(start, self.cursor.offset() - start);

        // Closing quote is consumed, a newline is left for the next iteration.
        if self.cursor.current() == '"' {
            self.cursor.next();
        }

        Token {
            lexeme: SmolStr::from(span.fragment(self.original)),
            span,
            kind: TokenKind::String,
        }
    }
}

/// Test whether the character is considered whitespace
/// that should be ignored by the parser later.
fn is_whitespace(c: char) -> bool {
    c != EOF_CHAR && c.is_whitespace()
}

fn is_newline(c: char) -> bool {
    matches!(c, '\r' | '\n')
}

#[allow(clippy::manual_is_ascii_check)] // consistency with other functions
fn is_digit(c: char) -> bool {
    matches!(c, '0'..='9')
}

fn is_letter(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_')
}

fn is_letter_or_digit(c: char) -> bool {
    is_letter(c) || is_digit(c)
}

impl<'a> IntoIterator for Lexer<'a> {
    type Item = Token;
    type IntoIter = LexerIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        LexerIter {
            lexer: self,
            done: false,
        }
    }
}

/// Convenience iterator that wraps the lexer.
///
/// Yields every token, followed by exactly one EOF token.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct LexerIter<'a> {
    // Track end so an EOF token is emitted once.
    done: bool,
    lexer: Lexer<'a>,
}

impl<'a> Iterator for LexerIter<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let token = self.lexer.next_token();
        if token.kind == TokenKind::EOF {
            self.done = true;
        }
        Some(token)
    }
}
