//! Tokens

use smol_str::SmolStr;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub span: Span,
    pub kind: TokenKind,
    /// Source text of the token.
    ///
    /// For string literals this excludes the surrounding quotes.
    pub lexeme: SmolStr,
}

impl Token {
    /// Render the token as a terminal element of the grammar trace.
    ///
    /// ```
    /// use jack::lex::{Span, Token, TokenKind};
    ///
    /// let token = Token { span: Span::new(0, 1), kind: TokenKind::Lt, lexeme: "<".into() };
    /// assert_eq!(token.to_xml(), "<symbol> &lt; </symbol>");
    /// ```
    pub fn to_xml(&self) -> String {
        let tag = self.kind.tag();
        format!("<{tag}> {} </{tag}>", escape_xml(self.lexeme.as_str()))
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '&' => escaped.push_str("&amp;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum TokenKind {
    // Symbols
    LeftBrace,    // {
    RightBrace,   // }
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    Dot,          // .
    Comma,        // ,
    Semicolon,    // ;
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Amp,          // &
    Pipe,         // |
    Lt,           // <
    Gt,           // >
    Eq,           // =
    Tilde,        // ~

    // ------------------------------------------------------------------------
    // Complex
    Ident,
    /// Reserved identifiers
    Keyword(Keyword),
    /// Integer literal
    Number,
    /// String literal
    String,

    // ------------------------------------------------------------------------
    // Special
    /// End-of-file
    EOF,
}

impl TokenKind {
    /// Element name used when the token is written to the grammar trace.
    pub fn tag(&self) -> &'static str {
        match self {
            TokenKind::Keyword(_) => "keyword",
            TokenKind::Ident => "identifier",
            TokenKind::Number => "integerConstant",
            TokenKind::String => "stringConstant",
            TokenKind::EOF => "eof",
            _ => "symbol",
        }
    }
}

impl fmt::Display for TokenKind {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TokenKind as TK;
        match self {
            TK::LeftBrace    => write!(f, "'{{'"),
            TK::RightBrace   => write!(f, "'}}'"),
            TK::LeftParen    => write!(f, "'('"),
            TK::RightParen   => write!(f, "')'"),
            TK::LeftBracket  => write!(f, "'['"),
            TK::RightBracket => write!(f, "']'"),
            TK::Dot          => write!(f, "'.'"),
            TK::Comma        => write!(f, "','"),
            TK::Semicolon    => write!(f, "';'"),
            TK::Plus         => write!(f, "'+'"),
            TK::Minus        => write!(f, "'-'"),
            TK::Star         => write!(f, "'*'"),
            TK::Slash        => write!(f, "'/'"),
            TK::Amp          => write!(f, "'&'"),
            TK::Pipe         => write!(f, "'|'"),
            TK::Lt           => write!(f, "'<'"),
            TK::Gt           => write!(f, "'>'"),
            TK::Eq           => write!(f, "'='"),
            TK::Tilde        => write!(f, "'~'"),
            TK::Ident        => write!(f, "identifier"),
            TK::Keyword(kw)  => write!(f, "'{kw}'"),
            TK::Number       => write!(f, "integer literal"),
            TK::String       => write!(f, "string literal"),
            TK::EOF          => write!(f, "end-of-file"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Span {
    pub index: u32,
    pub size: u32,
}

impl Span {
    pub fn new(index: u32, size: u32) -> Self {
        Self { index, size }
    }

    #[inline]
    pub fn fragment<'a>(&self, text: &'a str) -> &'a str {
        &text[self.index as usize..self.end() as usize]
    }

    /// Ending index of the span, exclusive.
    #[inline]
    pub fn end(&self) -> u32 {
        self.index + self.size
    }

    /// One-based line and column where the span starts.
    ///
    /// Columns count characters, not bytes.
    pub fn position(&self, text: &str) -> Position {
        let mut line = 1;
        let mut column = 1;

        for (i, c) in text.char_indices() {
            if i >= self.index as usize {
                break;
            }
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        Position { line, column }
    }
}

/// Human readable source location.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Reserved keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum Keyword {
    // ------------------------------------------------------------------------
    // Declarations
    Class,        // class
    Constructor,  // constructor
    Function,     // function
    Method,       // method
    Field,        // field
    Static,       // static
    Var,          // var

    // ------------------------------------------------------------------------
    // Types
    Int,          // int
    Char,         // char
    Boolean,      // boolean
    Void,         // void

    // ------------------------------------------------------------------------
    // Constants
    True,         // true
    False,        // false
    Null,         // null
    This,         // this

    // ------------------------------------------------------------------------
    // Statements
    Let,          // let
    Do,           // do
    If,           // if
    Else,         // else
    While,        // while
    Return,       // return
}

impl Keyword {
    #[rustfmt::skip]
    pub fn parse(text: impl AsRef<str>) -> Option<Self> {
        match text.as_ref() {
            "class"       => Some(Self::Class),
            "constructor" => Some(Self::Constructor),
            "function"    => Some(Self::Function),
            "method"      => Some(Self::Method),
            "field"       => Some(Self::Field),
            "static"      => Some(Self::Static),
            "var"         => Some(Self::Var),
            // ----------------------------------------------------------------
            "int"         => Some(Self::Int),
            "char"        => Some(Self::Char),
            "boolean"     => Some(Self::Boolean),
            "void"        => Some(Self::Void),
            // ----------------------------------------------------------------
            "true"        => Some(Self::True),
            "false"       => Some(Self::False),
            "null"        => Some(Self::Null),
            "this"        => Some(Self::This),
            // ----------------------------------------------------------------
            "let"         => Some(Self::Let),
            "do"          => Some(Self::Do),
            "if"          => Some(Self::If),
            "else"        => Some(Self::Else),
            "while"       => Some(Self::While),
            "return"      => Some(Self::Return),
            _ => None,
        }
    }

    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class       => "class",
            Self::Constructor => "constructor",
            Self::Function    => "function",
            Self::Method      => "method",
            Self::Field       => "field",
            Self::Static      => "static",
            Self::Var         => "var",
            Self::Int         => "int",
            Self::Char        => "char",
            Self::Boolean     => "boolean",
            Self::Void        => "void",
            Self::True        => "true",
            Self::False       => "false",
            Self::Null        => "null",
            Self::This        => "this",
            Self::Let         => "let",
            Self::Do          => "do",
            Self::If          => "if",
            Self::Else        => "else",
            Self::While       => "while",
            Self::Return      => "return",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
