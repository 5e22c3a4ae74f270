//! Character scanner.
use itertools::{multipeek, MultiPeek};
use std::str::CharIndices;

/// Stand-in character returned when the cursor has moved past the source.
pub const EOF_CHAR: char = '\0';

/// Wrapper for source code that keeps a cursor position.
///
/// Allows forward lookup via peeking.
pub struct Cursor<'a> {
    /// Iterator over UTF-8 encoded source code.
    ///
    /// Peeking advances the internal peek cursor of `MultiPeek`,
    /// so every lookahead resets it first.
    chars: MultiPeek<CharIndices<'a>>,
    /// Byte position and value of the current character.
    current: (u32, char),
    /// Number of bytes in source.
    len: u32,
}

impl<'a> Cursor<'a> {
    /// Create a cursor positioned before the first character.
    ///
    /// Call [`Cursor::next`] once to make the first character current.
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: multipeek(text.char_indices()),
            current: (0, EOF_CHAR),
            len: text.len() as u32,
        }
    }

    /// Advance the cursor and return the new current character.
    ///
    /// Past the end of the source the cursor stays on [`EOF_CHAR`]
    /// with an offset equal to the source length.
    pub fn next(&mut self) -> char {
        self.current = match self.chars.next() {
            Some((index, c)) => (index as u32, c),
            None => (self.len, EOF_CHAR),
        };
        self.current.1
    }

    #[inline]
    pub fn current(&self) -> char {
        self.current.1
    }

    /// Byte offset of the current character.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.current.0
    }

    /// Character after the current one.
    pub fn peek(&mut self) -> char {
        self.chars.reset_peek();
        self.chars.peek().map(|(_, c)| *c).unwrap_or(EOF_CHAR)
    }

    /// Byte offset of the character after the current one.
    pub fn peek_offset(&mut self) -> u32 {
        self.chars.reset_peek();
        let len = self.len;
        self.chars.peek().map(|(index, _)| *index as u32).unwrap_or(len)
    }

    /// Indicates whether the current character is past the end of the source.
    ///
    /// Source text may contain `'\0'` so [`EOF_CHAR`] alone is not proof.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.current.0 >= self.len
    }
}
