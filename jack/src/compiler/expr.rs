//! Expressions, terms and subroutine calls.
use smol_str::SmolStr;
use std::convert::TryFrom;

use super::Compiler;
use crate::{
    error::{JackError, JackResult},
    lex::{Keyword as K, Span, Token, TokenKind as TK, TokenKind},
    vm::{Command, Segment},
};

/// Largest integer constant the VM can push.
const MAX_INTEGER: u16 = 32767;

const BINARY_OPS: &[TokenKind] = &[
    TK::Plus,
    TK::Minus,
    TK::Star,
    TK::Slash,
    TK::Amp,
    TK::Pipe,
    TK::Lt,
    TK::Gt,
    TK::Eq,
];

const UNARY_OPS: &[TokenKind] = &[TK::Minus, TK::Tilde];

const KEYWORD_CONSTANTS: &[TokenKind] = &[
    TK::Keyword(K::True),
    TK::Keyword(K::False),
    TK::Keyword(K::Null),
    TK::Keyword(K::This),
];

const TERM_STARTS: &[TokenKind] = &[
    TK::Number,
    TK::String,
    TK::Keyword(K::True),
    TK::Keyword(K::False),
    TK::Keyword(K::Null),
    TK::Keyword(K::This),
    TK::Minus,
    TK::Tilde,
    TK::LeftParen,
    TK::Ident,
];

/// Storage location of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub segment: Segment,
    pub index: u16,
}

/// Resolved target of a subroutine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTarget {
    /// Fully qualified `Class.name`.
    pub name: SmolStr,
    /// Argument count, including the receiver when one was pushed.
    pub n_args: u16,
}

/// Shape of a compiled term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Integer(u16),
    /// String literal with its length in characters.
    String(u16),
    Keyword(K),
    Unary(Command),
    Group,
    Variable(Location),
    Element(Location),
    Call(CallTarget),
}

/// Binary operators either map to a VM command, or to an operating
/// system call.
#[derive(Debug, Clone, Copy)]
enum Operator {
    Native(Command),
    Call(&'static str),
}

#[rustfmt::skip]
fn binary_operator(kind: TokenKind) -> Option<Operator> {
    match kind {
        TK::Plus  => Some(Operator::Native(Command::Add)),
        TK::Minus => Some(Operator::Native(Command::Sub)),
        TK::Amp   => Some(Operator::Native(Command::And)),
        TK::Pipe  => Some(Operator::Native(Command::Or)),
        TK::Lt    => Some(Operator::Native(Command::Lt)),
        TK::Gt    => Some(Operator::Native(Command::Gt)),
        TK::Eq    => Some(Operator::Native(Command::Eq)),
        TK::Star  => Some(Operator::Call("Math.multiply")),
        TK::Slash => Some(Operator::Call("Math.divide")),
        _         => None,
    }
}

impl<'a> Compiler<'a> {
    /// `expression → term (op term)*`
    ///
    /// Operators are applied strictly left to right; there is
    /// no precedence. Returns the leading term.
    pub(crate) fn compile_expression(&mut self) -> JackResult<Term> {
        self.enter("expression");

        let first = self.compile_term()?;

        while self.check_any(BINARY_OPS) {
            let token = self.expect_any(BINARY_OPS)?;
            self.compile_term()?;

            match binary_operator(token.kind) {
                Some(Operator::Native(command)) => self.writer.write_arithmetic(command),
                Some(Operator::Call(name)) => self.writer.write_call(name, 2),
                None => return Err(self.unexpected(BINARY_OPS)),
            }
        }

        self.exit("expression");
        Ok(first)
    }

    /// ```text
    /// term → INT | STRING | keywordConstant
    ///      | IDENT | IDENT '[' expression ']' | subroutineCall
    ///      | '(' expression ')' | unaryOp term
    /// ```
    pub(crate) fn compile_term(&mut self) -> JackResult<Term> {
        self.enter("term");

        let term = match self.stream.peek_kind() {
            Some(TK::Number) => {
                let token = self.expect(TK::Number)?;
                let value = self.integer(&token)?;
                self.writer.write_push(Segment::Constant, value);
                Term::Integer(value)
            }
            Some(TK::String) => {
                let token = self.expect(TK::String)?;
                self.compile_string(&token)?
            }
            Some(TK::Keyword(K::True | K::False | K::Null | K::This)) => {
                let token = self.expect_any(KEYWORD_CONSTANTS)?;
                self.compile_keyword_constant(token.kind)
            }
            Some(TK::Minus | TK::Tilde) => {
                let token = self.expect_any(UNARY_OPS)?;
                self.compile_term()?;
                let command = if token.kind == TK::Minus { Command::Neg } else { Command::Not };
                self.writer.write_arithmetic(command);
                Term::Unary(command)
            }
            Some(TK::LeftParen) => {
                self.expect(TK::LeftParen)?;
                self.compile_expression()?;
                self.expect(TK::RightParen)?;
                Term::Group
            }
            Some(TK::Ident) => {
                let ident = self.expect(TK::Ident)?;
                self.compile_identifier_term(&ident)?
            }
            _ => return Err(self.unexpected(TERM_STARTS)),
        };

        self.exit("term");
        Ok(term)
    }

    /// Variable, array element or subroutine call. The leading
    /// identifier has already been consumed.
    fn compile_identifier_term(&mut self, ident: &Token) -> JackResult<Term> {
        if self.check_any(&[TK::LeftParen, TK::Dot]) {
            return self.compile_subroutine_call(ident).map(Term::Call);
        }

        let location = self.storage(ident)?;

        if self.check(TK::LeftBracket) {
            self.expect(TK::LeftBracket)?;
            self.compile_expression()?;
            self.expect(TK::RightBracket)?;

            self.writer.write_push(location.segment, location.index);
            self.writer.write_arithmetic(Command::Add);
            self.writer.write_pop(Segment::Pointer, 1);
            self.writer.write_push(Segment::That, 0);
            Ok(Term::Element(location))
        } else {
            self.writer.write_push(location.segment, location.index);
            Ok(Term::Variable(location))
        }
    }

    /// Allocate a string object and append the characters one at a time.
    ///
    /// The whole literal is checked before anything is emitted.
    fn compile_string(&mut self, token: &Token) -> JackResult<Term> {
        let text = token.lexeme.as_str();
        let source_code = self.stream.source_code();

        let length = text.chars().count();
        let len = u16::try_from(length)
            .ok()
            .filter(|len| *len <= MAX_INTEGER)
            .ok_or_else(|| JackError::StringTooLong {
                length,
                position: token.span.position(source_code),
            })?;

        let codes = text
            .char_indices()
            .map(|(offset, c)| {
                u16::try_from(u32::from(c))
                    .ok()
                    .filter(|code| *code <= MAX_INTEGER)
                    .ok_or_else(|| JackError::CharOutOfRange {
                        character: c,
                        position: Span::new(token.span.index + offset as u32, c.len_utf8() as u32)
                            .position(source_code),
                    })
            })
            .collect::<JackResult<Vec<u16>>>()?;

        self.writer.write_push(Segment::Constant, len);
        self.writer.write_call("String.new", 1);

        for code in codes {
            self.writer.write_push(Segment::Constant, code);
            self.writer.write_call("String.appendChar", 2);
        }

        Ok(Term::String(len))
    }

    fn compile_keyword_constant(&mut self, kind: TokenKind) -> Term {
        match kind {
            TK::Keyword(K::True) => {
                // All bits set.
                self.writer.write_push(Segment::Constant, 0);
                self.writer.write_arithmetic(Command::Not);
                Term::Keyword(K::True)
            }
            TK::Keyword(K::This) => {
                self.writer.write_push(Segment::Pointer, 0);
                Term::Keyword(K::This)
            }
            TK::Keyword(K::Null) => {
                self.writer.write_push(Segment::Constant, 0);
                Term::Keyword(K::Null)
            }
            _ => {
                self.writer.write_push(Segment::Constant, 0);
                Term::Keyword(K::False)
            }
        }
    }

    /// `subroutineCall → IDENT '(' expressionList ')' | IDENT '.' IDENT '(' expressionList ')'`
    ///
    /// The leading identifier has already been consumed.
    ///
    /// - `f(..)` calls a method of the current object, which is pushed
    ///   as the hidden first argument.
    /// - `v.f(..)` where `v` is a variable calls a method of `v`'s class,
    ///   with `v` as the hidden first argument.
    /// - `C.f(..)` where `C` is not a variable calls function or
    ///   constructor `C.f` without a receiver.
    pub(crate) fn compile_subroutine_call(&mut self, ident: &Token) -> JackResult<CallTarget> {
        let (name, receivers) = if self.check(TK::Dot) {
            self.expect(TK::Dot)?;
            let method = self.expect(TK::Ident)?;

            match self.symbols.resolve(&ident.lexeme).cloned() {
                Some(symbol) => {
                    self.writer.write_push(symbol.segment(), symbol.index);
                    (format!("{}.{}", symbol.ty, method.lexeme), 1)
                }
                None => {
                    self.check_callee(ident)?;
                    (format!("{}.{}", ident.lexeme, method.lexeme), 0)
                }
            }
        } else {
            self.writer.write_push(Segment::Pointer, 0);
            (format!("{}.{}", self.class_name, ident.lexeme), 1)
        };

        self.expect(TK::LeftParen)?;
        let n_exprs = self.compile_expression_list()?;
        self.expect(TK::RightParen)?;

        let target = CallTarget {
            name: name.into(),
            n_args: n_exprs + receivers,
        };
        self.writer.write_call(target.name.clone(), target.n_args);
        Ok(target)
    }

    /// `expressionList → (expression (',' expression)*)?`
    ///
    /// Returns the number of expressions.
    pub(crate) fn compile_expression_list(&mut self) -> JackResult<u16> {
        self.enter("expressionList");

        let mut count = 0;
        if !self.check(TK::RightParen) {
            self.compile_expression()?;
            count += 1;

            while self.accept(TK::Comma) {
                self.compile_expression()?;
                count += 1;
            }
        }

        self.exit("expressionList");
        Ok(count)
    }

    /// Resolve an identifier used as storage.
    pub(super) fn storage(&self, ident: &Token) -> JackResult<Location> {
        match self.symbols.resolve(&ident.lexeme) {
            Some(symbol) => Ok(Location {
                segment: symbol.segment(),
                index: symbol.index,
            }),
            None => Err(JackError::UnresolvedSymbol {
                name: ident.lexeme.clone(),
                position: ident.span.position(self.stream.source_code()),
            }),
        }
    }

    /// In strict mode a call qualifier that is not a variable must be
    /// the current class or a known class.
    pub(super) fn check_callee(&self, ident: &Token) -> JackResult<()> {
        let name = ident.lexeme.as_str();
        if !self.conf.strict || name == self.class_name.as_str() || self.conf.is_known_class(name) {
            return Ok(());
        }

        Err(JackError::UnknownCallee {
            name: ident.lexeme.clone(),
            position: ident.span.position(self.stream.source_code()),
        })
    }

    pub(super) fn integer(&self, token: &Token) -> JackResult<u16> {
        token
            .lexeme
            .parse::<u16>()
            .ok()
            .filter(|value| *value <= MAX_INTEGER)
            .ok_or_else(|| JackError::IntegerOutOfRange {
                lexeme: token.lexeme.clone(),
                position: token.span.position(self.stream.source_code()),
            })
    }
}
