//! Statements.
use super::Compiler;
use crate::{
    error::JackResult,
    lex::{Keyword as K, TokenKind as TK, TokenKind},
    vm::{Command, Segment},
};

const STATEMENTS: &[TokenKind] = &[
    TK::Keyword(K::Let),
    TK::Keyword(K::If),
    TK::Keyword(K::While),
    TK::Keyword(K::Do),
    TK::Keyword(K::Return),
];

impl<'a> Compiler<'a> {
    /// `statements → statement*`
    ///
    /// Returns the number of statements compiled.
    pub(crate) fn compile_statements(&mut self) -> JackResult<usize> {
        self.enter("statements");

        let mut count = 0;
        while self.check_any(STATEMENTS) {
            self.compile_statement()?;
            count += 1;
        }

        self.exit("statements");
        Ok(count)
    }

    pub(crate) fn compile_statement(&mut self) -> JackResult<()> {
        match self.stream.peek_kind() {
            Some(TK::Keyword(K::Let)) => self.compile_let(),
            Some(TK::Keyword(K::If)) => self.compile_if(),
            Some(TK::Keyword(K::While)) => self.compile_while(),
            Some(TK::Keyword(K::Do)) => self.compile_do(),
            Some(TK::Keyword(K::Return)) => self.compile_return(),
            _ => Err(self.unexpected(STATEMENTS)),
        }
    }

    /// `'let' IDENT ('[' expression ']')? '=' expression ';'`
    pub(crate) fn compile_let(&mut self) -> JackResult<()> {
        self.enter("letStatement");

        self.expect(TK::Keyword(K::Let))?;
        let ident = self.expect(TK::Ident)?;
        let target = self.storage(&ident)?;

        if self.check(TK::LeftBracket) {
            self.expect(TK::LeftBracket)?;
            self.compile_expression()?;
            self.writer.write_push(target.segment, target.index);
            self.writer.write_arithmetic(Command::Add);
            self.expect(TK::RightBracket)?;

            self.expect(TK::Eq)?;
            self.compile_expression()?;

            // Element address is below the value on the stack. Park the
            // value in temp while `that` is anchored to the address.
            self.writer.write_pop(Segment::Temp, 0);
            self.writer.write_pop(Segment::Pointer, 1);
            self.writer.write_push(Segment::Temp, 0);
            self.writer.write_pop(Segment::That, 0);
        } else {
            self.expect(TK::Eq)?;
            self.compile_expression()?;
            self.writer.write_pop(target.segment, target.index);
        }

        self.expect(TK::Semicolon)?;

        self.exit("letStatement");
        Ok(())
    }

    /// `'if' '(' expression ')' '{' statements '}' ('else' '{' statements '}')?`
    pub(crate) fn compile_if(&mut self) -> JackResult<()> {
        self.enter("ifStatement");

        // Number is taken before the body, so nested statements
        // get the later numbers.
        let n = self.labels.next_if();
        let label_true = self.label("IF_TRUE", n);
        let label_false = self.label("IF_FALSE", n);

        self.expect(TK::Keyword(K::If))?;
        self.expect(TK::LeftParen)?;
        self.compile_expression()?;
        self.expect(TK::RightParen)?;

        self.writer.write_if(label_true.clone());
        self.writer.write_goto(label_false.clone());
        self.writer.write_label(label_true);

        self.expect(TK::LeftBrace)?;
        self.compile_statements()?;
        self.expect(TK::RightBrace)?;

        if self.check(TK::Keyword(K::Else)) {
            let label_end = self.label("IF_END", n);
            self.writer.write_goto(label_end.clone());
            self.writer.write_label(label_false);

            self.expect(TK::Keyword(K::Else))?;
            self.expect(TK::LeftBrace)?;
            self.compile_statements()?;
            self.expect(TK::RightBrace)?;

            self.writer.write_label(label_end);
        } else {
            self.writer.write_label(label_false);
        }

        self.exit("ifStatement");
        Ok(())
    }

    /// `'while' '(' expression ')' '{' statements '}'`
    pub(crate) fn compile_while(&mut self) -> JackResult<()> {
        self.enter("whileStatement");

        let n = self.labels.next_while();
        let label_exp = self.label("WHILE_EXP", n);
        let label_end = self.label("WHILE_END", n);

        self.writer.write_label(label_exp.clone());

        self.expect(TK::Keyword(K::While))?;
        self.expect(TK::LeftParen)?;
        self.compile_expression()?;
        self.expect(TK::RightParen)?;

        self.writer.write_arithmetic(Command::Not);
        self.writer.write_if(label_end.clone());

        self.expect(TK::LeftBrace)?;
        self.compile_statements()?;
        self.expect(TK::RightBrace)?;

        self.writer.write_goto(label_exp);
        self.writer.write_label(label_end);

        self.exit("whileStatement");
        Ok(())
    }

    /// `'do' subroutineCall ';'`
    pub(crate) fn compile_do(&mut self) -> JackResult<()> {
        self.enter("doStatement");

        self.expect(TK::Keyword(K::Do))?;
        let ident = self.expect(TK::Ident)?;
        self.compile_subroutine_call(&ident)?;
        self.expect(TK::Semicolon)?;

        // Discard the return value.
        self.writer.write_pop(Segment::Temp, 0);

        self.exit("doStatement");
        Ok(())
    }

    /// `'return' expression? ';'`
    pub(crate) fn compile_return(&mut self) -> JackResult<()> {
        self.enter("returnStatement");

        self.expect(TK::Keyword(K::Return))?;
        if self.check(TK::Semicolon) {
            // Every subroutine returns a value, void ones included.
            self.writer.write_push(Segment::Constant, 0);
        } else {
            self.compile_expression()?;
        }
        self.expect(TK::Semicolon)?;
        self.writer.write_return();

        self.exit("returnStatement");
        Ok(())
    }
}
