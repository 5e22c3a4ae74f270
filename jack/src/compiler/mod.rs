//! Syntax-directed translator.
//!
//! Recursive descent parser that emits VM instructions while it
//! recognizes each construct. There is no syntax tree; every grammar
//! rule consumes its tokens, updates the symbol table and writes its
//! instructions before returning.
mod expr;
mod stmts;
mod trace;

pub use self::{
    expr::{CallTarget, Location, Term},
    trace::Trace,
};

use log::debug;
use smol_str::SmolStr;

use crate::{
    conf::CompilerConf,
    error::{JackError, JackResult, TokenError},
    lex::{Keyword as K, Lexer, Token, TokenKind as TK, TokenKind, TokenStream},
    symbols::{SymbolKind, SymbolTable},
    vm::{Instr, Segment, VmWriter},
};

const CLASS_VAR_KINDS: &[TokenKind] = &[TK::Keyword(K::Static), TK::Keyword(K::Field)];

const SUBROUTINE_KINDS: &[TokenKind] = &[
    TK::Keyword(K::Constructor),
    TK::Keyword(K::Function),
    TK::Keyword(K::Method),
];

const VAR_TYPES: &[TokenKind] = &[
    TK::Keyword(K::Int),
    TK::Keyword(K::Char),
    TK::Keyword(K::Boolean),
    TK::Ident,
];

const RETURN_TYPES: &[TokenKind] = &[
    TK::Keyword(K::Void),
    TK::Keyword(K::Int),
    TK::Keyword(K::Char),
    TK::Keyword(K::Boolean),
    TK::Ident,
];

/// Output of compiling one class.
#[derive(Debug)]
pub struct Compiled {
    pub instructions: Vec<Instr>,
    /// Grammar trace, when enabled in the configuration.
    pub trace: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

impl SubroutineKind {
    fn from_keyword(keyword: TokenKind) -> Option<Self> {
        match keyword {
            TK::Keyword(K::Constructor) => Some(Self::Constructor),
            TK::Keyword(K::Function) => Some(Self::Function),
            TK::Keyword(K::Method) => Some(Self::Method),
            _ => None,
        }
    }
}

/// Summary of a compiled subroutine declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subroutine {
    /// Fully qualified `Class.name`.
    pub name: SmolStr,
    pub kind: SubroutineKind,
    pub n_locals: u16,
}

/// Per-subroutine counters used to make label names unique.
#[derive(Debug, Default)]
struct LabelCounter {
    if_count: usize,
    while_count: usize,
}

impl LabelCounter {
    fn next_if(&mut self) -> usize {
        let n = self.if_count;
        self.if_count += 1;
        n
    }

    fn next_while(&mut self) -> usize {
        let n = self.while_count;
        self.while_count += 1;
        n
    }
}

/// Compiles a single class.
///
/// A compiler owns all of its state and is consumed by
/// [`Compiler::compile`], so each class gets a fresh instance.
pub struct Compiler<'a> {
    stream: TokenStream<'a>,
    symbols: SymbolTable,
    writer: VmWriter,
    trace: Option<Trace>,
    conf: CompilerConf,
    class_name: SmolStr,
    /// Fully qualified name of the subroutine being compiled.
    function_name: SmolStr,
    labels: LabelCounter,
}

impl<'a> Compiler<'a> {
    pub fn new(lexer: Lexer<'a>, conf: CompilerConf) -> Self {
        Self {
            stream: TokenStream::new(lexer),
            symbols: SymbolTable::with_policy(conf.duplicate_policy()),
            writer: VmWriter::new(),
            trace: if conf.trace { Some(Trace::default()) } else { None },
            conf,
            class_name: SmolStr::default(),
            function_name: SmolStr::default(),
            labels: LabelCounter::default(),
        }
    }

    /// Translate the class in the source.
    ///
    /// The first error aborts the whole class; nothing that was emitted
    /// before it is returned.
    pub fn compile(mut self) -> JackResult<Compiled> {
        self.compile_class()?;
        Ok(self.finish())
    }

    /// Instructions emitted so far.
    pub fn instrs(&self) -> &[Instr] {
        self.writer.instrs()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn finish(self) -> Compiled {
        Compiled {
            instructions: self.writer.into_instrs(),
            trace: self.trace.map(|trace| trace.to_text()),
        }
    }
}

/// Token handling and tracing.
impl<'a> Compiler<'a> {
    fn enter(&mut self, rule: &str) {
        if let Some(trace) = self.trace.as_mut() {
            trace.open(rule);
        }
    }

    fn exit(&mut self, rule: &str) {
        if let Some(trace) = self.trace.as_mut() {
            trace.close(rule);
        }
    }

    #[inline]
    fn check(&mut self, kind: TokenKind) -> bool {
        self.stream.check(kind)
    }

    #[inline]
    fn check_any(&mut self, kinds: &[TokenKind]) -> bool {
        self.stream.check_any(kinds)
    }

    /// Consume the upcoming token, which must be of the given kind.
    fn expect(&mut self, kind: TokenKind) -> JackResult<Token> {
        self.expect_any(&[kind])
    }

    /// Consume the upcoming token, which must be one of the given kinds.
    fn expect_any(&mut self, kinds: &[TokenKind]) -> JackResult<Token> {
        let token = self.stream.consume_any(kinds)?;
        if let Some(trace) = self.trace.as_mut() {
            trace.terminal(&token);
        }
        Ok(token)
    }

    /// Consume the upcoming token only if it has the given kind.
    fn accept(&mut self, kind: TokenKind) -> bool {
        if !self.stream.match_token(kind) {
            return false;
        }
        if let (Some(trace), Some(token)) = (self.trace.as_mut(), self.stream.previous_token()) {
            trace.terminal(token);
        }
        true
    }

    /// Error for a decision point where the upcoming token matches
    /// none of the alternatives.
    #[cold]
    fn unexpected(&mut self, expected: &[TokenKind]) -> JackError {
        let source_code = self.stream.source_code();
        match self.stream.peek() {
            Some(token) => TokenError::new(expected, token.clone(), source_code).into(),
            None => JackError::EndOfSource,
        }
    }

    /// Build a label name unique within the current subroutine,
    /// or the whole program when labels are qualified.
    fn label(&self, role: &str, n: usize) -> SmolStr {
        if self.conf.qualify_labels {
            format!("{}${}{}", self.function_name, role, n).into()
        } else {
            format!("{}{}", role, n).into()
        }
    }

    fn define(&mut self, name: &Token, ty: &Token, kind: SymbolKind) -> JackResult<()> {
        self.symbols.define(name.lexeme.clone(), ty.lexeme.clone(), kind)?;
        Ok(())
    }
}

/// Declarations.
impl<'a> Compiler<'a> {
    /// `class → 'class' IDENT '{' classVarDec* subroutineDec* '}'`
    pub(crate) fn compile_class(&mut self) -> JackResult<()> {
        self.enter("class");

        self.expect(TK::Keyword(K::Class))?;
        let name = self.expect(TK::Ident)?;
        self.class_name = name.lexeme;
        debug!("compiling class {}", self.class_name);

        self.expect(TK::LeftBrace)?;

        while self.check_any(CLASS_VAR_KINDS) {
            self.compile_class_var_dec()?;
        }

        while self.check_any(SUBROUTINE_KINDS) {
            self.compile_subroutine_dec()?;
        }

        self.expect(TK::RightBrace)?;

        self.exit("class");
        Ok(())
    }

    /// `classVarDec → ('static'|'field') type IDENT (',' IDENT)* ';'`
    ///
    /// Returns the number of names declared.
    pub(crate) fn compile_class_var_dec(&mut self) -> JackResult<u16> {
        self.enter("classVarDec");

        let keyword = self.expect_any(CLASS_VAR_KINDS)?;
        let kind = if keyword.kind == TK::Keyword(K::Field) {
            SymbolKind::Field
        } else {
            SymbolKind::Static
        };

        let declared = self.compile_declared_names(kind)?;

        self.exit("classVarDec");
        Ok(declared)
    }

    /// `type IDENT (',' IDENT)* ';'`, shared by class and local variables.
    fn compile_declared_names(&mut self, kind: SymbolKind) -> JackResult<u16> {
        let ty = self.expect_any(VAR_TYPES)?;
        let name = self.expect(TK::Ident)?;
        self.define(&name, &ty, kind)?;
        let mut declared = 1;

        while self.accept(TK::Comma) {
            let name = self.expect(TK::Ident)?;
            self.define(&name, &ty, kind)?;
            declared += 1;
        }

        self.expect(TK::Semicolon)?;
        Ok(declared)
    }

    /// `subroutineDec → ('constructor'|'function'|'method') (type|'void') IDENT '(' parameterList ')' subroutineBody`
    pub(crate) fn compile_subroutine_dec(&mut self) -> JackResult<Subroutine> {
        self.enter("subroutineDec");

        self.labels = LabelCounter::default();
        self.symbols.start_subroutine();

        let keyword = self.expect_any(SUBROUTINE_KINDS)?;
        let kind = SubroutineKind::from_keyword(keyword.kind).ok_or_else(|| self.unexpected(SUBROUTINE_KINDS))?;

        // Receiver is the hidden first argument of a method.
        if kind == SubroutineKind::Method {
            let class_name = self.class_name.clone();
            self.symbols.define("this", class_name, SymbolKind::Argument)?;
        }

        self.expect_any(RETURN_TYPES)?;
        let name = self.expect(TK::Ident)?;
        self.function_name = format!("{}.{}", self.class_name, name.lexeme).into();

        self.expect(TK::LeftParen)?;
        self.compile_parameter_list()?;
        self.expect(TK::RightParen)?;

        let n_locals = self.compile_subroutine_body(kind)?;
        debug!("compiled {:?} {} with {} locals", kind, self.function_name, n_locals);

        self.exit("subroutineDec");
        Ok(Subroutine {
            name: self.function_name.clone(),
            kind,
            n_locals,
        })
    }

    /// `parameterList → ((type IDENT) (',' type IDENT)*)?`
    ///
    /// Returns the number of declared parameters.
    pub(crate) fn compile_parameter_list(&mut self) -> JackResult<u16> {
        self.enter("parameterList");

        let mut count = 0;
        if !self.check(TK::RightParen) {
            loop {
                let ty = self.expect_any(VAR_TYPES)?;
                let name = self.expect(TK::Ident)?;
                self.define(&name, &ty, SymbolKind::Argument)?;
                count += 1;

                if !self.accept(TK::Comma) {
                    break;
                }
            }
        }

        self.exit("parameterList");
        Ok(count)
    }

    /// `subroutineBody → '{' varDec* statement* '}'`
    ///
    /// The `function` instruction is written once the local variables
    /// are known. Returns the number of locals.
    fn compile_subroutine_body(&mut self, kind: SubroutineKind) -> JackResult<u16> {
        self.enter("subroutineBody");
        self.expect(TK::LeftBrace)?;

        while self.check(TK::Keyword(K::Var)) {
            self.compile_var_dec()?;
        }

        let n_locals = self.symbols.count(SymbolKind::Local);
        self.writer.write_function(self.function_name.clone(), n_locals);

        if self.conf.object_setup {
            self.compile_object_setup(kind);
        }

        self.compile_statements()?;

        self.expect(TK::RightBrace)?;
        self.exit("subroutineBody");
        Ok(n_locals)
    }

    /// Anchor `this` for constructors and methods.
    fn compile_object_setup(&mut self, kind: SubroutineKind) {
        match kind {
            SubroutineKind::Constructor => {
                let n_fields = self.symbols.count(SymbolKind::Field);
                self.writer.write_push(Segment::Constant, n_fields);
                self.writer.write_call("Memory.alloc", 1);
                self.writer.write_pop(Segment::Pointer, 0);
            }
            SubroutineKind::Method => {
                self.writer.write_push(Segment::Argument, 0);
                self.writer.write_pop(Segment::Pointer, 0);
            }
            SubroutineKind::Function => {}
        }
    }

    /// `varDec → 'var' type IDENT (',' IDENT)* ';'`
    pub(crate) fn compile_var_dec(&mut self) -> JackResult<u16> {
        self.enter("varDec");

        self.expect(TK::Keyword(K::Var))?;
        let declared = self.compile_declared_names(SymbolKind::Local)?;

        self.exit("varDec");
        Ok(declared)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vm::{Command, Instr, Segment};

    fn compiler(source: &str) -> Compiler<'_> {
        Compiler::new(Lexer::new(source), CompilerConf::default())
    }

    #[test]
    fn test_class_var_dec() {
        let mut compiler = compiler("field int x, y; static Point origin;");
        assert_eq!(compiler.compile_class_var_dec().unwrap(), 2);
        assert_eq!(compiler.compile_class_var_dec().unwrap(), 1);

        let symbols = compiler.symbols();
        assert_eq!(symbols.count(SymbolKind::Field), 2);
        assert_eq!(symbols.count(SymbolKind::Static), 1);
        let origin = symbols.resolve("origin").unwrap();
        assert_eq!((origin.kind, origin.index, origin.ty.as_str()), (SymbolKind::Static, 0, "Point"));
        assert!(compiler.instrs().is_empty());
    }

    #[test]
    fn test_class_var_dec_requires_kind() {
        let mut compiler = compiler("var int x;");
        match compiler.compile_class_var_dec() {
            Err(JackError::Token(err)) => {
                assert_eq!(err.encountered.kind, TK::Keyword(K::Var));
                assert_eq!(err.expected.as_ref(), CLASS_VAR_KINDS);
            }
            other => panic!("expected token error, got {:?}", other),
        }
    }

    #[test]
    fn test_parameter_list_trace() {
        let conf = CompilerConf {
            trace: true,
            ..CompilerConf::default()
        };
        let mut compiler = Compiler::new(Lexer::new("int a, Point b)"), conf);
        assert_eq!(compiler.compile_parameter_list().unwrap(), 2);
        assert_eq!(compiler.symbols().resolve("b").map(|s| s.index), Some(1));
        assert_eq!(
            compiler.trace.as_ref().map(Trace::to_text).as_deref(),
            Some(
                "<parameterList>\n\
                 <keyword> int </keyword>\n\
                 <identifier> a </identifier>\n\
                 <symbol> , </symbol>\n\
                 <identifier> Point </identifier>\n\
                 <identifier> b </identifier>\n\
                 </parameterList>\n"
            )
        );
    }

    #[test]
    fn test_function_header_counts_locals() {
        let mut compiler = compiler("function int sum(int a, int b) { var int s; var char c, d; return s; }");
        compiler.class_name = "Main".into();

        let subroutine = compiler.compile_subroutine_dec().unwrap();
        assert_eq!(subroutine.name, "Main.sum");
        assert_eq!(subroutine.kind, SubroutineKind::Function);
        assert_eq!(subroutine.n_locals, 3);
        assert_eq!(compiler.symbols().count(SymbolKind::Argument), 2);

        assert_eq!(
            compiler.instrs(),
            &[
                Instr::Function("Main.sum".into(), 3),
                Instr::Push(Segment::Local, 0),
                Instr::Return,
            ]
        );
    }

    #[test]
    fn test_method_defines_this_as_argument_zero() {
        let mut compiler = compiler("method int getX(int scale) { return scale; }");
        compiler.class_name = "Point".into();
        compiler.compile_subroutine_dec().unwrap();

        let this = compiler.symbols().resolve("this").unwrap();
        assert_eq!((this.kind, this.index, this.ty.as_str()), (SymbolKind::Argument, 0, "Point"));
        assert_eq!(compiler.symbols().resolve("scale").map(|s| s.index), Some(1));
        assert_eq!(compiler.instrs()[1], Instr::Push(Segment::Argument, 1));
    }

    #[test]
    fn test_label_counters_reset_per_subroutine() {
        let source = "class A {
            function void f() { if (true) { } while (false) { } return; }
            function void g() { if (true) { } return; }
        }";
        let compiled = compiler(source).compile().unwrap();
        let labels: Vec<String> = compiled
            .instructions
            .iter()
            .filter_map(|instr| match instr {
                Instr::Label(name) => Some(name.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(
            labels,
            ["IF_TRUE0", "IF_FALSE0", "WHILE_EXP0", "WHILE_END0", "IF_TRUE0", "IF_FALSE0"]
        );
    }

    #[test]
    fn test_qualified_labels() {
        let source = "class A { function void f() { while (true) { } return; } }";
        let conf = CompilerConf {
            qualify_labels: true,
            ..CompilerConf::default()
        };
        let compiled = Compiler::new(Lexer::new(source), conf).compile().unwrap();
        assert_eq!(compiled.instructions[1], Instr::Label("A.f$WHILE_EXP0".into()));
        assert_eq!(compiled.instructions[5], Instr::IfGoto("A.f$WHILE_END0".into()));
    }

    #[test]
    fn test_object_setup() {
        let source = "class P {
            field int x, y;
            constructor P new() { return this; }
            method int getX() { return x; }
        }";
        let conf = CompilerConf {
            object_setup: true,
            ..CompilerConf::default()
        };
        let compiled = Compiler::new(Lexer::new(source), conf).compile().unwrap();
        assert_eq!(
            compiled.instructions,
            vec![
                Instr::Function("P.new".into(), 0),
                Instr::Push(Segment::Constant, 2),
                Instr::Call("Memory.alloc".into(), 1),
                Instr::Pop(Segment::Pointer, 0),
                Instr::Push(Segment::Pointer, 0),
                Instr::Return,
                Instr::Function("P.getX".into(), 0),
                Instr::Push(Segment::Argument, 0),
                Instr::Pop(Segment::Pointer, 0),
                Instr::Push(Segment::This, 0),
                Instr::Return,
            ]
        );
    }

    #[test]
    fn test_reference_output_has_no_object_setup() {
        let source = "class P { field int x; constructor P new() { let x = 1; return this; } }";
        let compiled = compiler(source).compile().unwrap();
        assert_eq!(
            compiled.instructions,
            vec![
                Instr::Function("P.new".into(), 0),
                Instr::Push(Segment::Constant, 1),
                Instr::Pop(Segment::This, 0),
                Instr::Push(Segment::Pointer, 0),
                Instr::Return,
            ]
        );
    }

    #[test]
    fn test_strict_duplicate_local() {
        let source = "class A { function void f() { var int x; var int x; return; } }";
        let result = Compiler::new(Lexer::new(source), CompilerConf::strict()).compile();
        assert!(matches!(result, Err(JackError::DuplicateSymbol { .. })));

        // Permissive mode lets the last declaration win.
        let compiled = compiler(source).compile().unwrap();
        assert_eq!(compiled.instructions[0], Instr::Function("A.f".into(), 2));
    }

    #[test]
    fn test_error_aborts_class() {
        let source = "class A { function void f() { let = 1; } }";
        assert!(matches!(compiler(source).compile(), Err(JackError::Token(_))));
    }

    #[test]
    fn test_class_trace() {
        let conf = CompilerConf {
            trace: true,
            ..CompilerConf::default()
        };
        let compiled = Compiler::new(Lexer::new("class E { }"), conf).compile().unwrap();
        assert_eq!(
            compiled.trace.as_deref(),
            Some(
                "<class>\n\
                 <keyword> class </keyword>\n\
                 <identifier> E </identifier>\n\
                 <symbol> { </symbol>\n\
                 <symbol> } </symbol>\n\
                 </class>\n"
            )
        );
        assert!(compiled.instructions.is_empty());
    }

    #[test]
    fn test_while_negates_condition() {
        let compiled = compiler("class A { function void f() { while (true) { } return; } }")
            .compile()
            .unwrap();
        assert_eq!(compiled.instructions[4], Instr::Arithmetic(Command::Not));
    }
}
