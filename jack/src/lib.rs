//! Single pass compiler from the Jack language to stack machine VM code.
//!
//! ```
//! let source = "class Main { function void main() { return; } }";
//! let vm = jack::compile_to_vm(source).unwrap();
//! assert_eq!(vm, "function Main.main 0\npush constant 0\nreturn\n");
//! ```
pub mod compiler;
pub mod conf;
mod error;
pub mod lex;
pub mod symbols;
pub mod vm;

pub use self::error::{JackError, JackResult, TokenError};

use self::{
    compiler::{Compiled, Compiler},
    conf::CompilerConf,
    lex::{Lexer, Token},
    vm::Instr,
};

pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile a single class with the default configuration.
pub fn compile(source_code: &str) -> JackResult<Vec<Instr>> {
    compile_with(source_code, &CompilerConf::default()).map(|compiled| compiled.instructions)
}

/// Compile a single class with the given configuration.
pub fn compile_with(source_code: &str, conf: &CompilerConf) -> JackResult<Compiled> {
    let lexer = Lexer::new(source_code);
    Compiler::new(lexer, conf.clone()).compile()
}

/// Compile a single class to the textual VM language.
pub fn compile_to_vm(source_code: &str) -> JackResult<String> {
    let instrs = compile(source_code)?;
    Ok(vm::to_text(&instrs)?)
}

/// Scan the whole source, up to and including the end-of-file token.
pub fn tokenize(source_code: &str) -> Vec<Token> {
    Lexer::new(source_code).into_iter().collect()
}

pub mod prelude {
    pub use super::{
        compiler::{Compiled, Compiler},
        conf::CompilerConf,
        error::{JackError, JackResult},
        lex::{Lexer, Token, TokenKind},
        symbols::{SymbolKind, SymbolTable},
        vm::{Instr, VmWriter},
    };
}
