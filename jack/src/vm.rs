//! Stack machine instructions.
//!
//! The compiler's output is an ordered sequence of [`Instr`], which
//! serializes to the textual VM language, one instruction per line.
use log::trace;
use smol_str::SmolStr;
use std::fmt::{self, Write};

/// Named storage region of the stack machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl fmt::Display for Segment {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local    => "local",
            Segment::Static   => "static",
            Segment::This     => "this",
            Segment::That     => "that",
            Segment::Pointer  => "pointer",
            Segment::Temp     => "temp",
        };
        f.write_str(name)
    }
}

/// Arithmetic and logical commands that operate on the top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl fmt::Display for Command {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Command::Add => "add",
            Command::Sub => "sub",
            Command::Neg => "neg",
            Command::Eq  => "eq",
            Command::Gt  => "gt",
            Command::Lt  => "lt",
            Command::And => "and",
            Command::Or  => "or",
            Command::Not => "not",
        };
        f.write_str(name)
    }
}

/// VM instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `push segment index`
    Push(Segment, u16),
    /// `pop segment index`
    Pop(Segment, u16),
    Arithmetic(Command),
    /// `label name`
    Label(SmolStr),
    /// `goto name`
    Goto(SmolStr),
    /// `if-goto name`
    ///
    /// Pops the top of the stack and jumps when it's not zero.
    IfGoto(SmolStr),
    /// `call name n_args`
    Call(SmolStr, u16),
    /// `function name n_locals`
    Function(SmolStr, u16),
    Return,
}

/// Outputs instruction as VM text.
impl fmt::Display for Instr {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instr::Push(segment, index)  => write!(f, "push {} {}", segment, index),
            Instr::Pop(segment, index)   => write!(f, "pop {} {}", segment, index),
            Instr::Arithmetic(command)   => write!(f, "{}", command),
            Instr::Label(name)           => write!(f, "label {}", name),
            Instr::Goto(name)            => write!(f, "goto {}", name),
            Instr::IfGoto(name)          => write!(f, "if-goto {}", name),
            Instr::Call(name, n_args)    => write!(f, "call {} {}", name, n_args),
            Instr::Function(name, n_loc) => write!(f, "function {} {}", name, n_loc),
            Instr::Return                => write!(f, "return"),
        }
    }
}

/// Render instructions as a VM file, one per line, with a trailing newline.
pub fn to_text(instrs: &[Instr]) -> Result<String, fmt::Error> {
    let mut buf = String::new();
    for instr in instrs {
        writeln!(buf, "{}", instr)?;
    }
    Ok(buf)
}

/// Append-only instruction sequence.
///
/// Instructions are never modified once written.
#[derive(Debug, Default)]
pub struct VmWriter {
    code: Vec<Instr>,
}

impl VmWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instructions written so far.
    pub fn instrs(&self) -> &[Instr] {
        &self.code
    }

    pub fn into_instrs(self) -> Vec<Instr> {
        self.code
    }

    fn emit(&mut self, instr: Instr) {
        trace!("emit: {}", instr);
        self.code.push(instr)
    }

    pub fn write_push(&mut self, segment: Segment, index: u16) {
        self.emit(Instr::Push(segment, index))
    }

    pub fn write_pop(&mut self, segment: Segment, index: u16) {
        self.emit(Instr::Pop(segment, index))
    }

    pub fn write_arithmetic(&mut self, command: Command) {
        self.emit(Instr::Arithmetic(command))
    }

    pub fn write_label(&mut self, name: impl Into<SmolStr>) {
        self.emit(Instr::Label(name.into()))
    }

    pub fn write_goto(&mut self, name: impl Into<SmolStr>) {
        self.emit(Instr::Goto(name.into()))
    }

    pub fn write_if(&mut self, name: impl Into<SmolStr>) {
        self.emit(Instr::IfGoto(name.into()))
    }

    pub fn write_call(&mut self, name: impl Into<SmolStr>, n_args: u16) {
        self.emit(Instr::Call(name.into(), n_args))
    }

    pub fn write_function(&mut self, name: impl Into<SmolStr>, n_locals: u16) {
        self.emit(Instr::Function(name.into(), n_locals))
    }

    pub fn write_return(&mut self) {
        self.emit(Instr::Return)
    }
}
