use jack::{
    conf::CompilerConf,
    lex::TokenKind,
    vm::{Instr, Segment},
    JackError,
};

fn assert_vm(source: &str, expected: &str) {
    match jack::compile_to_vm(source) {
        Ok(vm) => {
            for (n, (actual, expected)) in vm.lines().zip(expected.lines()).enumerate() {
                assert_eq!(actual, expected, "instruction {} differs", n);
            }
            assert_eq!(vm.lines().count(), expected.lines().count());
        }
        Err(err) => {
            panic!("{}", err)
        }
    }
}

#[test]
fn test_compile_seven() {
    assert_vm(include_str!("programs/Seven.jack"), include_str!("programs/Seven.vm"));
}

#[test]
fn test_compile_arrays() {
    assert_vm(include_str!("programs/Sum.jack"), include_str!("programs/Sum.vm"));
}

#[test]
fn test_compile_objects() {
    assert_vm(include_str!("programs/Point.jack"), include_str!("programs/Point.vm"));
}

#[test]
fn test_trace() {
    let conf = CompilerConf {
        trace: true,
        ..CompilerConf::default()
    };
    let compiled = jack::compile_with(include_str!("programs/Empty.jack"), &conf).unwrap();
    assert_eq!(compiled.trace.as_deref(), Some(include_str!("programs/Empty.xml")));
    assert_eq!(
        compiled.instructions,
        vec![
            Instr::Function("Empty.f".into(), 0),
            Instr::Push(Segment::Constant, 0),
            Instr::Return,
        ]
    );
}

#[test]
fn test_trace_disabled_by_default() {
    let compiled = jack::compile_with(include_str!("programs/Empty.jack"), &CompilerConf::default()).unwrap();
    assert!(compiled.trace.is_none());
}

#[test]
fn test_object_setup() {
    let conf = CompilerConf {
        object_setup: true,
        ..CompilerConf::default()
    };
    let compiled = jack::compile_with(include_str!("programs/Point.jack"), &conf).unwrap();
    let vm = jack::vm::to_text(&compiled.instructions).unwrap();
    let mut lines = vm.lines();

    assert_eq!(lines.next(), Some("function Point.new 0"));
    assert_eq!(lines.next(), Some("push constant 2"));
    assert_eq!(lines.next(), Some("call Memory.alloc 1"));
    assert_eq!(lines.next(), Some("pop pointer 0"));

    let get_x: Vec<&str> = vm.lines().skip_while(|line| *line != "function Point.getX 0").take(3).collect();
    assert_eq!(get_x, ["function Point.getX 0", "push argument 0", "pop pointer 0"]);
}

#[test]
fn test_strict_rejects_unknown_class() {
    let source = "class Main { function void main() { do Screen.clear(); do Sceen.draw(); return; } }";
    assert!(jack::compile(source).is_ok());

    match jack::compile_with(source, &CompilerConf::strict()) {
        Err(err @ JackError::UnknownCallee { .. }) => {
            assert_eq!(err.to_string(), "1:59: 'Sceen' is neither a variable nor a known class");
        }
        other => panic!("expected unknown callee, got {:?}", other),
    }

    let conf = CompilerConf {
        known_classes: vec!["Sceen".into(), "Screen".into()],
        ..CompilerConf::strict()
    };
    assert!(jack::compile_with(source, &conf).is_ok());
}

#[test]
fn test_unresolved_variable_message() {
    let source = "class Main {\n  function void main() {\n    let count = 1;\n    return;\n  }\n}\n";
    let err = jack::compile(source).unwrap_err();
    assert_eq!(err.to_string(), "3:9: undefined variable 'count'");
}

#[test]
fn test_syntax_error_message() {
    let source = "class Main {\n  function void main( {\n  }\n}\n";
    let err = jack::compile(source).unwrap_err();
    assert_eq!(
        err.to_string(),
        "2:23: encountered unexpected '{', expected one of: 'int', 'char', 'boolean', identifier"
    );
}

#[test]
fn test_truncated_source() {
    let err = jack::compile("class Main { function void main() {").unwrap_err();
    match err {
        JackError::Token(err) => assert_eq!(err.encountered.kind, TokenKind::EOF),
        other => panic!("expected token error, got {:?}", other),
    }
}

#[test]
fn test_tokenize() {
    let tokens = jack::tokenize("let s = \"a b\"; // done");
    let kinds: Vec<TokenKind> = tokens.iter().map(|token| token.kind).collect();
    assert_eq!(
        kinds,
        [
            TokenKind::Keyword(jack::lex::Keyword::Let),
            TokenKind::Ident,
            TokenKind::Eq,
            TokenKind::String,
            TokenKind::Semicolon,
            TokenKind::EOF,
        ]
    );
    assert_eq!(tokens[3].lexeme, "a b");
}
