//! Entrypoint for CLI
use std::{env, error::Error, fs, path::Path, time::Instant};

use jack::{lex::TokenKind, prelude::*, vm, IMPL_VERSION};
use log::{error, info};

static USAGE: &str = r#"
usage: jackc CMD FILE [--config CONF]

commands:
    compile Compile the target Jack class into a VM file next to it
    tokens  Print the tokens of the target Jack file
    trace   Print the grammar trace of the target Jack class

options:
    --config CONF   YAML file with compiler configuration

examples:
    jackc compile Main.jack
    jackc compile Main.jack --config strict.yaml
    jackc tokens Main.jack
    jackc trace Main.jack
"#;

fn read_source(filepath: &str) -> JackResult<String> {
    let file_bytes = fs::read(filepath)?;
    Ok(String::from_utf8(file_bytes)?)
}

fn load_conf(filepath: Option<&str>) -> Result<CompilerConf, Box<dyn Error>> {
    match filepath {
        Some(filepath) => {
            info!("load config: {filepath}");
            let file = fs::File::open(filepath)?;
            let conf: CompilerConf = serde_yaml::from_reader(file)?;
            Ok(conf)
        }
        None => Ok(CompilerConf::default()),
    }
}

fn run_compiler(filepath: &str, conf: &CompilerConf) -> Result<(), Box<dyn Error>> {
    info!("compiling {filepath}");

    let source_code = read_source(filepath)?;

    let start = Instant::now();
    let result = jack::compile_with(&source_code, conf);
    let end = Instant::now();

    match result {
        Ok(compiled) => {
            let out_path = Path::new(filepath).with_extension("vm");
            fs::write(&out_path, vm::to_text(&compiled.instructions)?)?;

            info!(
                "wrote {} instructions to {} in {}ms",
                compiled.instructions.len(),
                out_path.display(),
                end.duration_since(start).as_nanos() as f64 / 1000000.0
            );
        }
        Err(err) => {
            error!("compile error\n{filepath}:{err}");
            return Err(err.into());
        }
    }

    Ok(())
}

fn run_tokenizer(filepath: &str) -> Result<(), Box<dyn Error>> {
    let source_code = read_source(filepath)?;

    println!("offset | len | token                | fragment ");
    for token in jack::tokenize(&source_code) {
        match token.kind {
            TokenKind::EOF => println!(
                "{0:7}:{1: <3} {2: <16?}",
                token.span.index, token.span.size, token.kind
            ),
            _ => {
                let offset = token.span.index;
                let len = token.span.size;
                let kind = format!("{:?}", token.kind); // cannot format debug print {:?} into columns
                let fragment = token.span.fragment(&source_code);
                println!("{offset:7}:{len: <3} {kind: <20} \"{fragment}\"")
            }
        }
    }

    Ok(())
}

fn run_trace(filepath: &str, conf: &CompilerConf) -> Result<(), Box<dyn Error>> {
    let source_code = read_source(filepath)?;

    let conf = CompilerConf {
        trace: true,
        ..conf.clone()
    };

    match jack::compile_with(&source_code, &conf) {
        Ok(compiled) => {
            print!("{}", compiled.trace.unwrap_or_default());
            Ok(())
        }
        Err(err) => {
            error!("compile error\n{filepath}:{err}");
            Err(err.into())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new().env().init()?;

    match parse_args() {
        Some(Cmd::Compile { filepath, config }) => {
            let conf = load_conf(config.as_deref())?;
            run_compiler(&filepath, &conf)?
        }
        Some(Cmd::Tokens { filepath }) => run_tokenizer(&filepath)?,
        Some(Cmd::Trace { filepath, config }) => {
            let conf = load_conf(config.as_deref())?;
            run_trace(&filepath, &conf)?
        }
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    }

    Ok(())
}

fn parse_args() -> Option<Cmd> {
    let mut args = env::args().skip(1);
    let cmd = args.next()?;
    let filepath = args.next()?;

    match cmd.as_str() {
        "compile" => Some(Cmd::Compile {
            filepath,
            config: parse_config_opt(args)?,
        }),
        "tokens" => Some(Cmd::Tokens { filepath }),
        "trace" => Some(Cmd::Trace {
            filepath,
            config: parse_config_opt(args)?,
        }),
        _ => None,
    }
}

/// Parses the optional `--config CONF` pair.
///
/// Returns `None` when the arguments are malformed, so the usage text is printed.
fn parse_config_opt(mut args: impl Iterator<Item = String>) -> Option<Option<String>> {
    match args.next() {
        None => Some(None),
        Some(flag) if flag == "--config" => args.next().map(Some),
        Some(_) => None,
    }
}

fn print_usage() {
    println!("Jack Compiler v{IMPL_VERSION}");
    println!("{USAGE}");
}

enum Cmd {
    /// Compile a class to VM code
    Compile { filepath: String, config: Option<String> },
    /// Dump tokens
    Tokens { filepath: String },
    /// Dump grammar trace
    Trace { filepath: String, config: Option<String> },
}
