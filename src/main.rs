use std::{
    env, fs,
    io::{self, BufRead, Write},
    path::Path,
    process::ExitCode,
};

use log::{LevelFilter, debug};

use loxim::bytecode::{Chunk, compile::compile, disasm::print_chunk};
use loxim::frontend::{lexer::Lexer, token_dumper::TokenDumper};
use loxim::logging;
use loxim::runtime::vm::{Vm, VmConfig};

/// sysexits: EX_USAGE, EX_DATAERR, EX_SOFTWARE, EX_IOERR.
const EXIT_USAGE: u8 = 64;
const EXIT_DATA: u8 = 65;
const EXIT_SOFTWARE: u8 = 70;
const EXIT_IO: u8 = 74;

/// Serialized chunks use this extension.
const CHUNK_EXTENSION: &str = "loxc";

#[derive(Debug, Default)]
struct Options {
    tokens_only: bool,
    no_color: bool,
    pretty: bool,
    bytecode: bool,
    trace: bool,
    verbose: bool,
    help: bool,
    emit_bc: Option<String>,
    path: Option<String>,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    let Some(opts) = parse_args(&args) else {
        print_usage();
        return ExitCode::from(EXIT_USAGE);
    };

    if opts.help {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let level = if opts.trace {
        LevelFilter::Trace
    } else if opts.verbose {
        LevelFilter::Debug
    } else {
        logging::level_from_env()
    };
    logging::init(level);

    match &opts.path {
        Some(path) => run_file(path, &opts),
        None => repl(&opts),
    }
}

/// `None` means the arguments are unusable.
fn parse_args(args: &[String]) -> Option<Options> {
    let mut opts = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--tokens" => opts.tokens_only = true,
            "--no-color" => opts.no_color = true,
            "--pretty" => opts.pretty = true,
            "--bc" | "--bytecode" => opts.bytecode = true,
            "--trace" => opts.trace = true,
            "--verbose" | "-v" => opts.verbose = true,
            "--help" | "-h" => opts.help = true,
            "--emit-bc" => opts.emit_bc = Some(iter.next()?.clone()),
            flag if flag.starts_with('-') => return None,
            path => {
                if opts.path.is_some() {
                    return None;
                }
                opts.path = Some(path.to_string());
            }
        }
    }

    // --emit-bc compiles a script file
    if opts.emit_bc.is_some() && opts.path.is_none() {
        return None;
    }

    Some(opts)
}

fn print_usage() {
    eprintln!("loxim - Lox expression compiler and bytecode VM");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  loxim                          Start the REPL");
    eprintln!("  loxim <file>                   Run a script");
    eprintln!("  loxim <file.loxc>              Run a serialized chunk");
    eprintln!("  loxim --tokens <file>          Show tokens only");
    eprintln!("  loxim --bc <file>              Print bytecode before running");
    eprintln!("  loxim --emit-bc <out> <file>   Compile to a serialized chunk");
    eprintln!("  loxim --trace | --verbose      Log execution / compilation");
    eprintln!("  loxim --help, -h               Show this help");
    eprintln!();
    eprintln!("Token display: --no-color, --pretty");
}

fn vm_config(opts: &Options) -> VmConfig {
    VmConfig::default().print_code(opts.bytecode)
}

fn dump_tokens(source: &str, opts: &Options) {
    let tokens = Lexer::new(source).tokenize();

    let mut dumper = TokenDumper::new();
    if opts.no_color {
        dumper = dumper.no_color();
    }
    if opts.pretty {
        dumper = dumper.pretty();
    }

    dumper.dump(&tokens);
}

fn repl(opts: &Options) -> ExitCode {
    let mut vm = Vm::with_config(vm_config(opts));
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();

    loop {
        print!("> ");
        // A closed stdout ends the session the same way EOF does.
        if io::stdout().flush().is_err() {
            return ExitCode::SUCCESS;
        }

        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => {
                println!();
                return ExitCode::SUCCESS;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Failed to read input: {}", e);
                return ExitCode::from(EXIT_IO);
            }
        }

        if opts.tokens_only {
            dump_tokens(&line, opts);
            continue;
        }

        if let Err(e) = vm.interpret(&line) {
            eprintln!("{}", e);
        }
    }
}

fn run_file(path: &str, opts: &Options) -> ExitCode {
    if Path::new(path).extension().and_then(|e| e.to_str()) == Some(CHUNK_EXTENSION) {
        return run_chunk_file(path, opts);
    }

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Could not read file '{}': {}", path, e);
            return ExitCode::from(EXIT_IO);
        }
    };

    if opts.tokens_only {
        dump_tokens(&source, opts);
        return ExitCode::SUCCESS;
    }

    if let Some(out) = &opts.emit_bc {
        return emit_chunk(&source, out);
    }

    let mut vm = Vm::with_config(vm_config(opts));
    match vm.interpret(&source) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn emit_chunk(source: &str, out: &str) -> ExitCode {
    let mut chunk = Chunk::new();
    if let Err(errors) = compile(source, &mut chunk) {
        for e in &errors {
            eprintln!("{}\n", e);
        }
        return ExitCode::from(EXIT_DATA);
    }

    let bytes = match chunk.to_bytes() {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_SOFTWARE);
        }
    };

    match fs::write(out, &bytes) {
        Ok(()) => {
            debug!("wrote {} bytes to {}", bytes.len(), out);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Could not write file '{}': {}", out, e);
            ExitCode::from(EXIT_IO)
        }
    }
}

fn run_chunk_file(path: &str, opts: &Options) -> ExitCode {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Could not read file '{}': {}", path, e);
            return ExitCode::from(EXIT_IO);
        }
    };

    let chunk = match Chunk::from_bytes(&bytes) {
        Ok(chunk) => chunk,
        Err(e) => {
            eprintln!("{}: {}", path, e);
            return ExitCode::from(EXIT_DATA);
        }
    };

    if opts.bytecode {
        print_chunk(&chunk, path);
    }

    let mut vm = Vm::with_config(vm_config(opts));
    match vm.run(&chunk, None) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(EXIT_SOFTWARE)
        }
    }
}
