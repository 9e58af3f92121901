use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use quadasm::codegen::fmt::{self, FmtMode};
use quadasm::diagnostic::{ansi::AnsiRenderer, json, registry, Diagnostic};
use quadasm::parser::{parse_source, ParsedProgram};
use quadasm::{verify, vm};

#[derive(Parser, Debug)]
#[command(name = "quadasm", version, about = "Assemble and run four-register programs")]
struct Args {
    /// Print errors as one JSON object per line
    #[arg(long, global = true)]
    json_errors: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a program and print the final registers as `ax bx cx dx`
    Run {
        /// Assembly source, a `.json` program, or `-` for stdin
        file: PathBuf,
        /// Abort after this many executed instructions
        #[arg(long)]
        max_steps: Option<u64>,
        /// Print the registers as a JSON object
        #[arg(long)]
        json: bool,
    },
    /// Parse a program and check that every jumped-to label exists
    Check { file: PathBuf },
    /// Print a program in canonical form
    Fmt {
        file: PathBuf,
        /// Put labels on the same line as the instruction they mark
        #[arg(long)]
        dense: bool,
    },
    /// Print the parsed program as JSON
    Emit { file: PathBuf },
    /// Explain an error code, e.g. `quadasm explain QA-R001`
    Explain {
        code: Option<String>,
        /// List every known code
        #[arg(long)]
        list: bool,
    },
}

/// Where diagnostics go and how they look.
struct Reporter {
    json: bool,
    color: bool,
}

impl Reporter {
    fn report(&self, d: &Diagnostic, origin: &str) {
        if self.json {
            eprintln!("{}", json::render(d));
        } else {
            eprint!("{}", AnsiRenderer::new(self.color).with_origin(origin).render(d));
        }
    }
}

/// A loaded program plus, for assembly input, the text it came from.
struct Loaded {
    origin: String,
    source: Option<String>,
    parsed: ParsedProgram,
}

impl Loaded {
    /// Attaches the source text and, if known, the span of instruction `index`.
    fn locate(&self, mut d: Diagnostic, index: Option<usize>, label: &str) -> Diagnostic {
        if let Some(source) = &self.source {
            if let Some(span) = index.and_then(|i| self.parsed.span_of(i)) {
                d = d.with_span(span, label);
            }
            d = d.with_source(source.clone());
        }
        d
    }
}

fn read_input(file: &PathBuf) -> Result<(String, String), Diagnostic> {
    if file.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| Diagnostic::error(format!("cannot read stdin: {e}")).with_code("QA-E001"))?;
        return Ok(("<stdin>".to_string(), text));
    }
    let origin = file.display().to_string();
    let text = std::fs::read_to_string(file).map_err(|e| {
        Diagnostic::error(format!("cannot read {origin}: {e}")).with_code("QA-E001")
    })?;
    Ok((origin, text))
}

fn load(file: &PathBuf) -> Result<Loaded, (String, Diagnostic)> {
    let (origin, text) = read_input(file).map_err(|d| (file.display().to_string(), d))?;

    if file.extension().is_some_and(|ext| ext == "json") {
        let program = serde_json::from_str(&text).map_err(|e| {
            let d = Diagnostic::error(format!("invalid program JSON: {e}")).with_code("QA-E001");
            (origin.clone(), d)
        })?;
        tracing::debug!(%origin, "loaded JSON program");
        return Ok(Loaded { origin, source: None, parsed: ParsedProgram { program, spans: Vec::new() } });
    }

    match parse_source(&text) {
        Ok(parsed) => Ok(Loaded { origin, source: Some(text), parsed }),
        Err(e) => {
            let d = Diagnostic::from(&e).with_source(text);
            Err((origin, d))
        }
    }
}

fn explain(code: Option<String>, list: bool) -> Result<(), Diagnostic> {
    if list || code.is_none() {
        for entry in registry::REGISTRY {
            println!("{:<8} {}", entry.code, entry.short);
        }
        return Ok(());
    }
    let code = code.unwrap_or_default();
    match registry::lookup(&code) {
        Some(entry) => {
            print!("{}", entry.long);
            Ok(())
        }
        None => Err(Diagnostic::error(format!("unknown error code '{code}'"))
            .with_suggestion("run `quadasm explain --list` to see every code")),
    }
}

fn execute(command: Command, reporter: &Reporter) -> bool {
    let file = match &command {
        Command::Explain { code, list } => {
            return match explain(code.clone(), *list) {
                Ok(()) => true,
                Err(d) => {
                    reporter.report(&d, "explain");
                    false
                }
            };
        }
        Command::Run { file, .. }
        | Command::Check { file }
        | Command::Fmt { file, .. }
        | Command::Emit { file } => file,
    };

    let loaded = match load(file) {
        Ok(loaded) => loaded,
        Err((origin, d)) => {
            reporter.report(&d, &origin);
            return false;
        }
    };
    let program = &loaded.parsed.program;

    match command {
        Command::Run { max_steps, json, .. } => {
            let mut machine = vm::Machine::new();
            if let Some(limit) = max_steps {
                machine = machine.with_step_limit(limit);
            }
            match machine.execute(program) {
                Ok(regs) if json => match serde_json::to_string(&regs) {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        reporter.report(&Diagnostic::error(e.to_string()), &loaded.origin);
                        return false;
                    }
                },
                Ok(regs) => println!("{regs}"),
                Err(e) => {
                    let at = match &e {
                        vm::VmError::UnknownLabel { at, .. } => Some(*at),
                        _ => None,
                    };
                    let d = loaded.locate(Diagnostic::from(&e), at, "jump taken here");
                    reporter.report(&d, &loaded.origin);
                    return false;
                }
            }
        }
        Command::Check { .. } => match verify::verify(program) {
            Ok(()) => println!(
                "ok: {} instructions, {} labels",
                program.len(),
                program.labels.len()
            ),
            Err(errors) => {
                for e in &errors {
                    let d = loaded.locate(Diagnostic::from(e), Some(e.index), "undefined label");
                    reporter.report(&d, &loaded.origin);
                }
                return false;
            }
        },
        Command::Fmt { dense, .. } => {
            let mode = if dense { FmtMode::Dense } else { FmtMode::Expanded };
            match fmt::format(program, mode) {
                Ok(text) => print!("{text}"),
                Err(e) => {
                    reporter.report(&Diagnostic::from(&e), &loaded.origin);
                    return false;
                }
            }
        }
        Command::Emit { .. } => match serde_json::to_string_pretty(program) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                reporter.report(&Diagnostic::error(e.to_string()), &loaded.origin);
                return false;
            }
        },
        Command::Explain { .. } => unreachable!("handled above"),
    }
    true
}

fn main() -> ExitCode {
    let args = Args::parse();

    use tracing_subscriber::EnvFilter;

    // QUADASM_LOG takes precedence over RUST_LOG; default to warnings only
    let filter = EnvFilter::try_from_env("QUADASM_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let reporter = Reporter {
        json: args.json_errors,
        color: std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    };

    if execute(args.command, &reporter) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
