//! Command-line runner and REPL for Velox scripts

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;
use velox::{
    EvalContext, ExtensionManager, FileSource, Frontend, Interpreter, LoggingExtension,
    ScriptDriver, VeloxFrontend,
};

#[derive(Parser)]
#[command(author, version, about = "Run Velox scripts", long_about = None)]
struct Cli {
    /// JSON file with interpreter settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum call depth before a stack overflow error
    #[arg(long, global = true)]
    max_call_depth: Option<usize>,

    /// Log every function call
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run script files in order
    Run {
        /// Scripts to run
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Start an interactive session
    Repl,
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("velox=info"));
    fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let context = load_context(&cli)?;

    let extensions = Arc::new(ExtensionManager::new());
    extensions.register(LoggingExtension::new())?;

    match cli.command {
        Commands::Run { files } => run_files(context, extensions, files),
        Commands::Repl => repl(context, &extensions).map(|()| ExitCode::SUCCESS),
    }
}

fn load_context(cli: &Cli) -> Result<EvalContext> {
    let mut context = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            EvalContext::from_json(&json).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EvalContext::default(),
    };
    if let Some(depth) = cli.max_call_depth {
        context.max_call_depth = depth;
    }
    if cli.trace {
        context.trace = true;
    }
    Ok(context)
}

fn run_files(context: EvalContext, extensions: Arc<ExtensionManager>, files: Vec<PathBuf>) -> Result<ExitCode> {
    let interpreter = Interpreter::with_context(context);
    let mut driver = ScriptDriver::new(interpreter, VeloxFrontend::new()).with_extensions(extensions);
    for file in files {
        driver.execute_script(FileSource::new(file));
    }

    let mut failed = 0;
    for report in driver.run_until_idle() {
        match report.outcome {
            Ok(value) => println!("{}: {}", report.name, value),
            Err(e) => {
                failed += 1;
                eprintln!("{}: {}", report.name, e);
            }
        }
    }
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn repl(context: EvalContext, extensions: &ExtensionManager) -> Result<()> {
    let frontend = VeloxFrontend::new();
    let mut interp = extensions.build_interpreter(context)?;
    let session = interp.new_session_scope();
    let mut editor = DefaultEditor::new()?;

    println!("Velox {} (Ctrl-D to exit)", velox::VERSION);
    loop {
        let line = match editor.readline("velox> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if line.trim().is_empty() {
            continue;
        }
        editor.add_history_entry(line.as_str())?;

        let program = match frontend.parse_str("<repl>", &line) {
            Ok(program) => program,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        match interp.execute_in(&program, &session) {
            Ok(value) if value.is_undefined() => {}
            Ok(value) => println!("{}", value),
            Err(e) => eprintln!("{}", e),
        }
    }
    session.clear();
    Ok(())
}
