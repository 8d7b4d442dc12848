//! `brume` : CLI principal de Brume
//!
//! Ici on fait uniquement : parsing d'arguments, initialisation (logger,
//! couleur), et délégation à `brume_cli` (lib).

#![forbid(unsafe_code)]

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use brume_cli as cli; // notre lib interne (src/lib.rs)
use brume_vm::VmOptions;

// ──────────────────────────── CLI (clap) ────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "brume", version, about = "Brume, évaluer des expressions, REPL, désassembler", long_about = None)]
struct Opt {
    /// Augmente la verbosité (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux (casse la verbosité)
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue, global = true)]
    quiet: bool,

    /// Force la couleur (si la feature `color` est compilée)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto, global = true)]
    color: ColorChoice,

    /// Liste le bytecode compilé avant exécution
    #[arg(long = "print-code", global = true)]
    print_code: bool,

    /// Trace chaque instruction exécutée
    #[arg(long = "trace", global = true)]
    trace: bool,

    /// Sous-commandes (REPL si omis)
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Évaluer un script
    Run {
        /// Fichier source (ou - pour stdin)
        input: PathBuf,
        /// Afficher le temps d'exécution
        #[arg(long)]
        time: bool,
    },

    /// Lancer le REPL
    Repl {
        /// Prompt du REPL
        #[arg(long, default_value = "> ")]
        prompt: String,
    },

    /// Désassembler le bytecode compilé d'une source
    Disasm {
        /// Fichier source (ou - pour stdin)
        input: PathBuf,
        /// Sortie texte (stdout si omis)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Afficher les jetons d'une source
    Tokens {
        /// Fichier source (ou - pour stdin)
        input: PathBuf,
    },
}

// ──────────────────────────── Logger / Verbosité ────────────────────────────

fn init_telemetry(verbose: u8, quiet: bool, trace: bool, print_code: bool) {
    #[cfg(feature = "trace")]
    {
        let existing = std::env::var("RUST_LOG").ok();
        let filter = cli::log_filter(existing.as_deref(), verbose, quiet, trace, print_code);
        std::env::set_var("RUST_LOG", filter);
        cli::init_logger();
    }
    #[cfg(not(feature = "trace"))]
    {
        let _ = (verbose, quiet, trace, print_code);
    }
}

fn init_color(choice: ColorChoice) {
    // Auto : `owo-colors` regarde le TTY, NO_COLOR et CLICOLOR_FORCE.
    cli::set_color(match choice {
        ColorChoice::Auto => None,
        ColorChoice::Always => Some(true),
        ColorChoice::Never => Some(false),
    });
}

// ──────────────────────────── main ────────────────────────────

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn real_main() -> Result<i32> {
    let opt = Opt::parse();

    init_color(opt.color);
    init_telemetry(opt.verbose, opt.quiet, opt.trace, opt.print_code);

    let options = VmOptions { trace_execution: opt.trace, print_code: opt.print_code };

    use cli::{Command as C, DisasmTask, Input, Output, ReplTask, RunTask, TokensTask};

    let command = match opt.cmd {
        Some(Command::Run { input, time }) => C::Run(RunTask { input: Input::from_arg(input), options, time }),
        Some(Command::Repl { prompt }) => C::Repl(ReplTask { prompt, options }),
        None => C::Repl(ReplTask { options, ..ReplTask::default() }),
        Some(Command::Disasm { input, output }) => C::Disasm(DisasmTask {
            input: Input::from_arg(input),
            output: output.map_or(Output::Stdout, Output::Path),
        }),
        Some(Command::Tokens { input }) => C::Tokens(TokensTask { input: Input::from_arg(input) }),
    };

    cli::execute(command).context("échec d'exécution de la commande")
}
