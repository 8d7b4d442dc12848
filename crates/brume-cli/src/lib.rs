//! brume-cli : bibliothèque interne du binaire `brume`
//!
//! But : garder le parsing d'arguments dans `main.rs` et fournir ici une API
//! testable : lecture des sources, exécution, REPL, désassemblage, jetons.
//!
//! Points clés :
//! - Codes de sortie : `0` ok, `65` erreur de compilation, `70` erreur
//!   d'exécution, `74` source illisible
//! - Traces (`feature = "trace"`) et couleurs (`feature = "color"`) optionnelles

#![deny(unused_must_use)]
#![forbid(unsafe_code)]

use std::{
    fs,
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{anyhow, Context, Result};
use brume_compiler::{CompileError, Compiler, CompilerOptions};
use brume_core::{disasm::disassemble_chunk, Chunk};
use brume_vm::{InterpretResult, Vm, VmOptions};
use rustyline::{error::ReadlineError, DefaultEditor};

#[cfg(feature = "color")]
use owo_colors::{OwoColorize, Stream, Style};

/// Source illisible (fichier absent, stdin fermé, UTF-8 invalide).
pub const EXIT_IO: i32 = 74;

// ───────────────────────────── Types publics ─────────────────────────────

/// Commande haut-niveau (sans parsing CLI, réservé à main.rs).
#[derive(Clone, Debug)]
pub enum Command {
    /// Compile puis exécute une source.
    Run(RunTask),
    /// Boucle interactive.
    Repl(ReplTask),
    /// Liste le bytecode compilé d'une source.
    Disasm(DisasmTask),
    /// Affiche les jetons d'une source.
    Tokens(TokensTask),
}

/// `brume run`
#[derive(Clone, Debug, Default)]
pub struct RunTask {
    pub input: Input,
    pub options: VmOptions,
    pub time: bool, // afficher le timing
}

/// `brume repl`
#[derive(Clone, Debug)]
pub struct ReplTask {
    pub prompt: String,
    pub options: VmOptions,
}

impl Default for ReplTask {
    fn default() -> Self {
        Self { prompt: "> ".into(), options: VmOptions::default() }
    }
}

/// `brume disasm`
#[derive(Clone, Debug, Default)]
pub struct DisasmTask {
    pub input: Input,
    pub output: Output,
}

/// `brume tokens`
#[derive(Clone, Debug, Default)]
pub struct TokensTask {
    pub input: Input,
}

/// Entrée texte (source) : fichier ou `-` (=stdin).
#[derive(Clone, Debug, Default)]
pub enum Input {
    Path(PathBuf),
    #[default]
    Stdin,
}

impl Input {
    /// `-` désigne stdin.
    pub fn from_arg(path: PathBuf) -> Self {
        if path.as_os_str() == "-" {
            Self::Stdin
        } else {
            Self::Path(path)
        }
    }

    /// Nom affiché dans les en-têtes de listing.
    pub fn label(&self) -> String {
        match self {
            Self::Path(p) => display(p),
            Self::Stdin => "<stdin>".into(),
        }
    }
}

/// Sortie texte.
#[derive(Clone, Debug, Default)]
pub enum Output {
    Path(PathBuf),
    #[default]
    Stdout,
}

// ───────────────────────────── Initialisation ─────────────────────────────

/// Initialise le logger selon la feature `trace`.
///
/// Les événements `tracing` du compilateur et de la VM arrivent ici via le
/// pont `log`.
pub fn init_logger() {
    #[cfg(feature = "trace")]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
            .format_timestamp(None)
            .try_init();
    }
}

/// Choix de couleur pour les étiquettes de statut (stderr).
///
/// `Some(true)` force, `Some(false)` coupe, `None` rend la main à la
/// détection (TTY, `NO_COLOR`, `CLICOLOR_FORCE`).
pub fn set_color(choice: Option<bool>) {
    #[cfg(feature = "color")]
    {
        match choice {
            Some(enabled) => owo_colors::set_override(enabled),
            None => owo_colors::unset_override(),
        }
    }
    #[cfg(not(feature = "color"))]
    {
        let _ = choice;
    }
}

/// Filtre `env_logger` : le niveau vient de la verbosité, sauf si
/// `RUST_LOG` est déjà posé ; les cibles `brume::trace` / `brume::code`
/// sont ajoutées dans les deux cas.
pub fn log_filter(existing: Option<&str>, verbose: u8, quiet: bool, trace: bool, print_code: bool) -> String {
    let mut filter = match existing.map(str::trim).filter(|s| !s.is_empty()) {
        Some(user) => user.to_owned(),
        None if quiet => "error".to_owned(),
        None => match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
        .to_owned(),
    };
    if trace {
        filter.push_str(",brume::trace=trace");
    }
    if print_code {
        filter.push_str(",brume::code=debug");
    }
    filter
}

// ───────────────────────────── Exécution ─────────────────────────────

/// Exécute une commande. Retourne un code de sortie.
pub fn execute(cmd: Command) -> Result<i32> {
    match cmd {
        Command::Run(t) => Ok(run_entry(t)),
        Command::Repl(t) => repl_entry(t),
        Command::Disasm(t) => disasm_entry(t),
        Command::Tokens(t) => Ok(tokens_entry(&t)),
    }
}

fn run_entry(task: RunTask) -> i32 {
    let Some(source) = read_or_report(&task.input) else {
        return EXIT_IO;
    };

    let start = Instant::now();
    let result = Vm::new().with_options(task.options).interpret(&source);
    let elapsed = start.elapsed();
    log::debug!("run {} -> {result:?}", task.input.label());

    if task.time {
        status_info("TIME", &format!("run: {} ms", elapsed.as_millis()));
    }
    result.exit_code()
}

fn repl_entry(task: ReplTask) -> Result<i32> {
    let mut editor = DefaultEditor::new().context("initialisation de l'éditeur de ligne")?;
    let mut vm = Vm::new().with_options(task.options);
    let mut last: Option<String> = None;

    status_info("BRUME", "REPL (:help pour l'aide, Ctrl-D pour quitter)");

    loop {
        let line = match editor.readline(&task.prompt) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(anyhow!("readline: {e}")),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        editor.add_history_entry(trimmed)?;

        match trimmed {
            ":q" | ":quit" => break,
            ":help" => println!("{REPL_HELP}"),
            ":disasm" => match last.as_deref() {
                Some(src) => match listing(src, "repl") {
                    Ok(text) => print!("{text}"),
                    Err(e) => eprintln!("{e}"),
                },
                None => status_info("DISASM", "aucune ligne à désassembler"),
            },
            meta if meta.starts_with(':') => status_err("REPL", &format!("commande inconnue : {meta}")),
            src => {
                let result = vm.interpret(src);
                log::debug!("repl -> {result:?}");
                last = Some(src.to_owned());
            }
        }
    }
    Ok(0)
}

const REPL_HELP: &str = "\
:help           cette aide
:disasm         bytecode de la dernière expression
:quit, :q       quitter";

fn disasm_entry(task: DisasmTask) -> Result<i32> {
    let Some(source) = read_or_report(&task.input) else {
        return Ok(EXIT_IO);
    };
    let text = match listing(&source, &task.input.label()) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{e}");
            return Ok(InterpretResult::CompileError.exit_code());
        }
    };

    match task.output {
        Output::Stdout => {
            let mut w = BufWriter::new(io::stdout().lock());
            w.write_all(text.as_bytes())?;
            w.flush()?;
        }
        Output::Path(ref p) => {
            write_text_atomic(p, &text).with_context(|| format!("écriture de {}", display(p)))?;
            status_ok("DISASM", &display(p));
        }
    }
    Ok(0)
}

fn tokens_entry(task: &TokensTask) -> i32 {
    let Some(source) = read_or_report(&task.input) else {
        return EXIT_IO;
    };
    print!("{}", brume_lexer::dump_tokens(&source));
    0
}

/// Compile `source` et rend son listing désassemblé.
pub fn listing(source: &str, name: &str) -> Result<String, CompileError> {
    let mut chunk = Chunk::new();
    Compiler::new(CompilerOptions::default()).compile(source, &mut chunk)?;
    Ok(disassemble_chunk(&chunk, name))
}

// ───────────────────────────── Utilitaires E/S ─────────────────────────────

/// Lit une source entière (fichier ou stdin).
pub fn read_source(input: &Input) -> Result<String> {
    match input {
        Input::Stdin => {
            let mut s = String::new();
            io::stdin().read_to_string(&mut s).context("lecture de stdin")?;
            Ok(s)
        }
        Input::Path(p) => {
            let f = File::open(p).with_context(|| format!("ouverture: {}", display(p)))?;
            let mut s = String::new();
            BufReader::new(f)
                .read_to_string(&mut s)
                .with_context(|| format!("lecture: {}", display(p)))?;
            Ok(s)
        }
    }
}

fn read_or_report(input: &Input) -> Option<String> {
    match read_source(input) {
        Ok(s) => Some(s),
        Err(e) => {
            status_err("IO", &format!("{e:#}"));
            None
        }
    }
}

fn write_text_atomic(path: &Path, text: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let base = path.file_name().ok_or_else(|| anyhow!("chemin de sortie sans nom: {}", display(path)))?;
    let tmp = unique_tmp_path(parent, base);
    {
        let mut w = BufWriter::new(File::create(&tmp)?);
        w.write_all(text.as_bytes())?;
        w.flush()?;
    }
    fs::rename(&tmp, path).or_else(|_| {
        // fallback : copie puis suppr tmp
        fs::copy(&tmp, path).and_then(|_| fs::remove_file(&tmp))
    })?;
    Ok(())
}

fn unique_tmp_path(dir: &Path, base: &std::ffi::OsStr) -> PathBuf {
    let mut i = 0u32;
    loop {
        let candidate = dir.join(format!("{}.tmp{i}", base.to_string_lossy()));
        if !candidate.exists() {
            return candidate;
        }
        i = i.wrapping_add(1);
    }
}

fn display(p: &Path) -> String {
    p.to_string_lossy().to_string()
}

// ───────────────────────────── Sorties jolies ─────────────────────────────

#[derive(Clone, Copy, Debug)]
enum Tone {
    Ok,
    Info,
    Err,
}

/// Étiquette colorée seulement si stderr le supporte (ou si forcé).
fn paint(tag: &str, tone: Tone) -> String {
    #[cfg(feature = "color")]
    {
        let style = match tone {
            Tone::Ok => Style::new().green().bold(),
            Tone::Info => Style::new().blue().bold(),
            Tone::Err => Style::new().red().bold(),
        };
        tag.if_supports_color(Stream::Stderr, |t| t.style(style)).to_string()
    }
    #[cfg(not(feature = "color"))]
    {
        let _ = tone;
        tag.to_owned()
    }
}

fn status_ok(tag: &str, msg: &str) {
    eprintln!("{} {msg}", paint(tag, Tone::Ok));
}

fn status_info(tag: &str, msg: &str) {
    eprintln!("{} {msg}", paint(tag, Tone::Info));
}

fn status_err(tag: &str, msg: &str) {
    eprintln!("{} {msg}", paint(tag, Tone::Err));
}

// ───────────────────────────── Tests ─────────────────────────────
