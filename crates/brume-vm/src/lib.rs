//! Brume VM : machine à pile
//!
//! - Pile fixe de [`STACK_MAX`] valeurs, pas de croissance
//! - Boucle fetch/decode/execute octet par octet
//! - Erreurs d'exécution localisées via la table des lignes (`ip - 1`)
//! - Trace optionnelle (`tracing`, cible `brume::trace`)
//!
//! ```
//! use brume_vm::{InterpretResult, Vm};
//!
//! let mut vm = Vm::with_output(Vec::new(), Vec::new());
//! assert_eq!(vm.interpret("2 + 3 * 4"), InterpretResult::Ok);
//! let (out, _) = vm.into_output();
//! assert_eq!(out, b"14\n");
//! ```

#![deny(missing_docs)]

use std::io::{self, Stderr, Stdout, Write};

use brume_compiler::{Compiler, CompilerOptions};
use brume_core::{disasm::disassemble_instruction, Chunk, OpCode, Value};

/// Capacité de la pile de valeurs.
pub const STACK_MAX: usize = 256;

// ─────────────────────────────────────────────────────────────────────────────
// Résultats & erreurs
// ─────────────────────────────────────────────────────────────────────────────

/// Issue d'un appel à [`Vm::interpret`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    /// Compilé puis exécuté sans erreur
    Ok,
    /// Erreur de syntaxe, rien n'a été exécuté
    CompileError,
    /// Erreur à l'exécution
    RuntimeError,
}

impl InterpretResult {
    /// Code de sortie conventionnel (`0`, `65`, `70`).
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::CompileError => 65,
            Self::RuntimeError => 70,
        }
    }
}

/// Erreur d'exécution d'un chunk.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VmError {
    /// Erreur utilisateur (types, débordement de pile)
    #[error("{message}\n[line {line}] in script")]
    Runtime {
        /// Message
        message: &'static str,
        /// Ligne de l'instruction fautive
        line: u32,
    },
    /// Chunk incohérent ; un chunk produit par le compilateur n'y mène jamais
    #[error("corrupted chunk at offset {offset}: {reason}")]
    Corrupted {
        /// Offset de l'instruction fautive
        offset: usize,
        /// Raison
        reason: &'static str,
    },
}

/// Erreur interne, localisée après coup par [`Vm::run`].
#[derive(Debug, Clone, Copy)]
enum Fault {
    Runtime(&'static str),
    Corrupted(&'static str),
}

type Exec<T> = Result<T, Fault>;

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Options de la VM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VmOptions {
    /// Trace chaque instruction avec l'état de la pile
    pub trace_execution: bool,
    /// Liste le code compilé avant exécution
    pub print_code: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// VM
// ─────────────────────────────────────────────────────────────────────────────

/// Machine virtuelle. `O` reçoit les résultats, `E` les diagnostics.
pub struct Vm<O: Write = Stdout, E: Write = Stderr> {
    stack: [Value; STACK_MAX],
    stack_top: usize,
    ip: usize,
    options: VmOptions,
    out: O,
    err: E,
}

impl Vm {
    /// VM branchée sur stdout/stderr.
    pub fn new() -> Self {
        Self::with_output(io::stdout(), io::stderr())
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Write, E: Write> Vm<O, E> {
    /// VM écrivant dans les flux donnés.
    pub fn with_output(out: O, err: E) -> Self {
        Self { stack: [Value::Nil; STACK_MAX], stack_top: 0, ip: 0, options: VmOptions::default(), out, err }
    }

    /// Remplace les options.
    #[must_use]
    pub fn with_options(mut self, options: VmOptions) -> Self {
        self.options = options;
        self
    }

    /// Options courantes.
    pub const fn options(&self) -> VmOptions {
        self.options
    }

    /// Modifie les options en place (REPL).
    pub fn set_options(&mut self, options: VmOptions) {
        self.options = options;
    }

    /// Rend les flux de sortie.
    pub fn into_output(self) -> (O, E) {
        (self.out, self.err)
    }

    /// Valeurs actuellement sur la pile (fond en premier).
    pub fn stack(&self) -> &[Value] {
        &self.stack[..self.stack_top]
    }

    /// Compile puis exécute `source`.
    ///
    /// Les diagnostics partent sur le flux d'erreur ; la valeur rendue par
    /// `RETURN` est écrite, suivie d'un saut de ligne, sur le flux de sortie.
    pub fn interpret(&mut self, source: &str) -> InterpretResult {
        let mut chunk = Chunk::new();
        let compiler = Compiler::new(CompilerOptions { print_code: self.options.print_code });
        if let Err(e) = compiler.compile(source, &mut chunk) {
            report(&mut self.err, format_args!("{e}"));
            return InterpretResult::CompileError;
        }

        match self.run(&chunk) {
            Ok(value) => {
                report(&mut self.out, format_args!("{value}"));
                InterpretResult::Ok
            }
            Err(e) => {
                report(&mut self.err, format_args!("{e}"));
                InterpretResult::RuntimeError
            }
        }
    }

    /// Exécute un chunk déjà compilé et rend la valeur de `RETURN`.
    ///
    /// La pile est remise à zéro avant l'exécution et après une erreur.
    pub fn run(&mut self, chunk: &Chunk) -> Result<Value, VmError> {
        self.reset();
        tracing::debug!(bytes = chunk.len(), constants = chunk.constants().len(), "run chunk");
        self.execute(chunk).map_err(|fault| {
            let error = self.locate(chunk, fault);
            self.reset();
            error
        })
    }

    fn reset(&mut self) {
        self.stack_top = 0;
        self.ip = 0;
    }

    fn execute(&mut self, chunk: &Chunk) -> Exec<Value> {
        loop {
            if self.options.trace_execution {
                self.trace(chunk);
            }

            let byte = self.read_byte(chunk)?;
            let op = OpCode::try_from(byte).map_err(|_| Fault::Corrupted("unknown opcode"))?;
            match op {
                OpCode::Constant => {
                    let index = self.read_byte(chunk)?;
                    let value = chunk.constant(index).ok_or(Fault::Corrupted("constant index out of range"))?;
                    self.push(value)?;
                }
                OpCode::Nil => self.push(Value::Nil)?,
                OpCode::True => self.push(Value::Bool(true))?,
                OpCode::False => self.push(Value::Bool(false))?,
                OpCode::Equal => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    self.push(Value::Bool(a == b))?;
                }
                OpCode::Greater => self.binary_op(|a, b| Value::Bool(a > b))?,
                OpCode::Less => self.binary_op(|a, b| Value::Bool(a < b))?,
                OpCode::Add => self.binary_op(|a, b| Value::Number(a + b))?,
                OpCode::Subtract => self.binary_op(|a, b| Value::Number(a - b))?,
                OpCode::Multiply => self.binary_op(|a, b| Value::Number(a * b))?,
                OpCode::Divide => self.binary_op(|a, b| Value::Number(a / b))?,
                OpCode::Not => {
                    let value = self.pop()?;
                    self.push(Value::Bool(value.is_falsey()))?;
                }
                OpCode::Negate => {
                    let Some(n) = self.peek(0)?.as_number() else {
                        return Err(Fault::Runtime("Operand must be a number."));
                    };
                    self.stack[self.stack_top - 1] = Value::Number(-n);
                }
                OpCode::Return => return self.pop(),
            }
        }
    }

    /* ────────── Pile ────────── */

    fn push(&mut self, value: Value) -> Exec<()> {
        let slot = self.stack.get_mut(self.stack_top).ok_or(Fault::Runtime("Stack overflow."))?;
        *slot = value;
        self.stack_top += 1;
        Ok(())
    }

    fn pop(&mut self) -> Exec<Value> {
        self.stack_top = self.stack_top.checked_sub(1).ok_or(Fault::Corrupted("stack underflow"))?;
        Ok(self.stack[self.stack_top])
    }

    fn peek(&self, distance: usize) -> Exec<Value> {
        self.stack_top
            .checked_sub(distance + 1)
            .map(|i| self.stack[i])
            .ok_or(Fault::Corrupted("stack underflow"))
    }

    /// Opérandes numériques vérifiés sommet d'abord, puis dépilés (droite, gauche).
    fn binary_op(&mut self, op: fn(f64, f64) -> Value) -> Exec<()> {
        let (Some(b), Some(a)) = (self.peek(0)?.as_number(), self.peek(1)?.as_number()) else {
            return Err(Fault::Runtime("Operands must be numbers."));
        };
        self.stack_top -= 2;
        self.push(op(a, b))
    }

    /* ────────── Lecture du code ────────── */

    fn read_byte(&mut self, chunk: &Chunk) -> Exec<u8> {
        let byte = *chunk.code().get(self.ip).ok_or(Fault::Corrupted("instruction pointer past end of chunk"))?;
        self.ip += 1;
        Ok(byte)
    }

    /// Rattache une faute à l'instruction qui vient d'être lue.
    fn locate(&self, chunk: &Chunk, fault: Fault) -> VmError {
        let offset = self.ip.saturating_sub(1);
        match fault {
            Fault::Runtime(message) => {
                let line = chunk.line_at(offset).unwrap_or_default();
                tracing::debug!(line, message, "runtime error");
                VmError::Runtime { message, line }
            }
            Fault::Corrupted(reason) => {
                tracing::error!(offset, reason, "corrupted chunk");
                VmError::Corrupted { offset, reason }
            }
        }
    }

    fn trace(&self, chunk: &Chunk) {
        tracing::trace!(target: "brume::trace", "{}", trace_line(self.stack(), chunk, self.ip));
    }
}

/// Ligne de trace : la pile (`[ v ]` par valeur, du fond vers le sommet) puis
/// l'instruction désassemblée à `offset`.
pub fn trace_line(stack: &[Value], chunk: &Chunk, offset: usize) -> String {
    let slots: String = stack.iter().map(|v| format!("[ {v} ]")).collect();
    let (instruction, _) = disassemble_instruction(chunk, offset);
    format!("          {slots}\n{instruction}")
}

/// Écrit une ligne ; un flux fermé n'interrompt pas l'interprétation.
fn report(w: &mut impl Write, args: std::fmt::Arguments<'_>) {
    if let Err(e) = writeln!(w, "{args}").and_then(|()| w.flush()) {
        tracing::warn!(error = %e, "write failed");
    }
}

/// Compile et exécute `source` sur stdout/stderr.
pub fn interpret(source: &str) -> InterpretResult {
    Vm::new().interpret(source)
}
