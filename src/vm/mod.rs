use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::ast::*;

#[derive(Debug, thiserror::Error)]
pub enum VmError {
    #[error("unknown label '{name}' (jump at instruction {at})")]
    UnknownLabel { name: String, at: usize },
    #[error(transparent)]
    InvalidOperand(#[from] InvalidOperand),
    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded { limit: u64 },
}

type VmResult<T> = Result<T, VmError>;

// ── Result registers ────────────────────────────────────────────────

/// Final register values of a run, in `(ax, bx, cx, dx)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Registers {
    pub ax: i64,
    pub bx: i64,
    pub cx: i64,
    pub dx: i64,
}

impl Registers {
    pub fn get(&self, reg: Register) -> i64 {
        self.as_array()[reg.index()]
    }

    pub fn as_array(&self) -> [i64; 4] {
        [self.ax, self.bx, self.cx, self.dx]
    }

    pub fn as_tuple(&self) -> (i64, i64, i64, i64) {
        (self.ax, self.bx, self.cx, self.dx)
    }
}

impl From<[i64; 4]> for Registers {
    fn from([ax, bx, cx, dx]: [i64; 4]) -> Self {
        Registers { ax, bx, cx, dx }
    }
}

impl From<Registers> for (i64, i64, i64, i64) {
    fn from(regs: Registers) -> Self {
        regs.as_tuple()
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.ax, self.bx, self.cx, self.dx)
    }
}

// ── Machine ─────────────────────────────────────────────────────────

/// Run configuration. State for a run lives in [`Run`] and is dropped with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Machine {
    step_limit: Option<u64>,
}

impl Machine {
    pub fn new() -> Self {
        Machine::default()
    }

    /// Abort with [`VmError::StepLimitExceeded`] instead of executing instruction
    /// number `limit + 1`; a program that halts within `limit` steps is unaffected.
    /// Without a limit a looping program runs forever.
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn step_limit(&self) -> Option<u64> {
        self.step_limit
    }

    pub fn execute(&self, program: &Program) -> VmResult<Registers> {
        self.run(&program.instructions, &program.labels)
    }

    pub fn run(&self, instructions: &[Instruction], labels: &LabelTable) -> VmResult<Registers> {
        let mut run = Run::new(instructions, labels);
        tracing::debug!(instructions = instructions.len(), labels = labels.len(), "run start");
        loop {
            if let Some(limit) = self.step_limit {
                if run.steps >= limit && !run.halted() {
                    tracing::debug!(limit, pc = run.pc, "step limit reached");
                    return Err(VmError::StepLimitExceeded { limit });
                }
            }
            if !run.step()? {
                break;
            }
        }
        tracing::debug!(steps = run.steps, registers = %run.registers(), "halt");
        Ok(run.registers())
    }
}

/// Executes a program on a fresh machine.
pub fn execute(program: &Program) -> VmResult<Registers> {
    Machine::new().execute(program)
}

/// Executes a bare instruction list against a label table.
pub fn run(instructions: &[Instruction], labels: &LabelTable) -> VmResult<Registers> {
    Machine::new().run(instructions, labels)
}

/// State of one run: program counter, register file and comparison flag.
struct Run<'a> {
    instructions: &'a [Instruction],
    labels: &'a LabelTable,
    /// Index of the next instruction to execute.
    pc: usize,
    regs: [i64; 4],
    flag: Ordering,
    steps: u64,
}

impl<'a> Run<'a> {
    fn new(instructions: &'a [Instruction], labels: &'a LabelTable) -> Self {
        Run { instructions, labels, pc: 0, regs: [0; 4], flag: Ordering::Equal, steps: 0 }
    }

    fn halted(&self) -> bool {
        self.pc >= self.instructions.len()
    }

    fn registers(&self) -> Registers {
        Registers::from(self.regs)
    }

    fn reg(&mut self, reg: Register) -> &mut i64 {
        &mut self.regs[reg.index()]
    }

    fn resolve(&self, operand: Operand) -> i64 {
        match operand {
            Operand::Literal(n) => n,
            Operand::Register(r) => self.regs[r.index()],
        }
    }

    fn resolve_target(&self, target: &JumpTarget) -> VmResult<usize> {
        match target {
            JumpTarget::Index(i) => Ok(*i),
            JumpTarget::Label(name) => self
                .labels
                .get(name)
                .copied()
                .ok_or_else(|| VmError::UnknownLabel { name: name.clone(), at: self.pc }),
        }
    }

    /// Executes one instruction. Returns `false` once the counter is past the end.
    fn step(&mut self) -> VmResult<bool> {
        let instructions = self.instructions;
        let Some(inst) = instructions.get(self.pc) else {
            return Ok(false);
        };
        tracing::trace!(pc = self.pc, %inst, "step");
        let mut next = self.pc + 1;
        match inst {
            Instruction::Assign { dst, src } => {
                let v = self.resolve(*src);
                *self.reg(*dst) = v;
            }
            Instruction::Increment { dst, by } => {
                let v = self.resolve(*by);
                let r = self.reg(*dst);
                *r = r.wrapping_add(v);
            }
            Instruction::Decrement { dst, by } => {
                let v = self.resolve(*by);
                let r = self.reg(*dst);
                *r = r.wrapping_sub(v);
            }
            Instruction::Compare { a, b } => {
                self.flag = self.resolve(*a).cmp(&self.resolve(*b));
            }
            Instruction::Jump { condition, target } => {
                if condition.holds(self.flag) {
                    next = self.resolve_target(target)?;
                }
            }
        }
        self.pc = next;
        self.steps += 1;
        Ok(true)
    }
}
