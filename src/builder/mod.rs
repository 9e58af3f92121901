//! Append-only program builder.
//!
//! Each mnemonic call appends one instruction; `label` binds a name to the
//! index the next instruction will occupy. Nothing is evaluated here: operands
//! are stored as given and labels are resolved by the machine when a jump runs,
//! so forward references are fine.

use crate::ast::{Condition, Instruction, JumpTarget, LabelTable, Operand, Program, Register};

#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    instructions: Vec<Instruction>,
    labels: LabelTable,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        ProgramBuilder::default()
    }

    fn emit(&mut self, inst: Instruction) -> &mut Self {
        tracing::trace!(index = self.instructions.len(), %inst, "emit");
        self.instructions.push(inst);
        self
    }

    /// `mov dst, src`
    pub fn assign(&mut self, dst: Register, src: impl Into<Operand>) -> &mut Self {
        self.emit(Instruction::Assign { dst, src: src.into() })
    }

    /// `inc dst`: adds one.
    pub fn increment(&mut self, dst: Register) -> &mut Self {
        self.increment_by(dst, 1)
    }

    pub fn increment_by(&mut self, dst: Register, by: impl Into<Operand>) -> &mut Self {
        self.emit(Instruction::Increment { dst, by: by.into() })
    }

    /// `dec dst`: subtracts one.
    pub fn decrement(&mut self, dst: Register) -> &mut Self {
        self.decrement_by(dst, 1)
    }

    pub fn decrement_by(&mut self, dst: Register, by: impl Into<Operand>) -> &mut Self {
        self.emit(Instruction::Decrement { dst, by: by.into() })
    }

    pub fn compare(&mut self, a: impl Into<Operand>, b: impl Into<Operand>) -> &mut Self {
        self.emit(Instruction::Compare { a: a.into(), b: b.into() })
    }

    pub fn jump_when(&mut self, condition: Condition, target: impl Into<JumpTarget>) -> &mut Self {
        self.emit(Instruction::Jump { condition, target: target.into() })
    }

    pub fn jump(&mut self, target: impl Into<JumpTarget>) -> &mut Self {
        self.jump_when(Condition::Always, target)
    }

    pub fn jump_if_equal(&mut self, target: impl Into<JumpTarget>) -> &mut Self {
        self.jump_when(Condition::Equal, target)
    }

    pub fn jump_if_not_equal(&mut self, target: impl Into<JumpTarget>) -> &mut Self {
        self.jump_when(Condition::NotEqual, target)
    }

    pub fn jump_if_less(&mut self, target: impl Into<JumpTarget>) -> &mut Self {
        self.jump_when(Condition::Less, target)
    }

    pub fn jump_if_less_or_equal(&mut self, target: impl Into<JumpTarget>) -> &mut Self {
        self.jump_when(Condition::LessOrEqual, target)
    }

    pub fn jump_if_greater(&mut self, target: impl Into<JumpTarget>) -> &mut Self {
        self.jump_when(Condition::Greater, target)
    }

    pub fn jump_if_greater_or_equal(&mut self, target: impl Into<JumpTarget>) -> &mut Self {
        self.jump_when(Condition::GreaterOrEqual, target)
    }

    /// Binds `name` to the current instruction count. Redeclaring a name rebinds it.
    pub fn label(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        let index = self.instructions.len();
        if let Some(previous) = self.labels.insert(name.clone(), index) {
            tracing::debug!(label = %name, previous, index, "label redeclared");
        }
        self
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Snapshot of everything built so far. The builder stays usable.
    pub fn build(&self) -> Program {
        Program::new(self.instructions.clone(), self.labels.clone())
    }

    pub fn into_program(self) -> Program {
        Program::new(self.instructions, self.labels)
    }
}
