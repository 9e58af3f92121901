//! A four-register assembler and machine.
//!
//! Programs are built with [`builder::ProgramBuilder`] (or parsed from text by
//! [`parser`]) into a [`Program`]: an instruction list plus a label table. The
//! [`vm`] runs a program against registers `ax`, `bx`, `cx`, `dx`, all
//! starting at zero, until the program counter falls off the end.
//!
//! ```
//! use quadasm::ast::Register::*;
//!
//! let regs = quadasm::asm(|b| {
//!     b.assign(Cx, 0)
//!         .label("loop")
//!         .increment(Ax)
//!         .increment(Cx)
//!         .compare(Cx, 5)
//!         .jump_if_less("loop");
//! })
//! .unwrap();
//! assert_eq!(regs.as_tuple(), (5, 0, 5, 0));
//! ```

pub mod ast;
pub mod builder;
pub mod codegen;
pub mod diagnostic;
pub mod lexer;
pub mod parser;
pub mod verify;
pub mod vm;

pub use ast::{Condition, Instruction, JumpTarget, Operand, Program, Register};
pub use builder::ProgramBuilder;
pub use vm::{Machine, Registers, VmError};

/// Builds a program with `describe` and runs it on a fresh machine.
pub fn asm(describe: impl FnOnce(&mut ProgramBuilder)) -> Result<Registers, VmError> {
    vm::execute(&Program::compile(describe))
}
