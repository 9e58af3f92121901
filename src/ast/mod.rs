use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod source_map;
pub use source_map::SourceMap;

// ---- Span infrastructure ----

/// Byte range within source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const UNKNOWN: Span = Span { start: 0, end: 0 };

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Span { start: range.start, end: range.end }
    }
}

// ---- Registers and operands ----

/// One of the four machine registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Register {
    Ax,
    Bx,
    Cx,
    Dx,
}

impl Register {
    pub const ALL: [Register; 4] = [Register::Ax, Register::Bx, Register::Cx, Register::Dx];

    /// Slot in the register file; also the position in the result tuple.
    pub const fn index(self) -> usize {
        match self {
            Register::Ax => 0,
            Register::Bx => 1,
            Register::Cx => 2,
            Register::Dx => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Register::Ax => "ax",
            Register::Bx => "bx",
            Register::Cx => "cx",
            Register::Dx => "dx",
        }
    }

    pub fn from_name(name: &str) -> Option<Register> {
        Register::ALL.into_iter().find(|r| r.name() == name)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid operand '{operand}': expected an integer literal or one of ax, bx, cx, dx")]
pub struct InvalidOperand {
    pub operand: String,
}

impl FromStr for Register {
    type Err = InvalidOperand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Register::from_name(s).ok_or_else(|| InvalidOperand { operand: s.to_string() })
    }
}

/// Value source for an instruction. Resolved only when the instruction runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    Literal(i64),
    Register(Register),
}

/// Wire form of an operand: a JSON integer or a register name.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawOperand {
    Literal(i64),
    Name(String),
}

impl<'de> Deserialize<'de> for Operand {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawOperand::deserialize(deserializer)? {
            RawOperand::Literal(n) => Ok(Operand::Literal(n)),
            RawOperand::Name(name) => name
                .parse::<Register>()
                .map(Operand::Register)
                .map_err(serde::de::Error::custom),
        }
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Literal(value)
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Literal(value as i64)
    }
}

impl From<Register> for Operand {
    fn from(reg: Register) -> Self {
        Operand::Register(reg)
    }
}

impl FromStr for Operand {
    type Err = InvalidOperand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i64>() {
            return Ok(Operand::Literal(n));
        }
        s.parse::<Register>().map(Operand::Register)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(n) => write!(f, "{n}"),
            Operand::Register(r) => write!(f, "{r}"),
        }
    }
}

// ---- Jumps ----

/// Predicate a jump evaluates against the comparison flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Always,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Condition {
    pub const ALL: [Condition; 7] = [
        Condition::Always,
        Condition::Equal,
        Condition::NotEqual,
        Condition::Less,
        Condition::LessOrEqual,
        Condition::Greater,
        Condition::GreaterOrEqual,
    ];

    /// `flag` is the ordering of the last compare's left operand against its right.
    pub fn holds(self, flag: std::cmp::Ordering) -> bool {
        match self {
            Condition::Always => true,
            Condition::Equal => flag.is_eq(),
            Condition::NotEqual => flag.is_ne(),
            Condition::Less => flag.is_lt(),
            Condition::LessOrEqual => flag.is_le(),
            Condition::Greater => flag.is_gt(),
            Condition::GreaterOrEqual => flag.is_ge(),
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Condition::Always => "jmp",
            Condition::Equal => "je",
            Condition::NotEqual => "jne",
            Condition::Less => "jl",
            Condition::LessOrEqual => "jle",
            Condition::Greater => "jg",
            Condition::GreaterOrEqual => "jge",
        }
    }

    pub fn from_mnemonic(mnemonic: &str) -> Option<Condition> {
        Condition::ALL.into_iter().find(|c| c.mnemonic() == mnemonic)
    }
}

/// Where a jump lands: a label resolved at jump time, or a raw instruction index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JumpTarget {
    Index(usize),
    Label(String),
}

impl From<&str> for JumpTarget {
    fn from(name: &str) -> Self {
        JumpTarget::Label(name.to_string())
    }
}

impl From<String> for JumpTarget {
    fn from(name: String) -> Self {
        JumpTarget::Label(name)
    }
}

impl From<usize> for JumpTarget {
    fn from(index: usize) -> Self {
        JumpTarget::Index(index)
    }
}

impl fmt::Display for JumpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JumpTarget::Index(i) => write!(f, "{i}"),
            JumpTarget::Label(name) => f.write_str(name),
        }
    }
}

// ---- Instructions ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    /// `mov dst, src`
    Assign { dst: Register, src: Operand },
    /// `inc dst[, by]`
    Increment { dst: Register, by: Operand },
    /// `dec dst[, by]`
    Decrement { dst: Register, by: Operand },
    /// `cmp a, b`
    Compare { a: Operand, b: Operand },
    /// `jmp`/`je`/`jne`/`jl`/`jle`/`jg`/`jge target`
    Jump { condition: Condition, target: JumpTarget },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Assign { dst, src } => write!(f, "mov {dst}, {src}"),
            Instruction::Increment { dst, by: Operand::Literal(1) } => write!(f, "inc {dst}"),
            Instruction::Increment { dst, by } => write!(f, "inc {dst}, {by}"),
            Instruction::Decrement { dst, by: Operand::Literal(1) } => write!(f, "dec {dst}"),
            Instruction::Decrement { dst, by } => write!(f, "dec {dst}, {by}"),
            Instruction::Compare { a, b } => write!(f, "cmp {a}, {b}"),
            Instruction::Jump { condition, target } => {
                write!(f, "{} {target}", condition.mnemonic())
            }
        }
    }
}

// ---- Program ----

pub type LabelTable = BTreeMap<String, usize>;

/// A finished instruction list plus the label table built alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub labels: LabelTable,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid label name {name:?}: expected an identifier that is not a register or mnemonic")]
pub struct InvalidLabel {
    pub name: String,
}

pub fn is_mnemonic(word: &str) -> bool {
    matches!(word, "mov" | "inc" | "dec" | "cmp") || Condition::from_mnemonic(word).is_some()
}

/// Whether `name` reads back as a label in assembly text:
/// `[A-Za-z_.][A-Za-z0-9_.]*`, and not a register or mnemonic.
pub fn is_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    let head = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '.');
    head && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && Register::from_name(name).is_none()
        && !is_mnemonic(name)
}

#[derive(Deserialize)]
struct RawProgram {
    instructions: Vec<Instruction>,
    labels: LabelTable,
}

impl<'de> Deserialize<'de> for Program {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawProgram::deserialize(deserializer)?;
        let program = Program::new(raw.instructions, raw.labels);
        program.check_names().map_err(serde::de::Error::custom)?;
        Ok(program)
    }
}

impl Program {
    pub fn new(instructions: Vec<Instruction>, labels: LabelTable) -> Self {
        Program { instructions, labels }
    }

    /// Runs `describe` against a fresh builder and returns what it built.
    pub fn compile(describe: impl FnOnce(&mut crate::builder::ProgramBuilder)) -> Program {
        let mut builder = crate::builder::ProgramBuilder::new();
        describe(&mut builder);
        builder.build()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Fails on the first label or jump-target name that could not be written
    /// as assembly text. Builder programs skip this; JSON input and the
    /// formatter go through it.
    pub fn check_names(&self) -> Result<(), InvalidLabel> {
        let targets = self.instructions.iter().filter_map(|inst| match inst {
            Instruction::Jump { target: JumpTarget::Label(name), .. } => Some(name),
            _ => None,
        });
        match self.labels.keys().chain(targets).find(|name| !is_label_name(name)) {
            Some(name) => Err(InvalidLabel { name: name.clone() }),
            None => Ok(()),
        }
    }

    /// Labels bound to `index`, in name order.
    pub fn labels_at(&self, index: usize) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .filter(move |(_, at)| **at == index)
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn register_names_roundtrip() {
        for reg in Register::ALL {
            assert_eq!(reg.name().parse::<Register>().unwrap(), reg);
        }
        assert_eq!(Register::Dx.index(), 3);
    }

    #[test]
    fn operand_from_str() {
        assert_eq!("42".parse::<Operand>().unwrap(), Operand::Literal(42));
        assert_eq!("-7".parse::<Operand>().unwrap(), Operand::Literal(-7));
        assert_eq!("cx".parse::<Operand>().unwrap(), Operand::Register(Register::Cx));
    }

    #[test]
    fn operand_from_str_rejects_unknown_name() {
        let err = "ex".parse::<Operand>().unwrap_err();
        assert_eq!(err.operand, "ex");
        assert!(err.to_string().contains("ax, bx, cx, dx"));
    }

    #[test]
    fn condition_truth_table() {
        use Condition::*;
        let cases = [
            (Always, [true, true, true]),
            (Equal, [false, true, false]),
            (NotEqual, [true, false, true]),
            (Less, [true, false, false]),
            (LessOrEqual, [true, true, false]),
            (Greater, [false, false, true]),
            (GreaterOrEqual, [false, true, true]),
        ];
        for (cond, expected) in cases {
            let got = [
                cond.holds(Ordering::Less),
                cond.holds(Ordering::Equal),
                cond.holds(Ordering::Greater),
            ];
            assert_eq!(got, expected, "{cond:?}");
        }
    }

    #[test]
    fn mnemonic_lookup() {
        for cond in Condition::ALL {
            assert_eq!(Condition::from_mnemonic(cond.mnemonic()), Some(cond));
        }
        assert_eq!(Condition::from_mnemonic("jz"), None);
    }

    #[test]
    fn instruction_display_elides_default_step() {
        let inc = Instruction::Increment { dst: Register::Ax, by: Operand::Literal(1) };
        assert_eq!(inc.to_string(), "inc ax");
        let dec = Instruction::Decrement { dst: Register::Bx, by: Operand::Register(Register::Cx) };
        assert_eq!(dec.to_string(), "dec bx, cx");
        let jmp = Instruction::Jump { condition: Condition::LessOrEqual, target: "top".into() };
        assert_eq!(jmp.to_string(), "jle top");
    }

    #[test]
    fn program_json_shape() {
        let program = Program::compile(|b| {
            b.label("start").assign(Register::Ax, 3).jump_if_not_equal("start");
        });
        let json = serde_json::to_value(&program).unwrap();
        assert_eq!(json["instructions"][0]["assign"]["dst"], "ax");
        assert_eq!(json["instructions"][0]["assign"]["src"], 3);
        assert_eq!(json["instructions"][1]["jump"]["condition"], "not_equal");
        assert_eq!(json["instructions"][1]["jump"]["target"], "start");
        assert_eq!(json["labels"]["start"], 0);

        let back: Program = serde_json::from_value(json).unwrap();
        assert_eq!(back, program);
    }

    #[test]
    fn program_json_rejects_unknown_register() {
        let json = r#"{"instructions":[{"assign":{"dst":"ax","src":"ex"}}],"labels":{}}"#;
        let err = serde_json::from_str::<Program>(json).unwrap_err();
        assert!(err.to_string().contains("invalid operand 'ex'"), "{err}");
    }

    #[test]
    fn label_name_grammar() {
        for ok in ["loop", "_start", ".done", "l2", "AX", "jmpx", "Mov"] {
            assert!(is_label_name(ok), "{ok} should be a label name");
        }
        for bad in ["", "ax", "dx", "mov", "jmp", "jge", "2nd", "two words", "x:\n    mov ax, 99\ny"] {
            assert!(!is_label_name(bad), "{bad:?} should not be a label name");
        }
    }

    #[test]
    fn check_names_covers_labels_and_jump_targets() {
        let program = Program::compile(|b| {
            b.label("ok").increment(Register::Ax).jump("bad name");
        });
        assert_eq!(program.check_names(), Err(InvalidLabel { name: "bad name".into() }));

        let program = Program::compile(|b| {
            b.label("cx").increment(Register::Ax);
        });
        assert_eq!(program.check_names(), Err(InvalidLabel { name: "cx".into() }));
    }

    #[test]
    fn program_json_rejects_unreadable_label() {
        let json = r#"{"instructions":[{"assign":{"dst":"bx","src":1}}],"labels":{"x:\n    mov ax, 99\ny":0}}"#;
        let err = serde_json::from_str::<Program>(json).unwrap_err();
        assert!(err.to_string().contains("invalid label name"), "got: {err}");

        let json = r#"{"instructions":[{"jump":{"condition":"always","target":"jmp"}}],"labels":{}}"#;
        assert!(serde_json::from_str::<Program>(json).is_err());
    }

    #[test]
    fn labels_at_index() {
        let program = Program::compile(|b| {
            b.label("a").label("b").increment(Register::Ax).label("end");
        });
        assert_eq!(program.labels_at(0).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(program.labels_at(1).collect::<Vec<_>>(), vec!["end"]);
    }

    #[test]
    fn span_merge() {
        let a = Span { start: 4, end: 6 };
        let b = Span { start: 1, end: 5 };
        assert_eq!(a.merge(b), Span { start: 1, end: 6 });
    }
}
