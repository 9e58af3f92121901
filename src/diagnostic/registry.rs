/// An entry in the error code registry.
pub struct ErrorEntry {
    pub code: &'static str,
    pub short: &'static str,  // one-line summary for `quadasm explain --list`
    pub long: &'static str,   // full explanation for `quadasm explain`
}

/// All stable error codes.
pub static REGISTRY: &[ErrorEntry] = &[
    // ── Lexer ────────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "QA-L001",
        short: "unexpected character",
        long: r#"## QA-L001: unexpected character

A character was found that is not part of the assembly syntax.

**Example:**

    inc ax # bump

Comments start with `;`, not `#`. Registers are written bare
(`ax`, not `%ax` or `$ax`).
"#,
    },
    ErrorEntry {
        code: "QA-L002",
        short: "integer literal out of range",
        long: r#"## QA-L002: integer literal out of range

Registers hold signed 64-bit integers, so literals must lie between
-9223372036854775808 and 9223372036854775807.
"#,
    },

    // ── Parser ───────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "QA-P001",
        short: "unknown mnemonic",
        long: r#"## QA-P001: unknown mnemonic

A line must start with a label declaration (`name:`) or one of the
mnemonics `mov`, `inc`, `dec`, `cmp`, `jmp`, `je`, `jne`, `jl`, `jle`,
`jg`, `jge`. Mnemonics are lowercase.

**Example:**

    MOV ax, 1    ; write `mov`
    loop         ; a label needs a trailing `:`
"#,
    },
    ErrorEntry {
        code: "QA-P002",
        short: "destination is not a register",
        long: r#"## QA-P002: destination is not a register

`mov`, `inc` and `dec` write their first operand, so it must be one of
`ax`, `bx`, `cx`, `dx`.

**Example:**

    mov 5, ax    ; write `mov ax, 5`
"#,
    },
    ErrorEntry {
        code: "QA-P003",
        short: "unexpected token",
        long: r#"## QA-P003: unexpected token

A token was found where a different one was expected. The message
names both. A missing comma between operands is the usual cause:

    cmp ax 5     ; write `cmp ax, 5`
"#,
    },
    ErrorEntry {
        code: "QA-P004",
        short: "unexpected end of line",
        long: r#"## QA-P004: unexpected end of line

The line ended before the instruction was complete.

    mov ax,      ; source operand missing
"#,
    },
    ErrorEntry {
        code: "QA-P005",
        short: "invalid operand",
        long: r#"## QA-P005: invalid operand

Operands are integer literals or one of the four registers `ax`, `bx`,
`cx`, `dx`. Any other name is rejected; labels can only be used as
jump targets.

    mov ax, ex   ; no register `ex`
"#,
    },
    ErrorEntry {
        code: "QA-P006",
        short: "invalid jump target",
        long: r#"## QA-P006: invalid jump target

A jump goes to a label name or to a non-negative instruction index.
Registers and negative numbers are not valid targets.

    jmp -1
    jmp ax
"#,
    },
    ErrorEntry {
        code: "QA-P007",
        short: "trailing tokens after instruction",
        long: r#"## QA-P007: trailing tokens after instruction

Each line holds at most one instruction. Anything after its last
operand, other than a `;` comment, is an error.

    inc ax, 1, 2
"#,
    },

    // ── Verification ─────────────────────────────────────────────────────────
    ErrorEntry {
        code: "QA-V001",
        short: "jump to undefined label",
        long: r#"## QA-V001: jump to undefined label

A jump names a label that is never declared. The program still runs
as long as that jump is never taken; if it is, the run fails with
QA-R001.
"#,
    },

    // ── Runtime ──────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "QA-R001",
        short: "unknown label",
        long: r#"## QA-R001: unknown label

A jump was taken to a label that the program never declares. Labels
are resolved when the jump executes, so forward references are fine,
but the name must be declared somewhere.

The run stops at the failing jump; no registers are reported.
"#,
    },
    ErrorEntry {
        code: "QA-R002",
        short: "invalid operand",
        long: r#"## QA-R002: invalid operand

An operand named something other than an integer literal or one of
`ax`, `bx`, `cx`, `dx`. Assembly source reports this as QA-P005 and
JSON input as QA-E001; QA-R002 is what library callers see when an
operand parsed from a string is turned into a machine error.
"#,
    },
    ErrorEntry {
        code: "QA-R003",
        short: "step limit exceeded",
        long: r#"## QA-R003: step limit exceeded

The run executed as many instructions as `--max-steps` allows without
falling off the end of the program. The machine does not detect
infinite loops on its own; the step limit is how to bound a run.
"#,
    },
    ErrorEntry {
        code: "QA-F001",
        short: "label cannot be written as assembly",
        long: r#"## QA-F001: label cannot be written as assembly

A label or jump target name is not an identifier that assembly text can
express: it must match `[A-Za-z_.][A-Za-z0-9_.]*` and must not be a
register (`ax`, `bx`, `cx`, `dx`) or a mnemonic (`mov`, `jmp`, ...).
Such names can only come from programs built in code; the formatter
refuses them instead of printing text that reads back differently.
"#,
    },
    ErrorEntry {
        code: "QA-E001",
        short: "cannot read input",
        long: r#"## QA-E001: cannot read input

The source file could not be read, or JSON input did not describe a
program (including label names that are not valid identifiers).
"#,
    },
];

/// Look up an error entry by code (e.g. `"QA-R001"`).
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    REGISTRY.iter().find(|e| e.code.eq_ignore_ascii_case(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_code() {
        let e = lookup("QA-R001").expect("QA-R001 should be in registry");
        assert_eq!(e.code, "QA-R001");
        assert!(!e.short.is_empty());
        assert!(e.long.contains("QA-R001"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("qa-p005").map(|e| e.code), Some("QA-P005"));
    }

    #[test]
    fn lookup_unknown_returns_none() {
        assert!(lookup("QA-XXXX").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn all_codes_unique() {
        let mut codes: Vec<&str> = REGISTRY.iter().map(|e| e.code).collect();
        codes.sort_unstable();
        let len_before = codes.len();
        codes.dedup();
        assert_eq!(codes.len(), len_before, "duplicate codes in registry");
    }

    #[test]
    fn every_long_text_names_its_code() {
        for entry in REGISTRY {
            assert!(entry.long.contains(entry.code), "{} long text missing its code", entry.code);
        }
    }
}
