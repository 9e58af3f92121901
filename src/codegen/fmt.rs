use crate::ast::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FmtMode {
    /// One line per instruction, labels prefixed on the same line.
    Dense,
    /// Labels on their own line, instructions indented.
    Expanded,
}

const INDENT: &str = "    ";

/// Print a program as assembly text that parses back to the same program.
///
/// Labels bound past the last instruction are printed after it, so a label
/// table entry beyond `len` comes back bound to `len`. Fails if a label or
/// jump target is not an identifier the lexer would read back as one.
pub fn format(program: &Program, mode: FmtMode) -> Result<String, InvalidLabel> {
    program.check_names()?;
    let mut out = String::new();
    for (index, inst) in program.instructions.iter().enumerate() {
        let labels: Vec<&str> = program.labels_at(index).collect();
        match mode {
            FmtMode::Dense => {
                for label in labels {
                    out.push_str(label);
                    out.push_str(": ");
                }
            }
            FmtMode::Expanded => {
                for label in labels {
                    out.push_str(label);
                    out.push_str(":\n");
                }
                out.push_str(INDENT);
            }
        }
        out.push_str(&inst.to_string());
        out.push('\n');
    }

    let mut trailing: Vec<(&String, &usize)> =
        program.labels.iter().filter(|(_, at)| **at >= program.len()).collect();
    trailing.sort_by_key(|(_, at)| **at);
    for (name, _) in trailing {
        out.push_str(name);
        out.push_str(":\n");
    }
    Ok(out)
}
