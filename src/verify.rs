use crate::ast::*;

/// A jump that would fail with an unknown label if it were ever taken.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("instruction {index}: jump to undefined label '{label}'")]
pub struct VerifyError {
    pub code: &'static str,
    /// Instruction index of the offending jump.
    pub index: usize,
    pub label: String,
    pub hint: Option<String>,
}

fn closest_match<'a>(name: &str, candidates: impl Iterator<Item = &'a String>) -> Option<String> {
    let mut best: Option<(String, usize)> = None;
    for candidate in candidates {
        let dist = levenshtein(name, candidate);
        if dist <= 2 && best.as_ref().is_none_or(|(_, d)| dist < *d) {
            best = Some((candidate.clone(), dist));
        }
    }
    best.map(|(s, _)| s)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for i in 1..=a.len() {
        cur[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            cur[j] = (prev[j] + 1).min(cur[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Checks every label a jump names against the label table.
///
/// Jumps are only resolved when taken, so a program that fails here may still
/// run to completion; this is for catching typos before that happens.
pub fn verify(program: &Program) -> Result<(), Vec<VerifyError>> {
    let errors: Vec<VerifyError> = program
        .instructions
        .iter()
        .enumerate()
        .filter_map(|(index, inst)| match inst {
            Instruction::Jump { target: JumpTarget::Label(label), .. }
                if !program.labels.contains_key(label) =>
            {
                Some(VerifyError {
                    code: "QA-V001",
                    index,
                    label: label.clone(),
                    hint: closest_match(label, program.labels.keys())
                        .map(|s| format!("did you mean '{s}'?")),
                })
            }
            _ => None,
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        tracing::debug!(count = errors.len(), "verification failed");
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_and_verify(code: &str) -> Result<(), Vec<VerifyError>> {
        let parsed = crate::parser::parse_source(code).expect("parse failed");
        verify(&parsed.program)
    }

    #[test]
    fn valid_forward_and_backward_jumps() {
        assert!(parse_and_verify("top: inc ax\ncmp ax, 3\njl top\njmp end\nmov bx, 1\nend:").is_ok());
    }

    #[test]
    fn raw_indices_are_not_checked() {
        assert!(parse_and_verify("jmp 99").is_ok());
    }

    #[test]
    fn undefined_label_reported_with_index() {
        let errors = parse_and_verify("mov ax, 1\njne missing").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].index, 1);
        assert_eq!(errors[0].label, "missing");
        assert_eq!(errors[0].code, "QA-V001");
        assert!(errors[0].hint.is_none());
    }

    #[test]
    fn typo_gets_suggestion() {
        let errors = parse_and_verify("loop: inc ax\njmp lop").unwrap_err();
        assert_eq!(errors[0].hint.as_deref(), Some("did you mean 'loop'?"));
    }

    #[test]
    fn every_bad_jump_reported() {
        let errors = parse_and_verify("jmp a\nje b\njmp c\nc:").unwrap_err();
        let labels: Vec<&str> = errors.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b"]);
    }

    #[test]
    fn levenshtein_distances() {
        assert_eq!(levenshtein("loop", "loop"), 0);
        assert_eq!(levenshtein("lop", "loop"), 1);
        assert_eq!(levenshtein("", "end"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }
}
