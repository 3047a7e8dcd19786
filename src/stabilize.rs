//! Keeps every language change glued to the text it governs.
//!
//! Control markers between a language change and the following text would
//! otherwise be interpreted under the old voice.  The pass holds markers back
//! until the next text; language changes seen meanwhile jump ahead of them,
//! keeping their own relative order.  Running the pass twice gives the same
//! sequence as running it once.

use crate::instruction::Instruction;

pub fn stabilize(seq: Vec<Instruction>) -> Vec<Instruction> {
    let mut stable = Vec::with_capacity(seq.len());
    let mut languages: Vec<Instruction> = Vec::new();
    let mut pending: Vec<Instruction> = Vec::new();

    for instruction in seq {
        match instruction {
            Instruction::LanguageChange(_) => languages.push(instruction),
            Instruction::Text(_) => {
                stable.append(&mut languages);
                stable.append(&mut pending);
                stable.push(instruction);
            }
            other => pending.push(other),
        }
    }
    stable.append(&mut languages);
    stable.append(&mut pending);
    stable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::ProsodyValue;

    #[test]
    fn test_language_change_hoisted_over_markers() {
        let seq = vec![
            Instruction::text("a"),
            Instruction::IndexMark(1),
            Instruction::Pitch(ProsodyValue::Multiplier(1.2)),
            Instruction::lang("fr"),
            Instruction::text("b"),
        ];
        assert_eq!(
            stabilize(seq),
            vec![
                Instruction::text("a"),
                Instruction::lang("fr"),
                Instruction::IndexMark(1),
                Instruction::Pitch(ProsodyValue::Multiplier(1.2)),
                Instruction::text("b"),
            ]
        );
    }

    #[test]
    fn test_language_changes_keep_order() {
        let seq = vec![
            Instruction::IndexMark(1),
            Instruction::lang("fr"),
            Instruction::IndexMark(2),
            Instruction::lang("de"),
            Instruction::text("x"),
        ];
        assert_eq!(
            stabilize(seq),
            vec![
                Instruction::lang("fr"),
                Instruction::lang("de"),
                Instruction::IndexMark(1),
                Instruction::IndexMark(2),
                Instruction::text("x"),
            ]
        );
    }

    #[test]
    fn test_trailing_markers_kept() {
        let seq = vec![Instruction::text("a"), Instruction::IndexMark(9)];
        assert_eq!(stabilize(seq.clone()), seq);
    }

    #[test]
    fn test_idempotent() {
        let seq = vec![
            Instruction::IndexMark(1),
            Instruction::CharacterMode(true),
            Instruction::lang("de"),
            Instruction::text("x"),
            Instruction::Break(10),
            Instruction::IndexMark(2),
            Instruction::LanguageChange(None),
            Instruction::Split,
            Instruction::lang("ja"),
            Instruction::text("y"),
            Instruction::IndexMark(3),
            Instruction::lang("ko"),
        ];
        let once = stabilize(seq);
        let twice = stabilize(once.clone());
        assert_eq!(once, twice);
    }
}
