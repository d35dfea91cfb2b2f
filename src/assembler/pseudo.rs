//! Pseudo-instruction expansion.

use super::AssembleError;

/// Expands a (possibly pseudo) mnemonic into one or more real
/// mnemonic/argument pairs.
pub fn expand(
    mnemonic: &str,
    args: &[String],
    line: usize,
    text: &str,
) -> Result<Vec<(String, Vec<String>)>, AssembleError> {
    let real = |m: &str, a: Vec<String>| vec![(m.to_string(), a)];

    Ok(match mnemonic {
        "nop" => real("addi", vec!["x0".into(), "x0".into(), "0".into()]),
        "mv" => {
            check(args, 2, line, text)?;
            real("addi", vec![args[0].clone(), args[1].clone(), "0".into()])
        }
        "j" => {
            check(args, 1, line, text)?;
            real("jal", vec!["x0".into(), args[0].clone()])
        }
        "ret" => real("jalr", vec!["x0".into(), "ra".into(), "0".into()]),
        "li" => {
            check(args, 2, line, text)?;
            let rd = args[0].clone();
            let value = super::parse_imm(&args[1], line, text)?;
            let lo = ((value + 0x800) & 0xfff) - 0x800;
            let hi = value - lo;
            let mut seq = Vec::new();
            if hi != 0 {
                seq.push(("lui".to_string(), vec![rd.clone(), (hi >> 12).to_string()]));
                seq.push(("addi".to_string(), vec![rd.clone(), rd.clone(), lo.to_string()]));
            } else {
                seq.push(("addi".to_string(), vec![rd.clone(), "x0".to_string(), lo.to_string()]));
            }
            seq
        }
        other => real(other, args.to_vec()),
    })
}

fn check(args: &[String], n: usize, line: usize, text: &str) -> Result<(), AssembleError> {
    if args.len() != n {
        return Err(AssembleError::WrongOperandCount { line, expected: n, got: args.len(), text: text.to_string() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn li_splits_into_lui_addi_when_hi_nonzero() {
        let expanded = expand("li", &["t0".into(), "0x12345678".into()], 1, "li t0, 0x12345678").unwrap();
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0].0, "lui");
        assert_eq!(expanded[1].0, "addi");
    }

    #[test]
    fn li_emits_single_addi_for_small_values() {
        let expanded = expand("li", &["t0".into(), "5".into()], 1, "li t0, 5").unwrap();
        assert_eq!(expanded, vec![("addi".to_string(), vec!["t0".into(), "x0".into(), "5".into()])]);
    }

    #[test]
    fn nop_is_addi_zero() {
        let expanded = expand("nop", &[], 1, "nop").unwrap();
        assert_eq!(expanded, vec![("addi".to_string(), vec!["x0".into(), "x0".into(), "0".into()])]);
    }

    #[test]
    fn j_is_jal_x0() {
        let expanded = expand("j", &["target".into()], 1, "j target").unwrap();
        assert_eq!(expanded, vec![("jal".to_string(), vec!["x0".into(), "target".into()])]);
    }
}
