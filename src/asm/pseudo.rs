use crate::bits::fits_signed;

use super::utils::{expect_ops, hi, lo, parse_imm, split_instr};

/// Rewrites `line` into real instructions, expanding pseudo-instructions
/// recursively. Real instructions come back unchanged.
pub(crate) fn expand(line: &str) -> Result<Vec<String>, String> {
    let (mnemonic, ops) = split_instr(line);
    let direct: Vec<String> = match mnemonic.as_str() {
        "li" => {
            expect_ops(&ops, 2, "rd, imm")?;
            expand_li(&ops[0], &ops[1])?
        }
        "la" => {
            expect_ops(&ops, 2, "rd, label")?;
            let (rd, sym) = (&ops[0], &ops[1]);
            vec![format!("lui {rd}, %hi({sym})"), format!("addi {rd}, {rd}, %lo({sym})")]
        }
        "push" => {
            expect_ops(&ops, 1, "rs")?;
            vec!["addi sp, sp, -4".into(), format!("sw {}, 0(sp)", ops[0])]
        }
        "pop" => {
            expect_ops(&ops, 1, "rd")?;
            vec![format!("lw {}, 0(sp)", ops[0]), "addi sp, sp, 4".into()]
        }
        "nop" => {
            expect_ops(&ops, 0, "nop")?;
            vec!["addi x0, x0, 0".into()]
        }
        // `mov rd, rs1, rs2` is the reference R-type spelling of `add`
        "mov" | "mv" => match ops.len() {
            2 => vec![format!("add {}, {}, x0", ops[0], ops[1])],
            3 if mnemonic == "mov" => vec![format!("add {}, {}, {}", ops[0], ops[1], ops[2])],
            _ => return Err(format!("{mnemonic}: expected 'rd, rs'")),
        },
        "j" => {
            expect_ops(&ops, 1, "label")?;
            vec![format!("jal x0, {}", ops[0])]
        }
        "call" => {
            expect_ops(&ops, 1, "label")?;
            vec![format!("jal ra, {}", ops[0])]
        }
        "ret" => {
            expect_ops(&ops, 0, "ret")?;
            vec!["jalr x0, ra, 0".into()]
        }
        "jr" => {
            expect_ops(&ops, 1, "rs")?;
            vec![format!("jalr x0, {}, 0", ops[0])]
        }
        "beqz" | "bnez" => {
            expect_ops(&ops, 2, "rs, label")?;
            vec![format!("{} {}, x0, {}", &mnemonic[..3], ops[0], ops[1])]
        }
        "bgt" | "ble" => {
            expect_ops(&ops, 3, "rs, rt, label")?;
            let real = if mnemonic == "bgt" { "blt" } else { "bge" };
            vec![format!("{real} {}, {}, {}", ops[1], ops[0], ops[2])]
        }
        _ => return Ok(vec![line.trim().to_string()]),
    };

    let mut out = Vec::with_capacity(direct.len());
    for l in &direct {
        out.extend(expand(l)?);
    }
    Ok(out)
}

/// One `addi` when the value fits 12 signed bits, else `lui` + `addi`
/// with the upper part rounded to the nearest 4 KiB.
fn expand_li(rd: &str, imm_s: &str) -> Result<Vec<String>, String> {
    let imm = parse_imm(imm_s).ok_or_else(|| format!("invalid immediate: {imm_s}"))?;
    if !(i32::MIN as i64..=u32::MAX as i64).contains(&imm) {
        return Err(format!("li: immediate {imm} does not fit in 32 bits"));
    }
    let imm = imm as u32 as i32 as i64;
    if fits_signed(imm, 12) {
        return Ok(vec![format!("addi {rd}, x0, {imm}")]);
    }
    Ok(vec![
        format!("lui {rd}, {}", hi(imm)),
        format!("addi {rd}, {rd}, {}", lo(imm)),
    ])
}
