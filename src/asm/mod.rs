mod errors;
mod program;
mod pseudo;
mod utils;

use half::f16;
use log::debug;

use crate::arch::{DATA_START, RA};
use crate::encoder::encode;
use crate::instruction::{AluOp, BranchOp, Instruction};

pub use errors::AsmError;
pub use program::Program;

use pseudo::expand;
use utils::*;

// ---------- API ----------

/// Assembles `text` into instruction words. Any `.data` section is dropped;
/// use [`assemble_program`] to keep it.
pub fn assemble(text: &str) -> Result<Vec<u32>, AsmError> {
    Ok(assemble_program(text)?.text)
}

pub fn assemble_program(text: &str) -> Result<Program, AsmError> {
    let lines = preprocess(text);
    let pass1 = build_label_map(&lines)?;
    let words = encode_all(&pass1.items, &pass1.labels)?;
    Ok(Program {
        text: words,
        data: pass1.data,
        data_base: DATA_START,
    })
}

// ---------- Internals ----------

/// One real instruction at its final byte address.
#[derive(Debug, Clone)]
struct Item {
    pc: u32,
    line: usize,
    text: String,
}

struct Pass1 {
    items: Vec<Item>,
    labels: LabelMap,
    data: Vec<u8>,
}

enum Section {
    Text,
    Data,
}

/// Pass 1: expands pseudo-instructions so every item sits at a known byte
/// address, and records every label's address.
fn build_label_map(lines: &[(usize, String)]) -> Result<Pass1, AsmError> {
    let mut section = Section::Text;
    let mut pc_text = 0u32;
    let mut items = Vec::new();
    let mut labels = LabelMap::new();
    let mut data = Vec::<u8>::new();

    for (line_no, raw) in lines {
        let line_no = *line_no;
        match raw.as_str() {
            ".text" | ".section .text" => {
                section = Section::Text;
                continue;
            }
            ".data" | ".section .data" => {
                section = Section::Data;
                continue;
            }
            _ => {}
        }

        let mut line = raw.as_str();
        if let Some((lab, rest)) = line.split_once(':') {
            let lab = lab.trim();
            if !is_label_name(lab) {
                return Err(AsmError::new(line_no, format!("invalid label: {lab}")));
            }
            let addr = match section {
                Section::Text => pc_text,
                Section::Data => DATA_START + data.len() as u32,
            };
            if labels.insert(lab.to_string(), addr).is_some() {
                return Err(AsmError::new(line_no, format!("duplicate label: {lab}")));
            }
            debug!("label {lab} = 0x{addr:08x}");
            line = rest.trim();
            if line.is_empty() {
                continue;
            }
        }

        match section {
            Section::Text => {
                if line.starts_with('.') {
                    return Err(AsmError::new(line_no, format!("unknown text directive: {line}")));
                }
                for text in expand(line).map_err(|e| AsmError::new(line_no, e))? {
                    items.push(Item { pc: pc_text, line: line_no, text });
                    pc_text = pc_text.wrapping_add(4);
                }
            }
            Section::Data => data_directive(line, &mut data).map_err(|e| AsmError::new(line_no, e))?,
        }
    }

    if !data.is_empty() {
        if let Some(item) = items.iter().find(|i| i.pc >= DATA_START) {
            return Err(AsmError::new(
                item.line,
                format!("code overflows into data region at 0x{DATA_START:x}"),
            ));
        }
    }

    Ok(Pass1 { items, labels, data })
}

fn data_directive(line: &str, data: &mut Vec<u8>) -> Result<(), String> {
    let (directive, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let values = split_operands(rest);
    let int = |v: &String| parse_imm(v).ok_or_else(|| format!("invalid {directive}: {v}"));
    match directive {
        ".word" => {
            for v in &values {
                let n = int(v)?;
                if !(i32::MIN as i64..=u32::MAX as i64).contains(&n) {
                    return Err(format!(".word outside 32 bits: {n}"));
                }
                data.extend_from_slice(&(n as u32).to_le_bytes());
            }
        }
        ".half" => {
            for v in &values {
                let n = int(v)?;
                if !(i16::MIN as i64..=u16::MAX as i64).contains(&n) {
                    return Err(format!(".half outside 16 bits: {n}"));
                }
                data.extend_from_slice(&(n as u16).to_le_bytes());
            }
        }
        ".f16" => {
            for v in &values {
                let x: f32 = v.parse().map_err(|_| format!("invalid .f16: {v}"))?;
                data.extend_from_slice(&f16::from_f32(x).to_le_bytes());
            }
        }
        ".space" | ".zero" => {
            let n = int(&rest.trim().to_string())?;
            if n < 0 {
                return Err(format!("size must be positive: {n}"));
            }
            data.resize(data.len() + n as usize, 0);
        }
        ".align" => {
            let n = int(&rest.trim().to_string())?;
            if n <= 0 || n & (n - 1) != 0 {
                return Err(format!("alignment must be a power of two: {n}"));
            }
            let n = n as usize;
            data.resize(data.len().div_ceil(n) * n, 0);
        }
        _ => return Err(format!("unknown data directive: {line}")),
    }
    Ok(())
}

/// Pass 2: encodes every item against the finished label map.
fn encode_all(items: &[Item], labels: &LabelMap) -> Result<Vec<u32>, AsmError> {
    items
        .iter()
        .map(|item| {
            let inst = parse_instr(&item.text, item.pc, labels)
                .map_err(|e| AsmError::new(item.line, e))?;
            encode(inst).map_err(|e| AsmError::new(item.line, e.to_string()))
        })
        .collect()
}

fn parse_instr(s: &str, pc: u32, labels: &LabelMap) -> Result<Instruction, String> {
    let (mnemonic, ops) = split_instr(s);
    let m = mnemonic.as_str();

    use Instruction::*;

    if let Ok(op) = m.parse::<AluOp>() {
        expect_ops(&ops, 3, "rd, rs1, rs2")?;
        return Ok(RType { rd: reg(&ops[0])?, rs1: reg(&ops[1])?, rs2: reg(&ops[2])?, op });
    }
    if let Some(op) = imm_op(m) {
        expect_ops(&ops, 3, "rd, rs1, imm")?;
        let rd = reg(&ops[0])?;
        let rs1 = reg(&ops[1])?;
        let imm = match op {
            AluOp::Sll | AluOp::Srl | AluOp::Sra => parse_shamt(&ops[2])?,
            _ => check_signed(resolve_imm(&ops[2], labels)?, 12, m)?,
        };
        return Ok(IType { rd, rs1, imm, op });
    }
    if let Ok(cond) = m.parse::<BranchOp>() {
        expect_ops(&ops, 3, "rs1, rs2, label/imm")?;
        return Ok(BType {
            rs1: reg(&ops[0])?,
            rs2: reg(&ops[1])?,
            imm: branch_imm(&ops[2], pc, labels, 13, m)?,
            cond,
        });
    }

    match m {
        // ---------- Memory: imm(rs1), or the reference three-operand form ----------
        "lw" | "ld" => {
            let (rd, rs1, imm) = match ops.len() {
                2 => {
                    let (imm, rs1) = parse_memop(&ops[1], labels)?;
                    (reg(&ops[0])?, rs1, imm)
                }
                3 => (reg(&ops[0])?, reg(&ops[1])?, resolve_imm(&ops[2], labels)?),
                _ => return Err(format!("{m}: expected 'rd, imm(rs1)'")),
            };
            Ok(Load { rd, rs1, imm: check_signed(imm, 12, m)? })
        }
        // `sw rs2, imm(rs1)` | `st rs1, rs2, imm` (base first)
        "sw" | "st" => {
            let (rs1, rs2, imm) = match ops.len() {
                2 => {
                    let (imm, rs1) = parse_memop(&ops[1], labels)?;
                    (rs1, reg(&ops[0])?, imm)
                }
                3 => (reg(&ops[0])?, reg(&ops[1])?, resolve_imm(&ops[2], labels)?),
                _ => return Err(format!("{m}: expected 'rs2, imm(rs1)'")),
            };
            Ok(SType { rs1, rs2, imm: check_signed(imm, 12, m)? })
        }

        // ---------- U/J ----------
        "lui" => {
            expect_ops(&ops, 2, "rd, imm")?;
            Ok(UType { rd: reg(&ops[0])?, imm: check_u_imm(resolve_imm(&ops[1], labels)?, m)? })
        }
        // jal: "jal rd, label" or "jal label" (rd = ra)
        "jal" => match ops.len() {
            1 => Ok(JType { rd: RA, imm: branch_imm(&ops[0], pc, labels, 21, m)? }),
            2 => Ok(JType { rd: reg(&ops[0])?, imm: branch_imm(&ops[1], pc, labels, 21, m)? }),
            _ => Err("jal: expected 'rd, label'".into()),
        },
        // jalr rd, rs1, imm  |  jalr rd, imm(rs1)
        "jalr" => match ops.len() {
            2 => {
                let (imm, rs1) = parse_memop(&ops[1], labels)?;
                Ok(JalrType { rd: reg(&ops[0])?, rs1, imm: check_signed(imm, 12, m)? })
            }
            3 => Ok(JalrType {
                rd: reg(&ops[0])?,
                rs1: reg(&ops[1])?,
                imm: check_signed(resolve_imm(&ops[2], labels)?, 12, m)?,
            }),
            _ => Err("jalr: expected 'rd, rs1, imm'".into()),
        },

        // ---------- Matrix ----------
        "gemm" => {
            expect_ops(&ops, 4, "md, ma, mb, mc")?;
            Ok(MatrixAlu {
                rd: mreg(&ops[0])?,
                ra: mreg(&ops[1])?,
                rb: mreg(&ops[2])?,
                rc: mreg(&ops[3])?,
            })
        }
        "ld.m" | "st.m" => {
            expect_ops(&ops, 3, "md, xstride, imm(xbase)")?;
            let (imm, rs1) = parse_memop(&ops[2], labels)?;
            Ok(MatrixMem {
                rd: mreg(&ops[0])?,
                rs1,
                stride: reg(&ops[1])?,
                imm: check_signed(imm, 11, m)?,
                is_load: m == "ld.m",
            })
        }

        "halt" => {
            expect_ops(&ops, 0, "halt")?;
            Ok(Halt)
        }

        _ => Err(format!("unsupported mnemonic: {mnemonic}")),
    }
}

/// ALU op of a register-immediate mnemonic (`addi`, `sltiu`, ...).
fn imm_op(m: &str) -> Option<AluOp> {
    let op = match m {
        "sltiu" | "sltui" => AluOp::Sltu,
        _ => m.strip_suffix('i')?.parse::<AluOp>().ok()?,
    };
    crate::arch::i_funct(op).map(|_| op)
}
