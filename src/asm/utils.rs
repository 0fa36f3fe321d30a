use std::collections::HashMap;

use crate::arch::MATRIX_REGS;
use crate::bits::{fits_signed, sext};

pub(crate) type LabelMap = HashMap<String, u32>;

static REG_ALIASES: [(&str, u8); 33] = [
    ("zero", 0), ("ra", 1), ("sp", 2), ("gp", 3), ("tp", 4),
    ("t0", 5), ("t1", 6), ("t2", 7),
    ("s0", 8), ("fp", 8), ("s1", 9),
    ("a0", 10), ("a1", 11), ("a2", 12), ("a3", 13),
    ("a4", 14), ("a5", 15), ("a6", 16), ("a7", 17),
    ("s2", 18), ("s3", 19), ("s4", 20), ("s5", 21), ("s6", 22),
    ("s7", 23), ("s8", 24), ("s9", 25), ("s10", 26), ("s11", 27),
    ("t3", 28), ("t4", 29), ("t5", 30), ("t6", 31),
];

/// Numbered source lines with comments stripped; blank lines dropped. Line numbers are 1-based.
pub(crate) fn preprocess(text: &str) -> Vec<(usize, String)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| {
            let l = l.split("//").next().unwrap_or(l);
            let l = l.split('#').next().unwrap_or(l);
            (i + 1, l.trim().to_string())
        })
        .filter(|(_, l)| !l.is_empty())
        .collect()
}

pub(crate) fn split_operands(rest: &str) -> Vec<String> {
    rest.split(',')
        .map(|t| t.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Lowercased mnemonic and its operands. The `.i` suffix of the reference
/// syntax (`add.i`, `beq.i`) and `gemm.m` are folded into the plain names.
pub(crate) fn split_instr(s: &str) -> (String, Vec<String>) {
    let s = s.trim();
    let (head, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
    let mut mnemonic = head.to_lowercase();
    if let Some(base) = mnemonic.strip_suffix(".i") {
        mnemonic = base.to_string();
    } else if mnemonic == "gemm.m" {
        mnemonic = "gemm".into();
    }
    (mnemonic, split_operands(rest))
}

pub(crate) fn expect_ops(ops: &[String], n: usize, usage: &str) -> Result<(), String> {
    if ops.len() == n {
        Ok(())
    } else {
        Err(format!("expected '{usage}'"))
    }
}

pub(crate) fn parse_reg(s: &str) -> Option<u8> {
    let s = s.trim().to_lowercase();
    if let Some(num) = s.strip_prefix('x').and_then(|n| n.parse::<u8>().ok()) {
        return (num < 32).then_some(num);
    }
    REG_ALIASES.iter().find(|(name, _)| *name == s).map(|&(_, r)| r)
}

pub(crate) fn parse_mreg(s: &str) -> Option<u8> {
    let s = s.trim().to_lowercase();
    s.strip_prefix('m')
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|&n| (n as usize) < MATRIX_REGS)
}

pub(crate) fn reg(s: &str) -> Result<u8, String> {
    parse_reg(s).ok_or_else(|| format!("invalid register: {s}"))
}

pub(crate) fn mreg(s: &str) -> Result<u8, String> {
    parse_mreg(s).ok_or_else(|| format!("invalid matrix register: {s}"))
}

/// Integer literal with optional sign and `0x`/`0o`/`0b` prefix.
pub(crate) fn parse_imm(s: &str) -> Option<i64> {
    let s = s.trim();
    let (neg, body) = match s.strip_prefix('-') {
        Some(b) => (true, b),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let lower = body.to_lowercase();
    let v = if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()?
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()?
    } else if lower.starts_with(|c: char| c.is_ascii_digit()) {
        lower.parse::<i64>().ok()?
    } else {
        return None;
    };
    Some(if neg { -v } else { v })
}

pub(crate) fn is_label_name(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '.')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn lookup(labels: &LabelMap, name: &str) -> Result<u32, String> {
    labels
        .get(name.trim())
        .copied()
        .ok_or_else(|| format!("label not found: {}", name.trim()))
}

/// Upper 20 bits of `addr`, rounded so that adding `lo(addr)` restores it.
pub(crate) fn hi(addr: i64) -> i64 {
    ((addr + 0x800) >> 12) & 0xFFFFF
}

pub(crate) fn lo(addr: i64) -> i64 {
    sext((addr & 0xFFF) as u32, 12) as i64
}

fn reloc<'t>(tok: &'t str, prefix: &str) -> Option<&'t str> {
    tok.strip_prefix(prefix).and_then(|r| r.strip_suffix(')'))
}

/// Immediate operand: literal, `%hi(label)`, `%lo(label)`, or a bare label address.
pub(crate) fn resolve_imm(tok: &str, labels: &LabelMap) -> Result<i64, String> {
    let tok = tok.trim();
    if let Some(v) = parse_imm(tok) {
        return Ok(v);
    }
    if let Some(sym) = reloc(tok, "%hi(") {
        return Ok(hi(lookup(labels, sym)? as i64));
    }
    if let Some(sym) = reloc(tok, "%lo(") {
        return Ok(lo(lookup(labels, sym)? as i64));
    }
    if is_label_name(tok) {
        return lookup(labels, tok).map(|a| a as i64);
    }
    Err(format!("invalid immediate: {tok}"))
}

pub(crate) fn check_signed(imm: i64, bits: u32, ctx: &str) -> Result<i32, String> {
    if fits_signed(imm, bits) {
        Ok(imm as i32)
    } else {
        let max = (1i64 << (bits - 1)) - 1;
        let min = -(1i64 << (bits - 1));
        Err(format!(
            "{ctx}: immediate {imm} out of {bits}-bit signed range ({min}..{max})"
        ))
    }
}

/// `lui` operand: the 20-bit upper value, signed or unsigned spelling.
pub(crate) fn check_u_imm(imm: i64, ctx: &str) -> Result<u32, String> {
    if (-(1i64 << 19)..(1i64 << 20)).contains(&imm) {
        Ok((imm & 0xFFFFF) as u32)
    } else {
        Err(format!("{ctx}: immediate {imm} out of 20-bit range"))
    }
}

pub(crate) fn parse_shamt(s: &str) -> Result<i32, String> {
    let v = parse_imm(s).ok_or_else(|| format!("invalid shamt: {s}"))?;
    if (0..=31).contains(&v) {
        Ok(v as i32)
    } else {
        Err(format!("shamt out of range: {v}"))
    }
}

/// Branch/jump target: a literal byte offset or a label, relative to `pc`.
pub(crate) fn branch_imm(
    tok: &str,
    pc: u32,
    labels: &LabelMap,
    bits: u32,
    ctx: &str,
) -> Result<i32, String> {
    let imm = match parse_imm(tok) {
        Some(v) => v,
        None => lookup(labels, tok)? as i64 - pc as i64,
    };
    if imm % 2 != 0 {
        return Err(format!("{ctx}: offset {imm} must be even"));
    }
    check_signed(imm, bits, ctx)
}

/// `imm(reg)`, or the reference `(imm)reg` spelling.
pub(crate) fn parse_memop(op: &str, labels: &LabelMap) -> Result<(i64, u8), String> {
    let op = op.trim();
    if let Some(rest) = op.strip_prefix('(') {
        let (imm_s, reg_s) = rest
            .split_once(')')
            .ok_or_else(|| format!("invalid mem operand: {op}"))?;
        if reg_s.trim().is_empty() {
            return Ok((0, reg(imm_s)?));
        }
        return Ok((resolve_imm(imm_s, labels)?, reg(reg_s)?));
    }
    let (imm_s, rest) = op
        .split_once('(')
        .ok_or_else(|| format!("invalid mem operand: {op}"))?;
    let rs1_s = rest.strip_suffix(')').ok_or("missing ')'")?;
    let imm = if imm_s.trim().is_empty() { 0 } else { resolve_imm(imm_s, labels)? };
    Ok((imm, reg(rs1_s)?))
}
