//! Two-pass RV32I assembler.
//!
//! Pass 1 strips comments, expands pseudo-instructions, and records
//! label addresses. Pass 2 encodes each expanded instruction to its
//! 32-bit word, resolving label references to PC-relative
//! displacements.

mod pseudo;

use std::collections::HashMap;

use thiserror::Error;

use crate::encode::encode;
use crate::instr::{AluOp, BranchOp, Instruction, LoadOp, StoreOp};
use crate::registers;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssembleError {
    #[error("line {line}: unknown mnemonic {mnemonic:?} in {text:?}")]
    UnknownMnemonic { line: usize, mnemonic: String, text: String },
    #[error("line {line}: unknown register {name:?} in {text:?}")]
    UnknownRegister { line: usize, name: String, text: String },
    #[error("line {line}: malformed operand {operand:?} in {text:?}")]
    MalformedOperand { line: usize, operand: String, text: String },
    #[error("line {line}: undefined label {label:?} in {text:?}")]
    UndefinedLabel { line: usize, label: String, text: String },
    #[error("line {line}: expected {expected} operands, got {got} in {text:?}")]
    WrongOperandCount { line: usize, expected: usize, got: usize, text: String },
}

/// A single post-pseudo-expansion instruction, carried through both
/// passes together with the source line it originated from.
#[derive(Debug, Clone)]
struct Item {
    pc: u32,
    mnemonic: String,
    args: Vec<String>,
    line: usize,
    text: String,
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Splits a source line into an optional label and an optional
/// `(mnemonic, args)` pair.
fn split_line(line: &str) -> (Option<String>, Option<(String, Vec<String>)>) {
    let mut rest = line.trim();
    let mut label = None;
    if let Some(idx) = rest.find(':') {
        let (before, after) = rest.split_at(idx);
        label = Some(before.trim().to_string());
        rest = after[1..].trim();
    }
    if rest.is_empty() {
        return (label, None);
    }
    let mut parts = rest.splitn(2, char::is_whitespace);
    let mnemonic = parts.next().unwrap().to_lowercase();
    let args = match parts.next() {
        Some(rest_args) if !rest_args.trim().is_empty() => {
            rest_args.split(',').map(|a| a.trim().to_string()).collect()
        }
        _ => Vec::new(),
    };
    (label, Some((mnemonic, args)))
}

fn parse_imm(text: &str, line: usize, src: &str) -> Result<i64, AssembleError> {
    let text = text.trim();
    let (neg, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else if let Some(oct) = body.strip_prefix("0o").or_else(|| body.strip_prefix("0O")) {
        i64::from_str_radix(oct, 8)
    } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2)
    } else {
        body.parse::<i64>()
    }
    .map_err(|_| AssembleError::MalformedOperand {
        line,
        operand: text.to_string(),
        text: src.to_string(),
    })?;
    Ok(if neg { -value } else { value })
}

fn parse_reg(text: &str, line: usize, src: &str) -> Result<u8, AssembleError> {
    registers::resolve(text.trim()).ok_or_else(|| AssembleError::UnknownRegister {
        line,
        name: text.to_string(),
        text: src.to_string(),
    })
}

/// Parses an `offset(base)` memory operand.
fn parse_mem_operand(text: &str, line: usize, src: &str) -> Result<(i64, u8), AssembleError> {
    let text = text.trim();
    let open = text.find('(').ok_or_else(|| AssembleError::MalformedOperand {
        line,
        operand: text.to_string(),
        text: src.to_string(),
    })?;
    if !text.ends_with(')') {
        return Err(AssembleError::MalformedOperand { line, operand: text.to_string(), text: src.to_string() });
    }
    let offset = parse_imm(&text[..open], line, src)?;
    let base = parse_reg(&text[open + 1..text.len() - 1], line, src)?;
    Ok((offset, base))
}

fn require_args(args: &[String], n: usize, line: usize, src: &str) -> Result<(), AssembleError> {
    if args.len() != n {
        return Err(AssembleError::WrongOperandCount { line, expected: n, got: args.len(), text: src.to_string() });
    }
    Ok(())
}

/// Builds the [`Instruction`] for one expanded mnemonic/args pair.
fn build_instruction(
    item: &Item,
    labels: &HashMap<String, u32>,
) -> Result<Instruction, AssembleError> {
    let Item { pc, mnemonic, args, line, text } = item;
    let (line, text) = (*line, text.as_str());

    let resolve_target = |operand: &str| -> Result<i64, AssembleError> {
        if let Some(&addr) = labels.get(operand) {
            Ok(i64::from(addr) - i64::from(*pc))
        } else {
            parse_imm(operand, line, text)
        }
    };

    macro_rules! alu_op {
        ($op:expr) => {{
            require_args(args, 3, line, text)?;
            Instruction::Op {
                op: $op,
                rd: parse_reg(&args[0], line, text)?,
                rs1: parse_reg(&args[1], line, text)?,
                rs2: parse_reg(&args[2], line, text)?,
            }
        }};
    }

    macro_rules! alu_imm {
        ($op:expr) => {{
            require_args(args, 3, line, text)?;
            Instruction::OpImm {
                op: $op,
                rd: parse_reg(&args[0], line, text)?,
                rs1: parse_reg(&args[1], line, text)?,
                imm: parse_imm(&args[2], line, text)? as i32,
            }
        }};
    }

    macro_rules! branch {
        ($op:expr) => {{
            require_args(args, 3, line, text)?;
            Instruction::Branch {
                op: $op,
                rs1: parse_reg(&args[0], line, text)?,
                rs2: parse_reg(&args[1], line, text)?,
                imm: resolve_target(&args[2])? as i32,
            }
        }};
    }

    macro_rules! load {
        ($op:expr) => {{
            require_args(args, 2, line, text)?;
            let (offset, base) = parse_mem_operand(&args[1], line, text)?;
            Instruction::Load { op: $op, rd: parse_reg(&args[0], line, text)?, rs1: base, imm: offset as i32 }
        }};
    }

    macro_rules! store {
        ($op:expr) => {{
            require_args(args, 2, line, text)?;
            let (offset, base) = parse_mem_operand(&args[1], line, text)?;
            Instruction::Store { op: $op, rs1: base, rs2: parse_reg(&args[0], line, text)?, imm: offset as i32 }
        }};
    }

    Ok(match mnemonic.as_str() {
        "add" => alu_op!(AluOp::Add),
        "sub" => alu_op!(AluOp::Sub),
        "sll" => alu_op!(AluOp::Sll),
        "slt" => alu_op!(AluOp::Slt),
        "sltu" => alu_op!(AluOp::Sltu),
        "xor" => alu_op!(AluOp::Xor),
        "srl" => alu_op!(AluOp::Srl),
        "sra" => alu_op!(AluOp::Sra),
        "or" => alu_op!(AluOp::Or),
        "and" => alu_op!(AluOp::And),
        "addi" => alu_imm!(AluOp::Add),
        "slti" => alu_imm!(AluOp::Slt),
        "sltiu" => alu_imm!(AluOp::Sltu),
        "xori" => alu_imm!(AluOp::Xor),
        "ori" => alu_imm!(AluOp::Or),
        "andi" => alu_imm!(AluOp::And),
        "slli" => alu_imm!(AluOp::Sll),
        "srli" => alu_imm!(AluOp::Srl),
        "srai" => alu_imm!(AluOp::Sra),
        "lb" => load!(LoadOp::Lb),
        "lh" => load!(LoadOp::Lh),
        "lw" => load!(LoadOp::Lw),
        "lbu" => load!(LoadOp::Lbu),
        "lhu" => load!(LoadOp::Lhu),
        "sb" => store!(StoreOp::Sb),
        "sh" => store!(StoreOp::Sh),
        "sw" => store!(StoreOp::Sw),
        "beq" => branch!(BranchOp::Beq),
        "bne" => branch!(BranchOp::Bne),
        "blt" => branch!(BranchOp::Blt),
        "bge" => branch!(BranchOp::Bge),
        "bltu" => branch!(BranchOp::Bltu),
        "bgeu" => branch!(BranchOp::Bgeu),
        "jal" => {
            require_args(args, 2, line, text)?;
            Instruction::Jal { rd: parse_reg(&args[0], line, text)?, imm: resolve_target(&args[1])? as i32 }
        }
        "jalr" => {
            require_args(args, 3, line, text)?;
            Instruction::Jalr {
                rd: parse_reg(&args[0], line, text)?,
                rs1: parse_reg(&args[1], line, text)?,
                imm: parse_imm(&args[2], line, text)? as i32,
            }
        }
        "lui" => {
            require_args(args, 2, line, text)?;
            Instruction::Lui { rd: parse_reg(&args[0], line, text)?, imm: parse_imm(&args[1], line, text)? as u32 }
        }
        "auipc" => {
            require_args(args, 2, line, text)?;
            Instruction::Auipc { rd: parse_reg(&args[0], line, text)?, imm: parse_imm(&args[1], line, text)? as u32 }
        }
        "ecall" => Instruction::Ecall,
        "ebreak" => Instruction::Ebreak,
        ".word" => {
            require_args(args, 1, line, text)?;
            Instruction::Raw { word: parse_imm(&args[0], line, text)? as u32 }
        }
        other => {
            return Err(AssembleError::UnknownMnemonic {
                line,
                mnemonic: other.to_string(),
                text: text.to_string(),
            })
        }
    })
}

/// Assembles `source` into its sequence of 32-bit instruction words.
pub fn assemble(source: &str) -> Result<Vec<u32>, AssembleError> {
    let mut items = Vec::new();
    let mut labels = HashMap::new();
    let mut pc: u32 = 0;

    for (line_idx, raw_line) in source.lines().enumerate() {
        let line = line_idx + 1;
        let stripped = strip_comment(raw_line).trim();
        if stripped.is_empty() {
            continue;
        }
        let (label, op) = split_line(stripped);
        if let Some(label) = label {
            labels.insert(label, pc);
        }
        let Some((mnemonic, args)) = op else { continue };
        if matches!(mnemonic.as_str(), ".text" | ".globl" | ".global") {
            continue;
        }
        if mnemonic == ".word" {
            for operand in &args {
                items.push(Item {
                    pc,
                    mnemonic: ".word".to_string(),
                    args: vec![operand.clone()],
                    line,
                    text: stripped.to_string(),
                });
                pc = pc.wrapping_add(4);
            }
            continue;
        }
        for (exp_mnemonic, exp_args) in pseudo::expand(&mnemonic, &args, line, stripped)? {
            items.push(Item { pc, mnemonic: exp_mnemonic, args: exp_args, line, text: stripped.to_string() });
            pc = pc.wrapping_add(4);
        }
    }

    items.iter().map(|item| build_instruction(item, &labels).map(|instr| encode(&instr))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_addi() {
        let words = assemble("addi a0, zero, 42\n").unwrap();
        assert_eq!(words.len(), 1);
    }

    #[test]
    fn labels_resolve_branch_offsets() {
        let src = "start:\n  addi a0, zero, 1\n  beq a0, a0, start\n";
        let words = assemble(src).unwrap();
        assert_eq!(words.len(), 2);
    }

    #[test]
    fn directives_are_ignored() {
        let src = ".text\n.globl _start\n_start:\n  addi a0, zero, 1\nebreak\n";
        let words = assemble(src).unwrap();
        assert_eq!(words.len(), 2);
    }

    #[test]
    fn word_directive_accepts_a_list() {
        let words = assemble(".word 1, 2, 3\n").unwrap();
        assert_eq!(words, vec![1, 2, 3]);
    }

    #[test]
    fn unknown_mnemonic_is_fatal() {
        assert!(matches!(assemble("frobnicate x1, x2\n"), Err(AssembleError::UnknownMnemonic { .. })));
    }

    #[test]
    fn unknown_register_is_fatal() {
        assert!(matches!(assemble("addi notareg, zero, 1\n"), Err(AssembleError::UnknownRegister { .. })));
    }

    #[test]
    fn malformed_memory_operand_is_fatal() {
        assert!(matches!(assemble("lw a0, garbage\n"), Err(AssembleError::MalformedOperand { .. })));
    }

    #[test]
    fn store_then_load_same_operands() {
        let src = "sw a0, 0(a1)\nlw a0, 0(a1)\n";
        assert_eq!(assemble(src).unwrap().len(), 2);
    }

    #[test]
    fn is_deterministic() {
        let src = "li t0, 0x12345678\nebreak\n";
        assert_eq!(assemble(src).unwrap(), assemble(src).unwrap());
    }
}
