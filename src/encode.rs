//! Encode an [`Instruction`] into its 32-bit instruction word.

use crate::instr::{AluOp, BranchOp, Instruction, LoadOp, StoreOp};
use crate::opcodes::*;
use crate::utils::{extract_field, interpret_i32_as_unsigned};

/// Pack an I-type instruction word.
fn itype(imm: u32, rs1: u8, funct3: u32, rd: u8, opcode: u32) -> u32 {
    (imm & 0xfff) << 20 | u32::from(rs1) << 15 | funct3 << 12 | u32::from(rd) << 7 | opcode
}

/// Pack a U-type (or, once the immediate has been re-shuffled, a
/// J-type) instruction word.
fn ujtype(imm: u32, rd: u8, opcode: u32) -> u32 {
    imm << 12 | u32::from(rd) << 7 | opcode
}

/// Pack an R-type (or, with `a`/`b` holding the split immediate
/// halves, an S-type) instruction word.
///
/// R-type: `a` = funct7, `b` = rd. S-type: `a` = imm[11:5], `b` = imm[4:0].
fn rstype(a: u32, rs2: u8, rs1: u8, funct3: u32, b: u32, opcode: u32) -> u32 {
    a << 25 | u32::from(rs2) << 20 | u32::from(rs1) << 15 | funct3 << 12 | b << 7 | opcode
}

/// Shuffle a J-type displacement into the scrambled field layout used
/// by the 20-bit immediate slot of a `jal` instruction word.
fn jtype_imm_field(imm: i32) -> u32 {
    let imm = interpret_i32_as_unsigned(imm);
    let imm20 = extract_field(imm, 20, 20);
    let imm19_12 = extract_field(imm, 19, 12);
    let imm11 = extract_field(imm, 11, 11);
    let imm10_1 = extract_field(imm, 10, 1);
    (imm20 << 19) | (imm10_1 << 9) | (imm11 << 8) | imm19_12
}

/// Split a B-type displacement into the `(a, b)` halves expected by
/// [`rstype`] for a conditional branch instruction word.
fn btype_imm_fields(imm: i32) -> (u32, u32) {
    let imm = interpret_i32_as_unsigned(imm);
    let imm12 = extract_field(imm, 12, 12);
    let imm11 = extract_field(imm, 11, 11);
    let imm10_5 = extract_field(imm, 10, 5);
    let imm4_1 = extract_field(imm, 4, 1);
    let a = (imm12 << 6) | imm10_5;
    let b = (imm4_1 << 1) | imm11;
    (a, b)
}

/// Split an S-type displacement into the `(a, b)` halves expected by
/// [`rstype`] for a store instruction word.
fn stype_imm_fields(imm: i32) -> (u32, u32) {
    let imm = interpret_i32_as_unsigned(imm);
    (extract_field(imm, 11, 5), extract_field(imm, 4, 0))
}

fn alu_funct3_funct7(op: AluOp) -> (u32, u32) {
    match op {
        AluOp::Add => (FUNCT3_ADD_SUB, FUNCT7_ZERO),
        AluOp::Sub => (FUNCT3_ADD_SUB, FUNCT7_ALT),
        AluOp::Sll => (FUNCT3_SLL, FUNCT7_ZERO),
        AluOp::Slt => (FUNCT3_SLT, FUNCT7_ZERO),
        AluOp::Sltu => (FUNCT3_SLTU, FUNCT7_ZERO),
        AluOp::Xor => (FUNCT3_XOR, FUNCT7_ZERO),
        AluOp::Srl => (FUNCT3_SRL_SRA, FUNCT7_ZERO),
        AluOp::Sra => (FUNCT3_SRL_SRA, FUNCT7_ALT),
        AluOp::Or => (FUNCT3_OR, FUNCT7_ZERO),
        AluOp::And => (FUNCT3_AND, FUNCT7_ZERO),
    }
}

fn branch_funct3(op: BranchOp) -> u32 {
    match op {
        BranchOp::Beq => FUNCT3_BEQ,
        BranchOp::Bne => FUNCT3_BNE,
        BranchOp::Blt => FUNCT3_BLT,
        BranchOp::Bge => FUNCT3_BGE,
        BranchOp::Bltu => FUNCT3_BLTU,
        BranchOp::Bgeu => FUNCT3_BGEU,
    }
}

fn load_funct3(op: LoadOp) -> u32 {
    match op {
        LoadOp::Lb => FUNCT3_LB,
        LoadOp::Lh => FUNCT3_LH,
        LoadOp::Lw => FUNCT3_LW,
        LoadOp::Lbu => FUNCT3_LBU,
        LoadOp::Lhu => FUNCT3_LHU,
    }
}

fn store_funct3(op: StoreOp) -> u32 {
    match op {
        StoreOp::Sb => FUNCT3_SB,
        StoreOp::Sh => FUNCT3_SH,
        StoreOp::Sw => FUNCT3_SW,
    }
}

/// Encode `instr` to its 32-bit instruction word.
///
/// Shift amounts (`Sll`/`Srl`/`Sra` under [`Instruction::OpImm`]) are
/// masked to their low 5 bits, matching hardware shift-amount
/// truncation; callers that need to reject out-of-range shift amounts
/// should do so before calling this function.
pub fn encode(instr: &Instruction) -> u32 {
    match *instr {
        Instruction::Lui { rd, imm } => ujtype(imm, rd, OP_LUI),
        Instruction::Auipc { rd, imm } => ujtype(imm, rd, OP_AUIPC),
        Instruction::Jal { rd, imm } => ujtype(jtype_imm_field(imm), rd, OP_JAL),
        Instruction::Jalr { rd, rs1, imm } => {
            itype(interpret_i32_as_unsigned(imm), rs1, 0b000, rd, OP_JALR)
        }
        Instruction::Branch { op, rs1, rs2, imm } => {
            let (a, b) = btype_imm_fields(imm);
            rstype(a, rs2, rs1, branch_funct3(op), b, OP_BRANCH)
        }
        Instruction::Load { op, rd, rs1, imm } => {
            itype(interpret_i32_as_unsigned(imm), rs1, load_funct3(op), rd, OP_LOAD)
        }
        Instruction::Store { op, rs1, rs2, imm } => {
            let (a, b) = stype_imm_fields(imm);
            rstype(a, rs2, rs1, store_funct3(op), b, OP_STORE)
        }
        Instruction::OpImm { op, rd, rs1, imm } => match op {
            AluOp::Sll | AluOp::Srl | AluOp::Sra => {
                let (funct3, funct7) = alu_funct3_funct7(op);
                let shamt = extract_field(interpret_i32_as_unsigned(imm), 4, 0);
                itype((funct7 << 5) | shamt, rs1, funct3, rd, OP_IMM)
            }
            _ => {
                let (funct3, _) = alu_funct3_funct7(op);
                itype(interpret_i32_as_unsigned(imm), rs1, funct3, rd, OP_IMM)
            }
        },
        Instruction::Op { op, rd, rs1, rs2 } => {
            let (funct3, funct7) = alu_funct3_funct7(op);
            rstype(funct7, rs2, rs1, funct3, u32::from(rd), OP)
        }
        Instruction::Ecall => WORD_ECALL,
        Instruction::Ebreak => WORD_EBREAK,
        Instruction::Raw { word } => word,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addi_encodes_i_type() {
        let word = encode(&Instruction::OpImm {
            op: AluOp::Add,
            rd: 1,
            rs1: 2,
            imm: -1,
        });
        assert_eq!(word, itype(0xfff, 2, 0b000, 1, OP_IMM));
    }

    #[test]
    fn sw_encodes_s_type() {
        let word = encode(&Instruction::Store {
            op: StoreOp::Sw,
            rs1: 8,
            rs2: 9,
            imm: -4,
        });
        let (a, b) = stype_imm_fields(-4);
        assert_eq!(word, rstype(a, 9, 8, FUNCT3_SW, b, OP_STORE));
    }

    #[test]
    fn beq_encodes_b_type() {
        let word = encode(&Instruction::Branch {
            op: BranchOp::Beq,
            rs1: 1,
            rs2: 2,
            imm: -8,
        });
        let (a, b) = btype_imm_fields(-8);
        assert_eq!(word, rstype(a, 2, 1, FUNCT3_BEQ, b, OP_BRANCH));
    }

    #[test]
    fn jal_encodes_j_type() {
        let word = encode(&Instruction::Jal { rd: 1, imm: 16 });
        assert_eq!(word, ujtype(jtype_imm_field(16), 1, OP_JAL));
    }

    #[test]
    fn srai_sets_alt_funct7_in_shamt_field() {
        let word = encode(&Instruction::OpImm {
            op: AluOp::Sra,
            rd: 5,
            rs1: 5,
            imm: 3,
        });
        assert_eq!(word, itype((FUNCT7_ALT << 5) | 3, 5, FUNCT3_SRL_SRA, 5, OP_IMM));
    }

    #[test]
    fn ecall_ebreak_are_fixed_words() {
        assert_eq!(encode(&Instruction::Ecall), WORD_ECALL);
        assert_eq!(encode(&Instruction::Ebreak), WORD_EBREAK);
    }
}
