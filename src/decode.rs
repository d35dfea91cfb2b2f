//! Decode a 32-bit instruction word into an [`Instruction`].

use thiserror::Error;

use crate::instr::{AluOp, BranchOp, Instruction, LoadOp, StoreOp};
use crate::opcodes::*;
use crate::utils::{extract_field, sign_extend};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unrecognized opcode 0b{opcode:07b} in word 0x{word:08x}")]
    UnknownOpcode { opcode: u32, word: u32 },
    #[error("unrecognized funct3 0b{funct3:03b} for opcode 0b{opcode:07b} in word 0x{word:08x}")]
    UnknownFunct3 { opcode: u32, funct3: u32, word: u32 },
    #[error("unrecognized funct3/funct7 0b{funct3:03b}/0b{funct7:07b} in word 0x{word:08x}")]
    UnknownFunct7 { funct3: u32, funct7: u32, word: u32 },
    #[error("word 0x{word:08x} on OP-SYSTEM is neither ecall nor ebreak")]
    UnknownSystemCall { word: u32 },
}

fn opcode(word: u32) -> u32 {
    extract_field(word, 6, 0)
}

fn rd(word: u32) -> u8 {
    extract_field(word, 11, 7) as u8
}

fn funct3(word: u32) -> u32 {
    extract_field(word, 14, 12)
}

fn rs1(word: u32) -> u8 {
    extract_field(word, 19, 15) as u8
}

fn rs2(word: u32) -> u8 {
    extract_field(word, 24, 20) as u8
}

fn funct7(word: u32) -> u32 {
    extract_field(word, 31, 25)
}

fn itype_imm(word: u32) -> i32 {
    sign_extend(extract_field(word, 31, 20), 12)
}

fn stype_imm(word: u32) -> i32 {
    let hi = extract_field(word, 31, 25);
    let lo = extract_field(word, 11, 7);
    sign_extend((hi << 5) | lo, 12)
}

fn btype_imm(word: u32) -> i32 {
    let imm12 = extract_field(word, 31, 31);
    let imm10_5 = extract_field(word, 30, 25);
    let imm4_1 = extract_field(word, 11, 8);
    let imm11 = extract_field(word, 7, 7);
    let bits = (imm12 << 12) | (imm11 << 11) | (imm10_5 << 5) | (imm4_1 << 1);
    sign_extend(bits, 13)
}

fn utype_imm(word: u32) -> u32 {
    extract_field(word, 31, 12)
}

fn jtype_imm(word: u32) -> i32 {
    let imm20 = extract_field(word, 31, 31);
    let imm19_12 = extract_field(word, 19, 12);
    let imm11 = extract_field(word, 20, 20);
    let imm10_1 = extract_field(word, 30, 21);
    let bits = (imm20 << 20) | (imm19_12 << 12) | (imm11 << 11) | (imm10_1 << 1);
    sign_extend(bits, 21)
}

/// Decode a 32-bit instruction word.
pub fn decode(word: u32) -> Result<Instruction, DecodeError> {
    let opc = opcode(word);
    match opc {
        OP_LUI => Ok(Instruction::Lui { rd: rd(word), imm: utype_imm(word) }),
        OP_AUIPC => Ok(Instruction::Auipc { rd: rd(word), imm: utype_imm(word) }),
        OP_JAL => Ok(Instruction::Jal { rd: rd(word), imm: jtype_imm(word) }),
        OP_JALR => {
            let f3 = funct3(word);
            if f3 != 0b000 {
                return Err(DecodeError::UnknownFunct3 { opcode: opc, funct3: f3, word });
            }
            Ok(Instruction::Jalr { rd: rd(word), rs1: rs1(word), imm: itype_imm(word) })
        }
        OP_BRANCH => {
            let op = match funct3(word) {
                FUNCT3_BEQ => BranchOp::Beq,
                FUNCT3_BNE => BranchOp::Bne,
                FUNCT3_BLT => BranchOp::Blt,
                FUNCT3_BGE => BranchOp::Bge,
                FUNCT3_BLTU => BranchOp::Bltu,
                FUNCT3_BGEU => BranchOp::Bgeu,
                f3 => return Err(DecodeError::UnknownFunct3 { opcode: opc, funct3: f3, word }),
            };
            Ok(Instruction::Branch { op, rs1: rs1(word), rs2: rs2(word), imm: btype_imm(word) })
        }
        OP_LOAD => {
            let op = match funct3(word) {
                FUNCT3_LB => LoadOp::Lb,
                FUNCT3_LH => LoadOp::Lh,
                FUNCT3_LW => LoadOp::Lw,
                FUNCT3_LBU => LoadOp::Lbu,
                FUNCT3_LHU => LoadOp::Lhu,
                f3 => return Err(DecodeError::UnknownFunct3 { opcode: opc, funct3: f3, word }),
            };
            Ok(Instruction::Load { op, rd: rd(word), rs1: rs1(word), imm: itype_imm(word) })
        }
        OP_STORE => {
            let op = match funct3(word) {
                FUNCT3_SB => StoreOp::Sb,
                FUNCT3_SH => StoreOp::Sh,
                FUNCT3_SW => StoreOp::Sw,
                f3 => return Err(DecodeError::UnknownFunct3 { opcode: opc, funct3: f3, word }),
            };
            Ok(Instruction::Store { op, rs1: rs1(word), rs2: rs2(word), imm: stype_imm(word) })
        }
        OP_IMM => {
            let f3 = funct3(word);
            let op = match f3 {
                FUNCT3_ADD_SUB => AluOp::Add,
                FUNCT3_SLT => AluOp::Slt,
                FUNCT3_SLTU => AluOp::Sltu,
                FUNCT3_XOR => AluOp::Xor,
                FUNCT3_OR => AluOp::Or,
                FUNCT3_AND => AluOp::And,
                FUNCT3_SLL => AluOp::Sll,
                FUNCT3_SRL_SRA => match funct7(word) {
                    FUNCT7_ZERO => AluOp::Srl,
                    FUNCT7_ALT => AluOp::Sra,
                    f7 => return Err(DecodeError::UnknownFunct7 { funct3: f3, funct7: f7, word }),
                },
                f3 => return Err(DecodeError::UnknownFunct3 { opcode: opc, funct3: f3, word }),
            };
            let imm = match op {
                AluOp::Sll | AluOp::Srl | AluOp::Sra => extract_field(word, 24, 20) as i32,
                _ => itype_imm(word),
            };
            Ok(Instruction::OpImm { op, rd: rd(word), rs1: rs1(word), imm })
        }
        OP => {
            let f3 = funct3(word);
            let f7 = funct7(word);
            let op = match (f3, f7) {
                (FUNCT3_ADD_SUB, FUNCT7_ZERO) => AluOp::Add,
                (FUNCT3_ADD_SUB, FUNCT7_ALT) => AluOp::Sub,
                (FUNCT3_SLL, FUNCT7_ZERO) => AluOp::Sll,
                (FUNCT3_SLT, FUNCT7_ZERO) => AluOp::Slt,
                (FUNCT3_SLTU, FUNCT7_ZERO) => AluOp::Sltu,
                (FUNCT3_XOR, FUNCT7_ZERO) => AluOp::Xor,
                (FUNCT3_SRL_SRA, FUNCT7_ZERO) => AluOp::Srl,
                (FUNCT3_SRL_SRA, FUNCT7_ALT) => AluOp::Sra,
                (FUNCT3_OR, FUNCT7_ZERO) => AluOp::Or,
                (FUNCT3_AND, FUNCT7_ZERO) => AluOp::And,
                _ => return Err(DecodeError::UnknownFunct7 { funct3: f3, funct7: f7, word }),
            };
            Ok(Instruction::Op { op, rd: rd(word), rs1: rs1(word), rs2: rs2(word) })
        }
        OP_SYSTEM => match word {
            WORD_ECALL => Ok(Instruction::Ecall),
            WORD_EBREAK => Ok(Instruction::Ebreak),
            _ => Err(DecodeError::UnknownSystemCall { word }),
        },
        _ => Err(DecodeError::UnknownOpcode { opcode: opc, word }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;

    fn roundtrip(instr: Instruction) {
        let word = encode(&instr);
        assert_eq!(decode(word), Ok(instr));
    }

    #[test]
    fn roundtrip_addi() {
        roundtrip(Instruction::OpImm { op: AluOp::Add, rd: 1, rs1: 2, imm: -100 });
    }

    #[test]
    fn roundtrip_add() {
        roundtrip(Instruction::Op { op: AluOp::Add, rd: 1, rs1: 2, rs2: 3 });
    }

    #[test]
    fn roundtrip_sw_and_lw() {
        roundtrip(Instruction::Store { op: StoreOp::Sw, rs1: 8, rs2: 9, imm: -4 });
        roundtrip(Instruction::Load { op: LoadOp::Lw, rd: 9, rs1: 8, imm: 2000 });
    }

    #[test]
    fn roundtrip_branches() {
        roundtrip(Instruction::Branch { op: BranchOp::Beq, rs1: 1, rs2: 2, imm: -8 });
        roundtrip(Instruction::Branch { op: BranchOp::Bge, rs1: 1, rs2: 2, imm: 4094 });
    }

    #[test]
    fn roundtrip_jal_and_jalr() {
        roundtrip(Instruction::Jal { rd: 1, imm: -1_048_576 });
        roundtrip(Instruction::Jalr { rd: 1, rs1: 2, imm: 42 });
    }

    #[test]
    fn roundtrip_lui_auipc() {
        roundtrip(Instruction::Lui { rd: 5, imm: 0xabcde });
        roundtrip(Instruction::Auipc { rd: 5, imm: 0x12345 });
    }

    #[test]
    fn roundtrip_shifts() {
        roundtrip(Instruction::OpImm { op: AluOp::Sll, rd: 1, rs1: 1, imm: 31 });
        roundtrip(Instruction::OpImm { op: AluOp::Sra, rd: 1, rs1: 1, imm: 0 });
    }

    #[test]
    fn ecall_ebreak() {
        assert_eq!(decode(WORD_ECALL), Ok(Instruction::Ecall));
        assert_eq!(decode(WORD_EBREAK), Ok(Instruction::Ebreak));
    }

    #[test]
    fn unknown_opcode_errors() {
        assert_eq!(
            decode(0b1111111),
            Err(DecodeError::UnknownOpcode { opcode: 0b1111111, word: 0b1111111 })
        );
    }
}
