//! RV32I opcode, funct3 and funct7 constants (RISC-V unprivileged
//! specification, chapter 2).

pub const OP_LUI: u32 = 0b0110111;
pub const OP_AUIPC: u32 = 0b0010111;
pub const OP_JAL: u32 = 0b1101111;
pub const OP_JALR: u32 = 0b1100111;
pub const OP_BRANCH: u32 = 0b1100011;
pub const OP_LOAD: u32 = 0b0000011;
pub const OP_STORE: u32 = 0b0100011;
pub const OP_IMM: u32 = 0b0010011;
pub const OP: u32 = 0b0110011;
pub const OP_SYSTEM: u32 = 0b1110011;

// Conditional branches
pub const FUNCT3_BEQ: u32 = 0b000;
pub const FUNCT3_BNE: u32 = 0b001;
pub const FUNCT3_BLT: u32 = 0b100;
pub const FUNCT3_BGE: u32 = 0b101;
pub const FUNCT3_BLTU: u32 = 0b110;
pub const FUNCT3_BGEU: u32 = 0b111;

// Loads
pub const FUNCT3_LB: u32 = 0b000;
pub const FUNCT3_LH: u32 = 0b001;
pub const FUNCT3_LW: u32 = 0b010;
pub const FUNCT3_LBU: u32 = 0b100;
pub const FUNCT3_LHU: u32 = 0b101;

// Stores
pub const FUNCT3_SB: u32 = 0b000;
pub const FUNCT3_SH: u32 = 0b001;
pub const FUNCT3_SW: u32 = 0b010;

// Register-immediate and register-register ops (shared funct3 space)
pub const FUNCT3_ADD_SUB: u32 = 0b000;
pub const FUNCT3_SLL: u32 = 0b001;
pub const FUNCT3_SLT: u32 = 0b010;
pub const FUNCT3_SLTU: u32 = 0b011;
pub const FUNCT3_XOR: u32 = 0b100;
pub const FUNCT3_SRL_SRA: u32 = 0b101;
pub const FUNCT3_OR: u32 = 0b110;
pub const FUNCT3_AND: u32 = 0b111;

pub const FUNCT7_ZERO: u32 = 0x00;
pub const FUNCT7_ALT: u32 = 0x20; // sub / sra / srai

/// `ecall` as a full 32-bit instruction word.
pub const WORD_ECALL: u32 = 0x0000_0073;
/// `ebreak` as a full 32-bit instruction word.
pub const WORD_EBREAK: u32 = 0x0010_0073;
/// Canonical no-op (`addi x0, x0, 0`), returned by out-of-range fetches.
pub const WORD_NOP: u32 = 0x0000_0013;
