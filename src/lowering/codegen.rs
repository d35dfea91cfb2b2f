use std::collections::HashMap;

use super::ast::{AugOp, BinOp, Compare, CompareOp, Expr, Stmt};
use super::LowerError;

const REG_POOL: [&str; 11] = ["s1", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11"];

struct Gen {
    lines: Vec<String>,
    vars: HashMap<String, &'static str>,
    next_slot: usize,
    label_counter: u32,
}

impl Gen {
    fn new() -> Self {
        Self { lines: Vec::new(), vars: HashMap::new(), next_slot: 0, label_counter: 0 }
    }

    fn emit(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn new_label(&mut self, prefix: &str) -> String {
        self.label_counter += 1;
        format!("{prefix}{}", self.label_counter)
    }

    fn get_var(&mut self, name: &str) -> Result<&'static str, LowerError> {
        if let Some(reg) = self.vars.get(name) {
            return Ok(reg);
        }
        let reg = *REG_POOL.get(self.next_slot).ok_or(LowerError::RegisterPoolExhausted)?;
        self.next_slot += 1;
        self.vars.insert(name.to_string(), reg);
        self.emit(format!("li {reg}, 0"));
        Ok(reg)
    }

    fn eval_expr(&mut self, expr: &Expr, target: &str) -> Result<(), LowerError> {
        match expr {
            Expr::Int(value) => self.emit(format!("li {target}, {value}")),
            Expr::Var(name) => {
                let reg = self.get_var(name)?;
                self.emit(format!("mv {target}, {reg}"));
            }
            Expr::Binary { op, left, right } => {
                self.eval_expr(left, "t0")?;
                self.eval_expr(right, "t1")?;
                let mnemonic = match op {
                    BinOp::Add => "add",
                    BinOp::Sub => "sub",
                    BinOp::And => "and",
                    BinOp::Or => "or",
                    BinOp::Xor => "xor",
                    BinOp::Shl => "sll",
                    BinOp::Shr => "srl",
                };
                self.emit(format!("{mnemonic} t2, t0, t1"));
                self.emit(format!("mv {target}, t2"));
            }
        }
        Ok(())
    }

    /// Emits a branch to `false_label` taken when `cond` is false.
    fn gen_cond_branch_false(&mut self, cond: &Compare, false_label: &str) -> Result<(), LowerError> {
        self.eval_expr(&cond.left, "t0")?;
        self.eval_expr(&cond.right, "t1")?;
        match cond.op {
            CompareOp::Eq => self.emit(format!("bne t0, t1, {false_label}")),
            CompareOp::Ne => self.emit(format!("beq t0, t1, {false_label}")),
            CompareOp::Lt => self.emit(format!("bge t0, t1, {false_label}")),
            CompareOp::Le => self.emit(format!("blt t1, t0, {false_label}")),
            CompareOp::Ge => self.emit(format!("blt t0, t1, {false_label}")),
            CompareOp::Gt => {
                // RV32I has no strict-greater branch: fall through only
                // if t0 > t1, i.e. branch false when t0 < t1 or t0 == t1.
                self.emit(format!("blt t0, t1, {false_label}"));
                self.emit(format!("beq t0, t1, {false_label}"));
            }
        }
        Ok(())
    }

    fn gen_stmt(&mut self, stmt: &Stmt) -> Result<(), LowerError> {
        match stmt {
            Stmt::Assign { name, value } => {
                self.eval_expr(value, "t0")?;
                let reg = self.get_var(name)?;
                self.emit(format!("mv {reg}, t0"));
            }
            Stmt::AugAssign { name, op, value } => {
                let reg = self.get_var(name)?;
                self.emit(format!("mv t0, {reg}"));
                self.eval_expr(value, "t1")?;
                match op {
                    AugOp::Add => self.emit("add t0, t0, t1"),
                    AugOp::Sub => self.emit("sub t0, t0, t1"),
                }
                self.emit(format!("mv {reg}, t0"));
            }
            Stmt::While { cond, body } => {
                let top = self.new_label("while");
                let end = self.new_label("endw");
                self.emit(format!("{top}:"));
                self.gen_cond_branch_false(cond, &end)?;
                for s in body {
                    self.gen_stmt(s)?;
                }
                self.emit(format!("j {top}"));
                self.emit(format!("{end}:"));
            }
            Stmt::If { cond, then_body, else_body } => {
                let else_label = self.new_label("else");
                let end_label = self.new_label("endif");
                self.gen_cond_branch_false(cond, &else_label)?;
                for s in then_body {
                    self.gen_stmt(s)?;
                }
                self.emit(format!("j {end_label}"));
                self.emit(format!("{else_label}:"));
                for s in else_body {
                    self.gen_stmt(s)?;
                }
                self.emit(format!("{end_label}:"));
            }
        }
        Ok(())
    }
}

pub fn generate(program: &[Stmt]) -> Result<String, LowerError> {
    let mut gen = Gen::new();
    gen.emit(".text");
    gen.emit("_start:");
    for stmt in program {
        gen.gen_stmt(stmt)?;
    }
    gen.emit("sw s1, 0(x0)");
    gen.emit("ebreak");
    let mut out = gen.lines.join("\n");
    out.push('\n');
    Ok(out)
}
