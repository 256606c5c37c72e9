// Arithmetic, logic, length and concatenation

use super::ExecFrame;
use crate::lua_value::LuaValue;
use crate::lua_vm::opcode::{Instruction, OpCode};
use crate::lua_vm::LuaResult;

/// ADD/SUB/MUL/DIV/MOD/POW: R(A) := RK(B) op RK(C)
pub(super) fn exec_arith(frame: &mut ExecFrame, op: OpCode, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let left = frame.rk(Instruction::get_b(word))?;
    let right = frame.rk(Instruction::get_c(word))?;

    let result = match op {
        OpCode::Add => left.op_add(&right)?,
        OpCode::Sub => left.op_sub(&right)?,
        OpCode::Mul => left.op_mul(&right)?,
        OpCode::Div => left.op_div(&right)?,
        OpCode::Mod => left.op_mod(&right)?,
        OpCode::Pow => left.op_pow(&right)?,
        _ => unreachable!("not an arithmetic opcode"),
    };
    frame.set_reg(a, result);
    Ok(())
}

/// UNM: R(A) := -R(B)
pub(super) fn exec_unm(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word) as usize;
    frame.set_reg(a, frame.reg(b).op_unm()?);
    Ok(())
}

/// NOT: R(A) := not R(B)
pub(super) fn exec_not(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word) as usize;
    frame.set_reg(a, LuaValue::Boolean(!frame.reg(b).is_truthy()));
    Ok(())
}

/// LEN: R(A) := #R(B)
pub(super) fn exec_len(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word) as usize;
    frame.set_reg(a, frame.reg(b).op_len()?);
    Ok(())
}

/// CONCAT: R(A) := R(B) .. ... .. R(C)
pub(super) fn exec_concat(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word) as usize;
    let c = Instruction::get_c(word) as usize;

    let mut result = String::new();
    for i in b..=c {
        result.push_str(&frame.reg(i).concat_operand()?);
    }
    frame.set_reg(a, LuaValue::string(result));
    Ok(())
}
