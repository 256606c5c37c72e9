// Register load instructions

use super::ExecFrame;
use crate::lua_value::LuaValue;
use crate::lua_vm::opcode::Instruction;
use crate::lua_vm::LuaResult;

/// MOVE: R(A) := R(B)
pub(super) fn exec_move(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word) as usize;
    frame.set_reg(a, frame.reg(b));
    Ok(())
}

/// LOADK: R(A) := K(Bx)
pub(super) fn exec_loadk(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let bx = Instruction::get_bx(word) as usize;
    frame.set_reg(a, frame.constant(bx)?);
    Ok(())
}

/// LOADBOOL: R(A) := bool(B); if C then skip the next instruction
pub(super) fn exec_loadbool(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word);
    let c = Instruction::get_c(word);
    frame.set_reg(a, LuaValue::Boolean(b != 0));
    if c != 0 {
        frame.pc += 1;
    }
    Ok(())
}

/// LOADNIL: R(A) through R(B) := nil
pub(super) fn exec_loadnil(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word) as usize;
    for i in a..=b {
        frame.set_reg(i, LuaValue::Nil);
    }
    Ok(())
}

/// VARARG: R(A), ..., R(A+B-2) := ...; B = 0 materializes everything and
/// leaves the top past the last value
pub(super) fn exec_vararg(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word) as usize;

    if b == 0 {
        for (i, value) in frame.varargs.iter().enumerate() {
            frame.set_reg(a + i, value.clone());
        }
        frame.stack.set_top(a + frame.varargs.len());
    } else {
        for i in 0..b - 1 {
            frame.set_reg(a + i, frame.varargs.get(i).cloned().unwrap_or(LuaValue::Nil));
        }
    }
    Ok(())
}
