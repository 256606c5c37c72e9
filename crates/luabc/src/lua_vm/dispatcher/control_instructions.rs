// Comparisons, tests and the two for-loop families

use super::{call_from_frame, ExecFrame};
use crate::lua_value::LuaValue;
use crate::lua_vm::opcode::Instruction;
use crate::lua_vm::{LuaEnv, LuaError, LuaResult};

/// EQ: if (RK(B) == RK(C)) ~= A then skip the next instruction
pub(super) fn exec_eq(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) != 0;
    let left = frame.rk(Instruction::get_b(word))?;
    let right = frame.rk(Instruction::get_c(word))?;
    if (left == right) != a {
        frame.pc += 1;
    }
    Ok(())
}

/// LT: if (RK(B) < RK(C)) ~= A then skip
pub(super) fn exec_lt(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) != 0;
    let left = frame.rk(Instruction::get_b(word))?;
    let right = frame.rk(Instruction::get_c(word))?;
    if left.op_lt(&right)? != a {
        frame.pc += 1;
    }
    Ok(())
}

/// LE: if (RK(B) <= RK(C)) ~= A then skip
pub(super) fn exec_le(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) != 0;
    let left = frame.rk(Instruction::get_b(word))?;
    let right = frame.rk(Instruction::get_c(word))?;
    if left.op_le(&right)? != a {
        frame.pc += 1;
    }
    Ok(())
}

/// TEST: if bool(R(A)) ~= C then skip
pub(super) fn exec_test(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let c = Instruction::get_c(word) != 0;
    if frame.reg(a).is_truthy() != c {
        frame.pc += 1;
    }
    Ok(())
}

/// TESTSET: if bool(R(B)) ~= C then skip, else R(A) := R(B)
pub(super) fn exec_testset(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word) as usize;
    let c = Instruction::get_c(word) != 0;
    let value = frame.reg(b);
    if value.is_truthy() != c {
        frame.pc += 1;
    } else {
        frame.set_reg(a, value);
    }
    Ok(())
}

fn for_number(frame: &ExecFrame, index: usize, what: &str) -> LuaResult<f64> {
    frame.reg(index).as_number().ok_or_else(|| {
        LuaError::RuntimeError(format!("'for' {what} must be a number"))
    })
}

/// FORPREP: R(A) -= R(A+2); pc += sBx
pub(super) fn exec_forprep(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let init = for_number(frame, a, "initial value")?;
    for_number(frame, a + 1, "limit")?;
    let step = for_number(frame, a + 2, "step")?;
    frame.set_reg(a, LuaValue::Number(init - step));
    frame.jump(Instruction::get_sbx(word))
}

/// FORLOOP: R(A) += R(A+2); while R(A) <= R(A+1) jump back and expose the
/// loop variable in R(A+3)
pub(super) fn exec_forloop(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let index = for_number(frame, a, "initial value")? + for_number(frame, a + 2, "step")?;
    let limit = for_number(frame, a + 1, "limit")?;
    frame.set_reg(a, LuaValue::Number(index));
    if index <= limit {
        frame.jump(Instruction::get_sbx(word))?;
        frame.set_reg(a + 3, LuaValue::Number(index));
    }
    Ok(())
}

/// TFORLOOP: call the iterator R(A) with (state, control); write up to C
/// results starting at R(A+3); continue while the first result is non-nil
pub(super) fn exec_tforloop(
    env: &mut LuaEnv,
    frame: &mut ExecFrame,
    word: u32,
    at: usize,
) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let c = Instruction::get_c(word) as usize;

    let callee = frame.reg(a);
    let args = [frame.reg(a + 1), frame.reg(a + 2)];
    let results = call_from_frame(env, frame, callee, &args, at)?;

    for i in 0..c {
        frame.set_reg(a + 3 + i, results.get(i).cloned().unwrap_or(LuaValue::Nil));
    }
    let control = frame.reg(a + 3);
    if control.is_nil() {
        frame.pc += 1;
    } else {
        frame.set_reg(a + 2, control);
    }
    Ok(())
}
