// Table creation, access and the setlist bulk initializer

use super::ExecFrame;
use crate::lua_value::{LuaTable, LuaValue};
use crate::lua_vm::opcode::{decode_fbyte, Instruction};
use crate::lua_vm::{LuaError, LuaResult};

/// Array elements flushed per setlist block
const LFIELDS_PER_FLUSH: usize = 50;

fn index_value(target: &LuaValue, key: &LuaValue) -> LuaResult<LuaValue> {
    match target.as_table() {
        Some(table) => Ok(table.borrow().get(key)),
        None => Err(LuaError::TypeError(format!(
            "attempt to index a {} value",
            target.type_name()
        ))),
    }
}

/// NEWTABLE: R(A) := {} with floating-byte size hints in B and C
pub(super) fn exec_newtable(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let array_hint = decode_fbyte(Instruction::get_b(word));
    let hash_hint = decode_fbyte(Instruction::get_c(word));
    frame.set_reg(a, LuaValue::table(LuaTable::with_capacity(array_hint, hash_hint)));
    Ok(())
}

/// GETTABLE: R(A) := R(B)[RK(C)]
pub(super) fn exec_gettable(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word) as usize;
    let key = frame.rk(Instruction::get_c(word))?;
    let value = index_value(&frame.reg(b), &key)?;
    frame.set_reg(a, value);
    Ok(())
}

/// SETTABLE: R(A)[RK(B)] := RK(C)
pub(super) fn exec_settable(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let key = frame.rk(Instruction::get_b(word))?;
    let value = frame.rk(Instruction::get_c(word))?;

    let target = frame.reg(a);
    match target.as_table() {
        Some(table) => {
            table.borrow_mut().set(key, value);
            Ok(())
        }
        None => Err(LuaError::TypeError(format!(
            "attempt to index a {} value",
            target.type_name()
        ))),
    }
}

/// SELF: R(A+1) := R(B); R(A) := R(B)[RK(C)]
pub(super) fn exec_self(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word) as usize;
    let receiver = frame.reg(b);
    let key = frame.rk(Instruction::get_c(word))?;
    frame.set_reg(a + 1, receiver.clone());
    let method = index_value(&receiver, &key)?;
    frame.set_reg(a, method);
    Ok(())
}

/// SETLIST: R(A)[(C-1)*50 + i] := R(A+i) for 1 <= i <= B.
/// B = 0 flushes through the top of stack; C = 0 takes the real block index
/// from the next raw instruction word.
pub(super) fn exec_setlist(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word) as usize;
    let mut c = Instruction::get_c(word) as usize;

    if c == 0 {
        c = frame.next_word().ok_or_else(|| {
            LuaError::InternalError("missing setlist extension word".to_string())
        })? as usize;
        if c == 0 {
            return Err(LuaError::InternalError(
                "setlist block index is zero".to_string(),
            ));
        }
    }

    let count = if b == 0 {
        frame.stack.top().saturating_sub(a + 1)
    } else {
        b
    };

    let target = frame.reg(a);
    let table = target.as_table().ok_or_else(|| {
        LuaError::InternalError(format!(
            "setlist target is a {} value",
            target.type_name()
        ))
    })?;

    let base = (c - 1) * LFIELDS_PER_FLUSH;
    let mut table = table.borrow_mut();
    for i in 1..=count {
        table.set(LuaValue::Number((base + i) as f64), frame.reg(a + i));
    }
    Ok(())
}
