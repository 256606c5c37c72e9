// Upvalues, globals and closure construction

use super::ExecFrame;
use crate::lua_value::{LuaFunction, LuaUpvalue, LuaValue};
use crate::lua_vm::opcode::{Instruction, OpCode};
use crate::lua_vm::{LuaEnv, LuaError, LuaResult};
use std::rc::Rc;

fn upvalue<'a>(frame: &'a ExecFrame, index: usize) -> LuaResult<&'a Rc<LuaUpvalue>> {
    frame.upvalues.get(index).ok_or_else(|| {
        LuaError::InternalError(format!("upvalue index {index} out of range"))
    })
}

/// The constant named by Bx, which must be a string (global name)
fn global_name(frame: &ExecFrame, word: u32) -> LuaResult<String> {
    let bx = Instruction::get_bx(word) as usize;
    let constant = frame.constant(bx)?;
    match constant.as_string() {
        Some(name) => Ok(name.as_str().to_string()),
        None => Err(LuaError::InternalError(format!(
            "global name constant {bx} is a {}",
            constant.type_name()
        ))),
    }
}

/// GETUPVAL: R(A) := UpValue[B]
pub(super) fn exec_getupval(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word) as usize;
    let value = upvalue(frame, b)?.get();
    frame.set_reg(a, value);
    Ok(())
}

/// SETUPVAL: UpValue[B] := R(A)
pub(super) fn exec_setupval(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word) as usize;
    upvalue(frame, b)?.set(frame.reg(a));
    Ok(())
}

/// GETGLOBAL: R(A) := Gbl[K(Bx)]
pub(super) fn exec_getglobal(
    env: &mut LuaEnv,
    frame: &mut ExecFrame,
    word: u32,
) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let name = global_name(frame, word)?;
    frame.set_reg(a, env.get_global(&name));
    Ok(())
}

/// SETGLOBAL: Gbl[K(Bx)] := R(A)
pub(super) fn exec_setglobal(
    env: &mut LuaEnv,
    frame: &mut ExecFrame,
    word: u32,
) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let name = global_name(frame, word)?;
    env.set_global(name, frame.reg(a));
    Ok(())
}

/// CLOSE: close every upvalue aliasing a register >= A
pub(super) fn exec_close(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    frame.stack.close_from(a);
    Ok(())
}

/// CLOSURE: R(A) := closure(proto[Bx]).
///
/// The following `num_upvals` words are capture pseudo-instructions, not
/// independently dispatchable: MOVE B opens an upvalue on this frame's
/// register B, GETUPVAL B inherits the current closure's upvalue B.
pub(super) fn exec_closure(frame: &mut ExecFrame, word: u32) -> LuaResult<()> {
    let a = Instruction::get_a(word) as usize;
    let bx = Instruction::get_bx(word) as usize;

    let proto = frame.chunk.protos.get(bx).cloned().ok_or_else(|| {
        LuaError::InternalError(format!("prototype index {bx} out of range"))
    })?;

    let mut upvalues = Vec::with_capacity(proto.num_upvalues as usize);
    for _ in 0..proto.num_upvalues {
        let capture = frame.next_word().ok_or_else(|| {
            LuaError::InternalError("missing closure capture instruction".to_string())
        })?;
        let b = Instruction::get_b(capture) as usize;
        match Instruction::get_opcode(capture)? {
            OpCode::Move => upvalues.push(frame.stack.open_upvalue(b)),
            OpCode::GetUpval => upvalues.push(Rc::clone(upvalue(frame, b)?)),
            other => {
                return Err(LuaError::InternalError(format!(
                    "bad closure capture instruction '{}'",
                    other.name()
                )));
            }
        }
    }

    frame.set_reg(a, LuaValue::function(LuaFunction::new(proto, upvalues)));
    Ok(())
}
