// Instruction dispatcher.
//
// Each invocation gets its own register stack; calls recurse through
// `call_lua_function`. The main loop decodes one word at a time and
// delegates to the instruction-group modules; control flow that touches
// the frame state (calls, returns, loops) lives here.

mod arithmetic_instructions;
mod control_instructions;
mod load_instructions;
mod table_instructions;
mod upvalue_instructions;

use std::rc::Rc;

use tracing::trace;

use crate::lua_value::{Chunk, LuaFunction, LuaUpvalue, LuaValue};
use crate::lua_vm::opcode::{Instruction, OpCode};
use crate::lua_vm::{LuaEnv, LuaError, LuaResult, LuaStack};

/// Nesting limit for Lua-to-Lua calls; beyond this the program is assumed
/// to be in unbounded recursion
const MAX_CALL_DEPTH: usize = 200;

/// Action to take after dispatching an instruction
enum DispatchAction {
    Continue,
    Return(Vec<LuaValue>),
}

/// Per-invocation execution state
pub(crate) struct ExecFrame<'a> {
    pub(crate) chunk: &'a Chunk,
    pub(crate) upvalues: &'a [Rc<LuaUpvalue>],
    pub(crate) stack: Rc<LuaStack>,
    pub(crate) varargs: &'a [LuaValue],
    pub(crate) pc: usize,
}

impl ExecFrame<'_> {
    pub(crate) fn reg(&self, index: usize) -> LuaValue {
        self.stack.get(index)
    }

    pub(crate) fn set_reg(&self, index: usize, value: LuaValue) {
        self.stack.set(index, value);
    }

    pub(crate) fn constant(&self, index: usize) -> LuaResult<LuaValue> {
        self.chunk.constants.get(index).cloned().ok_or_else(|| {
            LuaError::InternalError(format!("constant index {index} out of range"))
        })
    }

    /// RK operand: the high bit selects the constant pool
    pub(crate) fn rk(&self, operand: u32) -> LuaResult<LuaValue> {
        if operand & Instruction::RK_CONST != 0 {
            self.constant((operand & 0xFF) as usize)
        } else {
            Ok(self.reg(operand as usize))
        }
    }

    /// Relative jump, applied to an already-incremented pc
    pub(crate) fn jump(&mut self, sbx: i32) -> LuaResult<()> {
        let target = self.pc as i64 + sbx as i64;
        if target < 0 {
            return Err(LuaError::InternalError(format!(
                "jump target {target} out of range"
            )));
        }
        self.pc = target as usize;
        Ok(())
    }

    /// The instruction word at pc, consumed raw (setlist extension,
    /// closure captures)
    pub(crate) fn next_word(&mut self) -> Option<u32> {
        let word = self.chunk.code.get(self.pc).copied();
        if word.is_some() {
            self.pc += 1;
        }
        word
    }

    fn located(&self, err: LuaError, pc: usize) -> LuaError {
        err.located(&self.chunk.source_name, self.chunk.line_at(pc))
    }
}

/// Invoke any callable value. Host API entry for `execute` and for host
/// callables (pcall) that re-enter the VM.
pub fn call_value(
    env: &mut LuaEnv,
    callee: &LuaValue,
    args: &[LuaValue],
) -> LuaResult<Vec<LuaValue>> {
    match callee {
        LuaValue::Function(func) => call_lua_function(env, func, args),
        LuaValue::CFunction(func) => Ok(func(env, args)?.all_values()),
        other => Err(LuaError::TypeError(format!(
            "attempt to call a {} value",
            other.type_name()
        ))),
    }
}

/// Run a closure: allocate the register stack, copy arguments in, dispatch
/// until return. Open upvalues are closed on every exit, unwinding included.
pub fn call_lua_function(
    env: &mut LuaEnv,
    func: &LuaFunction,
    args: &[LuaValue],
) -> LuaResult<Vec<LuaValue>> {
    let chunk = &func.chunk;
    if env.call_depth >= MAX_CALL_DEPTH {
        return Err(LuaError::RuntimeError("stack overflow".to_string()));
    }

    let stack = Rc::new(LuaStack::new(chunk.max_stack_size));
    let num_params = chunk.num_params as usize;
    for (i, arg) in args.iter().take(num_params).enumerate() {
        stack.set(i, arg.clone());
    }
    let varargs: Vec<LuaValue> = if chunk.is_vararg() && args.len() > num_params {
        args[num_params..].to_vec()
    } else {
        Vec::new()
    };

    let mut frame = ExecFrame {
        chunk,
        upvalues: &func.upvalues,
        stack: Rc::clone(&stack),
        varargs: &varargs,
        pc: 0,
    };

    env.call_depth += 1;
    let result = run_frame(env, &mut frame);
    env.call_depth -= 1;

    // sibling closures that captured our locals must observe final values
    stack.close_from(0);
    result
}

fn run_frame(env: &mut LuaEnv, frame: &mut ExecFrame) -> LuaResult<Vec<LuaValue>> {
    while frame.pc < frame.chunk.code.len() {
        let at = frame.pc;
        let word = frame.chunk.code[at];
        frame.pc += 1;

        let op = Instruction::get_opcode(word)?;
        trace!(
            proto = frame.chunk.proto_num,
            pc = at,
            op = op.name(),
            "dispatch"
        );

        let action = match op {
            // calls and returns manage their own error locations
            OpCode::Call => op_call(env, frame, word, at)?,
            OpCode::TailCall => op_tailcall(env, frame, word, at)?,
            OpCode::Return => op_return(frame, word)?,
            OpCode::TForLoop => {
                control_instructions::exec_tforloop(env, frame, word, at)?;
                DispatchAction::Continue
            }
            other => step(env, frame, other, word)
                .map(|()| DispatchAction::Continue)
                .map_err(|err| frame.located(err, at))?,
        };

        if let DispatchAction::Return(values) = action {
            return Ok(values);
        }
    }
    // fell off the end of the code: no return values
    Ok(Vec::new())
}

/// All instructions that never produce return values
fn step(env: &mut LuaEnv, frame: &mut ExecFrame, op: OpCode, word: u32) -> LuaResult<()> {
    match op {
        OpCode::Move => load_instructions::exec_move(frame, word),
        OpCode::LoadK => load_instructions::exec_loadk(frame, word),
        OpCode::LoadBool => load_instructions::exec_loadbool(frame, word),
        OpCode::LoadNil => load_instructions::exec_loadnil(frame, word),
        OpCode::Vararg => load_instructions::exec_vararg(frame, word),
        OpCode::GetUpval => upvalue_instructions::exec_getupval(frame, word),
        OpCode::SetUpval => upvalue_instructions::exec_setupval(frame, word),
        OpCode::GetGlobal => upvalue_instructions::exec_getglobal(env, frame, word),
        OpCode::SetGlobal => upvalue_instructions::exec_setglobal(env, frame, word),
        OpCode::Close => upvalue_instructions::exec_close(frame, word),
        OpCode::Closure => upvalue_instructions::exec_closure(frame, word),
        OpCode::GetTable => table_instructions::exec_gettable(frame, word),
        OpCode::SetTable => table_instructions::exec_settable(frame, word),
        OpCode::NewTable => table_instructions::exec_newtable(frame, word),
        OpCode::Self_ => table_instructions::exec_self(frame, word),
        OpCode::SetList => table_instructions::exec_setlist(frame, word),
        OpCode::Add
        | OpCode::Sub
        | OpCode::Mul
        | OpCode::Div
        | OpCode::Mod
        | OpCode::Pow => arithmetic_instructions::exec_arith(frame, op, word),
        OpCode::Unm => arithmetic_instructions::exec_unm(frame, word),
        OpCode::Not => arithmetic_instructions::exec_not(frame, word),
        OpCode::Len => arithmetic_instructions::exec_len(frame, word),
        OpCode::Concat => arithmetic_instructions::exec_concat(frame, word),
        OpCode::Jmp => frame.jump(Instruction::get_sbx(word)),
        OpCode::Eq => control_instructions::exec_eq(frame, word),
        OpCode::Lt => control_instructions::exec_lt(frame, word),
        OpCode::Le => control_instructions::exec_le(frame, word),
        OpCode::Test => control_instructions::exec_test(frame, word),
        OpCode::TestSet => control_instructions::exec_testset(frame, word),
        OpCode::ForPrep => control_instructions::exec_forprep(frame, word),
        OpCode::ForLoop => control_instructions::exec_forloop(frame, word),
        OpCode::Call | OpCode::TailCall | OpCode::Return | OpCode::TForLoop => {
            unreachable!("handled in run_frame")
        }
    }
}

/// Argument window for call-family instructions
fn call_arguments(frame: &ExecFrame, a: usize, b: usize) -> Vec<LuaValue> {
    match b {
        1 => Vec::new(),
        0 => frame.stack.slice_to_top(a + 1),
        _ => (1..b).map(|i| frame.reg(a + i)).collect(),
    }
}

/// Invoke a callable from inside a frame, attaching the call-site location
/// to errors that do not already carry one (non-callables, host callables)
pub(crate) fn call_from_frame(
    env: &mut LuaEnv,
    frame: &ExecFrame,
    callee: LuaValue,
    args: &[LuaValue],
    at: usize,
) -> LuaResult<Vec<LuaValue>> {
    match callee {
        LuaValue::Function(func) => call_lua_function(env, &func, args),
        LuaValue::CFunction(func) => match func(env, args) {
            Ok(values) => Ok(values.all_values()),
            Err(err) => Err(frame.located(err, at)),
        },
        other => Err(frame.located(
            LuaError::TypeError(format!(
                "attempt to call a {} value",
                other.type_name()
            )),
            at,
        )),
    }
}

fn op_call(
    env: &mut LuaEnv,
    frame: &mut ExecFrame,
    word: u32,
    at: usize,
) -> LuaResult<DispatchAction> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word) as usize;
    let c = Instruction::get_c(word) as usize;

    let args = call_arguments(frame, a, b);
    let callee = frame.reg(a);
    let results = call_from_frame(env, frame, callee, &args, at)?;

    // C = 0 keeps every result; otherwise C-1 results, nil-padded
    let num_results = if c == 0 { results.len() } else { c - 1 };
    for i in 0..num_results {
        frame.set_reg(a + i, results.get(i).cloned().unwrap_or(LuaValue::Nil));
    }
    frame.stack.set_top(a + num_results);
    Ok(DispatchAction::Continue)
}

fn op_tailcall(
    env: &mut LuaEnv,
    frame: &mut ExecFrame,
    word: u32,
    at: usize,
) -> LuaResult<DispatchAction> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word) as usize;

    let args = call_arguments(frame, a, b);
    let callee = frame.reg(a);
    let results = call_from_frame(env, frame, callee, &args, at)?;
    Ok(DispatchAction::Return(results))
}

fn op_return(frame: &mut ExecFrame, word: u32) -> LuaResult<DispatchAction> {
    let a = Instruction::get_a(word) as usize;
    let b = Instruction::get_b(word) as usize;

    let values = match b {
        1 => Vec::new(),
        0 => frame.stack.slice_to_top(a),
        _ => (0..b - 1).map(|i| frame.reg(a + i)).collect(),
    };
    frame.stack.close_from(a);
    Ok(DispatchAction::Return(values))
}
