// The virtual machine: loader entry, environment, register stacks and the
// instruction dispatcher.

pub mod dispatcher;
mod lua_env;
mod lua_error;
mod lua_stack;
pub mod opcode;

use std::rc::Rc;

pub use lua_env::LuaEnv;
pub use lua_error::{LuaError, LuaResult};
pub use lua_stack::LuaStack;
pub use opcode::{decode_fbyte, Instruction, OpCode, OpMode};

use crate::lib_registry;
use crate::lua_value::{load_chunk, LuaFunction, LuaValue};

/// The embedder's handle: a global environment plus the load/execute entry
/// points.
pub struct LuaVM {
    env: LuaEnv,
}

impl LuaVM {
    pub fn new() -> Self {
        LuaVM { env: LuaEnv::new() }
    }

    /// A VM whose print output goes to the given sink instead of stdout
    pub fn with_output(output: Box<dyn std::io::Write>) -> Self {
        LuaVM {
            env: LuaEnv::with_output(output),
        }
    }

    /// Install the standard libraries into the environment
    pub fn open_libs(&mut self) {
        lib_registry::create_standard_registry().load_all(&mut self.env);
    }

    /// Parse a binary chunk image and wrap its top-level prototype into a
    /// closure with no upvalues
    pub fn load(&self, bytes: &[u8]) -> LuaResult<Rc<LuaFunction>> {
        let chunk = load_chunk(bytes)?;
        Ok(Rc::new(LuaFunction::new(chunk, Vec::new())))
    }

    /// Run a closure from the entry point. Errors unwind every pending
    /// frame (closing their upvalues) before being reported here.
    pub fn execute(
        &mut self,
        closure: &Rc<LuaFunction>,
        args: &[LuaValue],
    ) -> LuaResult<Vec<LuaValue>> {
        dispatcher::call_lua_function(&mut self.env, closure, args)
    }

    /// Call any callable value, host callables included
    pub fn call(&mut self, callee: &LuaValue, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
        dispatcher::call_value(&mut self.env, callee, args)
    }

    pub fn register_global(&mut self, name: &str, value: LuaValue) {
        self.env.set_global(name, value);
    }

    pub fn get_global(&self, name: &str) -> LuaValue {
        self.env.get_global(name)
    }

    pub fn env_mut(&mut self) -> &mut LuaEnv {
        &mut self.env
    }
}

impl Default for LuaVM {
    fn default() -> Self {
        Self::new()
    }
}
