// Lua 5.1 bytecode runtime
// Loads precompiled chunk images and executes them on a register VM

#[cfg(test)]
mod test;

pub mod lib_registry;
pub mod lua_value;
pub mod lua_vm;
pub mod stdlib;

pub use lib_registry::LibraryRegistry;
pub use lua_value::{
    load_chunk, CFunction, Chunk, LocVar, LuaFunction, LuaString, LuaTable, LuaUpvalue,
    LuaValue, MultiValue,
};
pub use lua_vm::{
    decode_fbyte, Instruction, LuaEnv, LuaError, LuaResult, LuaVM, OpCode, OpMode,
};

/// Main entry point: load a chunk image and run its top-level function with
/// no arguments, with the standard libraries installed
pub fn execute(bytes: &[u8]) -> LuaResult<Vec<LuaValue>> {
    let mut vm = LuaVM::new();
    vm.open_libs();
    let closure = vm.load(bytes)?;
    vm.execute(&closure, &[])
}
