// Integration tests: programs are hand-assembled bytecode, the exact shape
// the external compiler would emit.

mod test_tables;

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use crate::lua_value::{Chunk, LuaValue};
use crate::lua_vm::{Instruction, LuaResult, LuaVM, OpCode};

pub(crate) fn abc(op: OpCode, a: u32, b: u32, c: u32) -> u32 {
    Instruction::encode_abc(op, a, b, c)
}

pub(crate) fn abx(op: OpCode, a: u32, bx: u32) -> u32 {
    Instruction::encode_abx(op, a, bx)
}

pub(crate) fn asbx(op: OpCode, a: u32, sbx: i32) -> u32 {
    Instruction::encode_asbx(op, a, sbx)
}

/// RK operand naming a constant
pub(crate) fn k(index: u32) -> u32 {
    Instruction::RK_CONST | index
}

pub(crate) struct ChunkBuilder {
    chunk: Chunk,
}

impl ChunkBuilder {
    pub fn new(max_stack: usize) -> Self {
        ChunkBuilder {
            chunk: Chunk {
                proto_num: 0,
                source_name: "@test.lua".to_string(),
                first_line: 0,
                last_line: 0,
                num_upvalues: 0,
                num_params: 0,
                is_vararg: 0,
                max_stack_size: max_stack,
                code: Vec::new(),
                constants: Vec::new(),
                protos: Vec::new(),
                line_info: Vec::new(),
                locals: Vec::new(),
                upvalue_names: Vec::new(),
            },
        }
    }

    pub fn params(mut self, count: u8) -> Self {
        self.chunk.num_params = count;
        self
    }

    pub fn vararg(mut self) -> Self {
        self.chunk.is_vararg = 2;
        self
    }

    pub fn upvalues(mut self, count: u8) -> Self {
        self.chunk.num_upvalues = count;
        self
    }

    pub fn source(mut self, name: &str) -> Self {
        self.chunk.source_name = name.to_string();
        self
    }

    pub fn constant(mut self, value: LuaValue) -> Self {
        self.chunk.constants.push(value);
        self
    }

    pub fn proto(mut self, proto: Chunk) -> Self {
        self.chunk.protos.push(Rc::new(proto));
        self
    }

    pub fn line_info(mut self, lines: Vec<u32>) -> Self {
        self.chunk.line_info = lines;
        self
    }

    pub fn code(mut self, code: Vec<u32>) -> Self {
        self.chunk.code = code;
        self
    }

    pub fn build(self) -> Chunk {
        self.chunk
    }
}

/// Print sink shared with the VM under test
#[derive(Clone, Default)]
pub(crate) struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl SharedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run a top-level chunk with the standard libraries installed
pub(crate) fn run(chunk: Chunk, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    let mut vm = LuaVM::new();
    vm.open_libs();
    let closure = Rc::new(crate::lua_value::LuaFunction::new(Rc::new(chunk), Vec::new()));
    vm.execute(&closure, args)
}

/// Run a chunk and capture what it printed
pub(crate) fn run_with_output(
    chunk: Chunk,
    args: &[LuaValue],
) -> (LuaResult<Vec<LuaValue>>, String) {
    let output = SharedOutput::default();
    let mut vm = LuaVM::with_output(Box::new(output.clone()));
    vm.open_libs();
    let closure = Rc::new(crate::lua_value::LuaFunction::new(Rc::new(chunk), Vec::new()));
    let result = vm.execute(&closure, args);
    (result, output.contents())
}
