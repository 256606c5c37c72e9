// Per-call register file.
//
// The registers are a plain vector; open upvalues never live inside the
// slots themselves. The aliasing relation is kept in a side table keyed by
// register index, deduplicated so sibling closures capturing the same local
// share one upvalue instance.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ahash::AHashMap;

use crate::lua_value::{LuaUpvalue, LuaValue};

pub struct LuaStack {
    registers: RefCell<Vec<LuaValue>>,
    /// One past the highest register written since the last explicit reset;
    /// the "top of stack" consumed by B=0 / C=0 call conventions
    top: Cell<usize>,
    open_upvalues: RefCell<AHashMap<usize, Rc<LuaUpvalue>>>,
}

impl LuaStack {
    pub fn new(max_stack_size: usize) -> Self {
        LuaStack {
            registers: RefCell::new(vec![LuaValue::Nil; max_stack_size]),
            top: Cell::new(0),
            open_upvalues: RefCell::new(AHashMap::new()),
        }
    }

    pub fn get(&self, index: usize) -> LuaValue {
        self.registers
            .borrow()
            .get(index)
            .cloned()
            .unwrap_or(LuaValue::Nil)
    }

    pub fn set(&self, index: usize, value: LuaValue) {
        let mut registers = self.registers.borrow_mut();
        if index >= registers.len() {
            // multi-result calls may spill past the declared frame size
            registers.resize(index + 1, LuaValue::Nil);
        }
        registers[index] = value;
        if index + 1 > self.top.get() {
            self.top.set(index + 1);
        }
    }

    /// Copy of the registers `start..top`
    pub fn slice_to_top(&self, start: usize) -> Vec<LuaValue> {
        let registers = self.registers.borrow();
        let top = self.top.get().min(registers.len());
        if start >= top {
            return Vec::new();
        }
        registers[start..top].to_vec()
    }

    pub fn top(&self) -> usize {
        self.top.get()
    }

    /// Override the notional top, used after calls and vararg expansion
    pub fn set_top(&self, top: usize) {
        self.top.set(top);
    }

    /// The open upvalue for a register, creating it on first capture
    pub fn open_upvalue(self: &Rc<Self>, index: usize) -> Rc<LuaUpvalue> {
        if let Some(existing) = self.open_upvalues.borrow().get(&index) {
            return Rc::clone(existing);
        }
        let upvalue = LuaUpvalue::new_open(Rc::clone(self), index);
        self.open_upvalues
            .borrow_mut()
            .insert(index, Rc::clone(&upvalue));
        upvalue
    }

    /// Close every open upvalue at register index >= `from`, moving the
    /// current register values into owned cells
    pub fn close_from(&self, from: usize) {
        let closing: Vec<Rc<LuaUpvalue>> = {
            let mut open = self.open_upvalues.borrow_mut();
            let indices: Vec<usize> = open.keys().copied().filter(|&i| i >= from).collect();
            indices
                .into_iter()
                .filter_map(|i| open.remove(&i))
                .collect()
        };
        // upvalue close reads the registers, so the map borrow is released
        for upvalue in closing {
            upvalue.close();
        }
    }
}
