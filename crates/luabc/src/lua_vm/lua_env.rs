// Global environment: an owned name -> value mapping seeded by the host,
// plus the bits of host state the standard library needs (RNG, output sink).

use std::io::{self, Write};

use ahash::AHashMap;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::lua_value::{CFunction, LuaValue};

pub struct LuaEnv {
    globals: AHashMap<String, LuaValue>,
    /// Backing state for math.random / math.randomseed
    pub(crate) rng: StdRng,
    /// Lua-to-Lua call nesting, guarded by the dispatcher
    pub(crate) call_depth: usize,
    output: Box<dyn Write>,
}

impl LuaEnv {
    pub fn new() -> Self {
        LuaEnv {
            globals: AHashMap::new(),
            rng: StdRng::from_entropy(),
            call_depth: 0,
            output: Box::new(io::stdout()),
        }
    }

    /// Redirect print output, e.g. into a buffer under test
    pub fn with_output(output: Box<dyn Write>) -> Self {
        LuaEnv {
            output,
            ..LuaEnv::new()
        }
    }

    /// Missing globals read as nil
    pub fn get_global(&self, name: &str) -> LuaValue {
        self.globals.get(name).cloned().unwrap_or(LuaValue::Nil)
    }

    pub fn set_global(&mut self, name: impl Into<String>, value: LuaValue) {
        let name = name.into();
        if value.is_nil() {
            self.globals.remove(&name);
        } else {
            self.globals.insert(name, value);
        }
    }

    /// Install a host callable under a global name
    pub fn register_global(&mut self, name: impl Into<String>, func: CFunction) {
        self.set_global(name, LuaValue::cfunction(func));
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn output(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }
}

impl Default for LuaEnv {
    fn default() -> Self {
        Self::new()
    }
}
