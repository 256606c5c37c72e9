// Library registration: host callables grouped into named modules and
// installed into the global environment.

use std::cell::RefCell;
use std::rc::Rc;

use crate::lua_value::{CFunction, LuaTable, LuaValue};
use crate::lua_vm::{LuaEnv, LuaError, LuaResult};
use crate::stdlib;

/// A library module: named functions plus named constants
pub struct LibraryModule {
    pub name: &'static str,
    pub functions: Vec<(&'static str, CFunction)>,
    pub values: Vec<(&'static str, LuaValue)>,
}

impl LibraryModule {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            functions: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn with_function(mut self, name: &'static str, func: CFunction) -> Self {
        self.functions.push((name, func));
        self
    }

    pub fn with_value(mut self, name: &'static str, value: LuaValue) -> Self {
        self.values.push((name, value));
        self
    }
}

#[macro_export]
macro_rules! lib_module {
    ($name:expr, {
        $($func_name:expr => $func:expr),* $(,)?
    }) => {{
        let mut module = $crate::lib_registry::LibraryModule::new($name);
        $(
            module.functions.push(($func_name, $func));
        )*
        module
    }};
}

/// Registry for the standard libraries
pub struct LibraryRegistry {
    modules: Vec<LibraryModule>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    pub fn register(&mut self, module: LibraryModule) {
        self.modules.push(module);
    }

    /// Install every registered module into the environment. Members of
    /// "_G" become plain globals; other modules become a global table.
    pub fn load_all(&self, env: &mut LuaEnv) {
        for module in &self.modules {
            if module.name == "_G" {
                for &(name, func) in &module.functions {
                    env.register_global(name, func);
                }
                for (name, value) in &module.values {
                    env.set_global(*name, value.clone());
                }
            } else {
                let table = Rc::new(RefCell::new(LuaTable::new()));
                {
                    let mut table = table.borrow_mut();
                    for &(name, func) in &module.functions {
                        table.set(LuaValue::string(name), LuaValue::cfunction(func));
                    }
                    for (name, value) in &module.values {
                        table.set(LuaValue::string(*name), value.clone());
                    }
                }
                env.set_global(module.name, LuaValue::Table(table));
            }
        }
    }
}

impl Default for LibraryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The standard registry expected by the host API surface
pub fn create_standard_registry() -> LibraryRegistry {
    let mut registry = LibraryRegistry::new();
    registry.register(stdlib::basic::create_basic_lib());
    registry.register(stdlib::math::create_math_lib());
    registry.register(stdlib::string::create_string_lib());
    registry.register(stdlib::table::create_table_lib());
    registry
}

// ---- argument helpers shared by the stdlib modules ----

pub fn get_arg<'a>(args: &'a [LuaValue], index: usize) -> Option<&'a LuaValue> {
    args.get(index).filter(|value| !value.is_nil())
}

/// Argument that must be present (may still be any type)
pub fn require_arg<'a>(
    func_name: &str,
    args: &'a [LuaValue],
    index: usize,
) -> LuaResult<&'a LuaValue> {
    args.get(index).ok_or_else(|| {
        LuaError::ArgumentError(format!(
            "bad argument #{} to '{}' (value expected)",
            index + 1,
            func_name
        ))
    })
}

fn type_mismatch(func_name: &str, index: usize, expected: &str, got: &str) -> LuaError {
    LuaError::ArgumentError(format!(
        "bad argument #{} to '{}' ({} expected, got {})",
        index + 1,
        func_name,
        expected,
        got
    ))
}

fn got_name(args: &[LuaValue], index: usize) -> &'static str {
    match args.get(index) {
        Some(value) => value.type_name(),
        None => "no value",
    }
}

pub fn check_number(func_name: &str, args: &[LuaValue], index: usize) -> LuaResult<f64> {
    args.get(index)
        .and_then(LuaValue::as_number)
        .ok_or_else(|| type_mismatch(func_name, index, "number", got_name(args, index)))
}

pub fn check_string(
    func_name: &str,
    args: &[LuaValue],
    index: usize,
) -> LuaResult<Rc<crate::lua_value::LuaString>> {
    args.get(index)
        .and_then(LuaValue::as_string)
        .ok_or_else(|| type_mismatch(func_name, index, "string", got_name(args, index)))
}

pub fn check_table(
    func_name: &str,
    args: &[LuaValue],
    index: usize,
) -> LuaResult<Rc<RefCell<LuaTable>>> {
    args.get(index)
        .and_then(LuaValue::as_table)
        .ok_or_else(|| type_mismatch(func_name, index, "table", got_name(args, index)))
}

/// Optional argument: nil and absent both fall back to the default
pub fn opt_number(
    func_name: &str,
    args: &[LuaValue],
    index: usize,
    default: f64,
) -> LuaResult<f64> {
    match get_arg(args, index) {
        None => Ok(default),
        Some(value) => value
            .as_number()
            .ok_or_else(|| type_mismatch(func_name, index, "number", value.type_name())),
    }
}
