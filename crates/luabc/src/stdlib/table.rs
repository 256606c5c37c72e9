// Table library
// Implements: concat, getn, insert, maxn, remove

use crate::lib_registry::{check_number, check_table, opt_number, require_arg, LibraryModule};
use crate::lua_value::{LuaValue, MultiValue};
use crate::lua_vm::{LuaEnv, LuaError, LuaResult};

pub fn create_table_lib() -> LibraryModule {
    crate::lib_module!("table", {
        "concat" => tab_concat,
        "getn" => tab_getn,
        "insert" => tab_insert,
        "maxn" => tab_maxn,
        "remove" => tab_remove,
    })
}

/// table.concat(t [, sep [, i [, j]]])
fn tab_concat(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let table = check_table("concat", args, 0)?;
    let sep = match args.get(1) {
        Some(value) if !value.is_nil() => value.concat_operand().map_err(|_| {
            LuaError::ArgumentError(format!(
                "bad argument #2 to 'concat' (string expected, got {})",
                value.type_name()
            ))
        })?,
        _ => String::new(),
    };
    let table = table.borrow();
    let first = opt_number("concat", args, 2, 1.0)? as i64;
    let last = opt_number("concat", args, 3, table.len() as f64)? as i64;

    let mut pieces = Vec::new();
    for index in first..=last {
        let value = table.get(&LuaValue::Number(index as f64));
        match value.concat_operand() {
            Ok(piece) => pieces.push(piece),
            Err(_) => {
                return Err(LuaError::TypeError(format!(
                    "invalid value (at index {index}) in table for 'concat'"
                )));
            }
        }
    }
    Ok(MultiValue::single(LuaValue::string(pieces.join(&sep))))
}

/// table.getn(t) - the border length
fn tab_getn(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let table = check_table("getn", args, 0)?;
    let len = table.borrow().len();
    Ok(MultiValue::single(LuaValue::Number(len as f64)))
}

/// table.insert(t, v) appends; table.insert(t, pos, v) shifts right
fn tab_insert(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let table = check_table("insert", args, 0)?;
    match args.len() {
        2 => {
            let value = require_arg("insert", args, 1)?.clone();
            let mut table = table.borrow_mut();
            let len = table.len();
            table.set(LuaValue::Number((len + 1) as f64), value);
        }
        _ => {
            let pos = check_number("insert", args, 1)?;
            let value = require_arg("insert", args, 2)?.clone();
            if pos < 1.0 {
                return Err(LuaError::ArgumentError(
                    "bad argument #2 to 'insert' (position out of bounds)".to_string(),
                ));
            }
            table.borrow_mut().insert_at(pos as usize - 1, value);
        }
    }
    Ok(MultiValue::empty())
}

/// table.maxn(t) - largest positive numeric key
fn tab_maxn(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let table = check_table("maxn", args, 0)?;
    let max = table.borrow().max_numeric_key();
    Ok(MultiValue::single(LuaValue::Number(max)))
}

/// table.remove(t [, pos]) - remove and return, default from the end
fn tab_remove(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let table = check_table("remove", args, 0)?;
    let mut table = table.borrow_mut();
    let len = table.len();
    if len == 0 {
        return Ok(MultiValue::single(LuaValue::Nil));
    }
    let pos = opt_number("remove", args, 1, len as f64)?;
    if pos < 1.0 {
        return Ok(MultiValue::single(LuaValue::Nil));
    }
    let removed = table.remove_at(pos as usize - 1);
    Ok(MultiValue::single(removed))
}
