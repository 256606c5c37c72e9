// Basic library (_G global functions)
// Implements: print, type, tostring, tonumber, assert, error, next, pairs,
// ipairs, select, unpack, pcall

use std::io::Write;

use crate::lib_registry::{check_number, check_table, require_arg, LibraryModule};
use crate::lua_value::{LuaValue, MultiValue};
use crate::lua_vm::{dispatcher, LuaEnv, LuaError, LuaResult};

pub fn create_basic_lib() -> LibraryModule {
    crate::lib_module!("_G", {
        "print" => lua_print,
        "type" => lua_type,
        "tostring" => lua_tostring,
        "tonumber" => lua_tonumber,
        "assert" => lua_assert,
        "error" => lua_error,
        "next" => lua_next,
        "pairs" => lua_pairs,
        "ipairs" => lua_ipairs,
        "select" => lua_select,
        "unpack" => lua_unpack,
        "pcall" => lua_pcall,
    })
}

/// print(...) - tab-separated stringification, newline at the end
fn lua_print(env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let line = args
        .iter()
        .map(LuaValue::to_string_repr)
        .collect::<Vec<_>>()
        .join("\t");
    let _ = writeln!(env.output(), "{line}");
    Ok(MultiValue::empty())
}

fn lua_type(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let value = require_arg("type", args, 0)?;
    Ok(MultiValue::single(LuaValue::string(value.type_name())))
}

fn lua_tostring(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let value = require_arg("tostring", args, 0)?;
    Ok(MultiValue::single(LuaValue::string(value.to_string_repr())))
}

fn lua_tonumber(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let value = require_arg("tonumber", args, 0)?;
    let result = match value.coerce_number() {
        Some(n) => LuaValue::Number(n),
        None => LuaValue::Nil,
    };
    Ok(MultiValue::single(result))
}

/// assert(v [, message]) - raise when v is falsy, pass everything through
/// otherwise
fn lua_assert(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let value = require_arg("assert", args, 0)?;
    if value.is_truthy() {
        return Ok(MultiValue::multiple(args.to_vec()));
    }
    let message = match args.get(1) {
        Some(message) if !message.is_nil() => message.to_string_repr(),
        _ => "assertion failed!".to_string(),
    };
    Err(LuaError::RuntimeError(message))
}

fn lua_error(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let message = args
        .first()
        .map(LuaValue::to_string_repr)
        .unwrap_or_else(|| "nil".to_string());
    Err(LuaError::RuntimeError(message))
}

/// next(t [, key]) - stateless iteration over the array part then the hash
/// part; returns nil past the last pair
fn lua_next(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let table = check_table("next", args, 0)?;
    let key = args.get(1).cloned().unwrap_or(LuaValue::Nil);
    match table.borrow().next(&key) {
        Some((k, v)) => Ok(MultiValue::multiple(vec![k, v])),
        None => Ok(MultiValue::single(LuaValue::Nil)),
    }
}

/// pairs(t) -> next, t, nil
fn lua_pairs(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let table = require_arg("pairs", args, 0)?;
    check_table("pairs", args, 0)?;
    Ok(MultiValue::multiple(vec![
        LuaValue::cfunction(lua_next),
        table.clone(),
        LuaValue::Nil,
    ]))
}

/// Iterator backing ipairs: (t, i) -> i+1, t[i+1] while non-nil
fn lua_inext(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let table = check_table("ipairs", args, 0)?;
    let index = check_number("ipairs", args, 1)? + 1.0;
    let value = table.borrow().get(&LuaValue::Number(index));
    if value.is_nil() {
        Ok(MultiValue::single(LuaValue::Nil))
    } else {
        Ok(MultiValue::multiple(vec![LuaValue::Number(index), value]))
    }
}

/// ipairs(t) -> iterator, t, 0
fn lua_ipairs(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let table = require_arg("ipairs", args, 0)?;
    check_table("ipairs", args, 0)?;
    Ok(MultiValue::multiple(vec![
        LuaValue::cfunction(lua_inext),
        table.clone(),
        LuaValue::Number(0.0),
    ]))
}

/// select('#', ...) or select(n, ...)
fn lua_select(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let selector = require_arg("select", args, 0)?;
    if let Some(s) = selector.as_string() {
        if s.as_str() == "#" {
            return Ok(MultiValue::single(LuaValue::Number(
                (args.len() - 1) as f64,
            )));
        }
    }
    let n = check_number("select", args, 0)?;
    if n < 1.0 {
        return Err(LuaError::ArgumentError(
            "bad argument #1 to 'select' (index out of range)".to_string(),
        ));
    }
    let start = n as usize;
    let rest = args.get(start..).unwrap_or(&[]).to_vec();
    Ok(MultiValue::multiple(rest))
}

/// unpack(t) - the array part 1..#t as multiple results
fn lua_unpack(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let table = check_table("unpack", args, 0)?;
    let table = table.borrow();
    let len = table.len();
    let values = (1..=len)
        .map(|i| table.get(&LuaValue::Number(i as f64)))
        .collect();
    Ok(MultiValue::multiple(values))
}

/// pcall(f, ...) - protected call; traps every error except VM invariant
/// violations
fn lua_pcall(env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let callee = require_arg("pcall", args, 0)?.clone();
    let call_args = args.get(1..).unwrap_or(&[]);
    match dispatcher::call_value(env, &callee, call_args) {
        Ok(mut results) => {
            let mut values = vec![LuaValue::Boolean(true)];
            values.append(&mut results);
            Ok(MultiValue::multiple(values))
        }
        Err(err @ LuaError::InternalError(_)) => Err(err),
        Err(err) => Ok(MultiValue::multiple(vec![
            LuaValue::Boolean(false),
            LuaValue::string(err.to_string()),
        ])),
    }
}
