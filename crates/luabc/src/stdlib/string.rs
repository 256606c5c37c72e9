// String library
// Implements: byte, char, find, len, lower, rep, reverse, sub, upper
// Pattern matching and string.format are out of scope; find is a plain
// substring search.

use crate::lib_registry::{check_number, check_string, opt_number, LibraryModule};
use crate::lua_value::{LuaValue, MultiValue};
use crate::lua_vm::{LuaEnv, LuaResult};

pub fn create_string_lib() -> LibraryModule {
    crate::lib_module!("string", {
        "byte" => str_byte,
        "char" => str_char,
        "find" => str_find,
        "len" => str_len,
        "lower" => str_lower,
        "rep" => str_rep,
        "reverse" => str_reverse,
        "sub" => str_sub,
        "upper" => str_upper,
    })
}

fn single_str(s: String) -> LuaResult<MultiValue> {
    Ok(MultiValue::single(LuaValue::string(s)))
}

/// Resolve a 1-based, possibly negative, string position
fn str_position(pos: f64, len: usize) -> i64 {
    let pos = pos as i64;
    if pos >= 0 {
        pos
    } else {
        len as i64 + pos + 1
    }
}

/// string.byte(s [, i]) - numeric byte at position i (default 1)
fn str_byte(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let s = check_string("byte", args, 0)?;
    let i = str_position(opt_number("byte", args, 1, 1.0)?, s.len());
    if i < 1 || i as usize > s.len() {
        return Ok(MultiValue::empty());
    }
    Ok(MultiValue::single(LuaValue::Number(
        s.as_bytes()[i as usize - 1] as f64,
    )))
}

/// string.char(...) - build a string from byte values
fn str_char(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let mut bytes = Vec::with_capacity(args.len());
    for index in 0..args.len() {
        bytes.push(check_number("char", args, index)? as u8);
    }
    single_str(String::from_utf8_lossy(&bytes).into_owned())
}

/// string.find(s, needle [, init]) - plain substring search, 1-based
/// inclusive span or nil
fn str_find(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let s = check_string("find", args, 0)?;
    let needle = check_string("find", args, 1)?;
    let init = str_position(opt_number("find", args, 2, 1.0)?, s.len()).max(1) as usize - 1;

    if init > s.len() {
        return Ok(MultiValue::single(LuaValue::Nil));
    }
    if needle.is_empty() {
        return Ok(MultiValue::multiple(vec![
            LuaValue::Number((init + 1) as f64),
            LuaValue::Number(init as f64),
        ]));
    }

    let haystack = &s.as_bytes()[init..];
    let found = haystack
        .windows(needle.len())
        .position(|window| window == needle.as_bytes());
    match found {
        Some(offset) => {
            let start = init + offset + 1;
            let end = start + needle.len() - 1;
            Ok(MultiValue::multiple(vec![
                LuaValue::Number(start as f64),
                LuaValue::Number(end as f64),
            ]))
        }
        None => Ok(MultiValue::single(LuaValue::Nil)),
    }
}

fn str_len(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let s = check_string("len", args, 0)?;
    Ok(MultiValue::single(LuaValue::Number(s.len() as f64)))
}

fn str_lower(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    single_str(check_string("lower", args, 0)?.as_str().to_lowercase())
}

/// string.rep(s, n) - n copies, empty for n <= 0
fn str_rep(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let s = check_string("rep", args, 0)?;
    let n = check_number("rep", args, 1)?;
    if n < 1.0 {
        return single_str(String::new());
    }
    single_str(s.as_str().repeat(n as usize))
}

fn str_reverse(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let s = check_string("reverse", args, 0)?;
    single_str(s.as_str().chars().rev().collect())
}

/// string.sub(s, i [, j]) - 1-based inclusive slice; negative positions
/// count from the end
fn str_sub(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let s = check_string("sub", args, 0)?;
    let len = s.len();
    let start = str_position(check_number("sub", args, 1)?, len).max(1) as usize;
    let end = str_position(opt_number("sub", args, 2, -1.0)?, len).min(len as i64);

    if end < start as i64 {
        return single_str(String::new());
    }
    let bytes = &s.as_bytes()[start - 1..end as usize];
    single_str(String::from_utf8_lossy(bytes).into_owned())
}

fn str_upper(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    single_str(check_string("upper", args, 0)?.as_str().to_uppercase())
}
