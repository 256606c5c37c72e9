// Math library
// Implements: abs, ceil, cos, exp, floor, fmod, log, max, min, pow, random,
// randomseed, sin, sqrt, tan, pi, huge

use rand::Rng;

use crate::lib_registry::{check_number, opt_number, LibraryModule};
use crate::lua_value::{LuaValue, MultiValue};
use crate::lua_vm::{LuaEnv, LuaError, LuaResult};

pub fn create_math_lib() -> LibraryModule {
    crate::lib_module!("math", {
        "abs" => math_abs,
        "ceil" => math_ceil,
        "cos" => math_cos,
        "exp" => math_exp,
        "floor" => math_floor,
        "fmod" => math_fmod,
        "log" => math_log,
        "max" => math_max,
        "min" => math_min,
        "pow" => math_pow,
        "random" => math_random,
        "randomseed" => math_randomseed,
        "sin" => math_sin,
        "sqrt" => math_sqrt,
        "tan" => math_tan,
    })
    .with_value("pi", LuaValue::Number(std::f64::consts::PI))
    .with_value("huge", LuaValue::Number(f64::INFINITY))
}

fn single(n: f64) -> LuaResult<MultiValue> {
    Ok(MultiValue::single(LuaValue::Number(n)))
}

fn math_abs(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    single(check_number("abs", args, 0)?.abs())
}

fn math_ceil(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    single(check_number("ceil", args, 0)?.ceil())
}

fn math_cos(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    single(check_number("cos", args, 0)?.cos())
}

fn math_exp(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    single(check_number("exp", args, 0)?.exp())
}

fn math_floor(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    single(check_number("floor", args, 0)?.floor())
}

fn math_fmod(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let x = check_number("fmod", args, 0)?;
    let y = check_number("fmod", args, 1)?;
    single(x % y)
}

fn math_log(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    single(check_number("log", args, 0)?.ln())
}

fn math_max(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let mut best = check_number("max", args, 0)?;
    for index in 1..args.len() {
        let value = check_number("max", args, index)?;
        if value > best {
            best = value;
        }
    }
    single(best)
}

fn math_min(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let mut best = check_number("min", args, 0)?;
    for index in 1..args.len() {
        let value = check_number("min", args, index)?;
        if value < best {
            best = value;
        }
    }
    single(best)
}

fn math_pow(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let x = check_number("pow", args, 0)?;
    let y = check_number("pow", args, 1)?;
    single(x.powf(y))
}

/// random() -> [0,1); random(m) -> 1..=m; random(m,n) -> m..=n
fn math_random(env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let r: f64 = env.rng.gen_range(0.0..1.0);
    match args.len() {
        0 => single(r),
        1 => {
            let upper = check_number("random", args, 0)?;
            if upper < 1.0 {
                return Err(LuaError::ArgumentError(
                    "bad argument #1 to 'random' (interval is empty)".to_string(),
                ));
            }
            single((r * upper).floor() + 1.0)
        }
        _ => {
            let lower = check_number("random", args, 0)?;
            let upper = check_number("random", args, 1)?;
            if lower > upper {
                return Err(LuaError::ArgumentError(
                    "bad argument #2 to 'random' (interval is empty)".to_string(),
                ));
            }
            single((r * (upper - lower + 1.0)).floor() + lower)
        }
    }
}

fn math_randomseed(env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    let seed = opt_number("randomseed", args, 0, 0.0)?;
    env.reseed(seed.floor() as i64 as u64);
    Ok(MultiValue::empty())
}

fn math_sin(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    single(check_number("sin", args, 0)?.sin())
}

fn math_sqrt(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    single(check_number("sqrt", args, 0)?.sqrt())
}

fn math_tan(_env: &mut LuaEnv, args: &[LuaValue]) -> LuaResult<MultiValue> {
    single(check_number("tan", args, 0)?.tan())
}
