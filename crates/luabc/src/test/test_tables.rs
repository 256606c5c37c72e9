// Table construction, access, setlist and method calls

use super::*;
use crate::lua_value::LuaValue;
use crate::lua_vm::OpCode;

#[test]
fn test_table_length_and_append() {
    // local t = {}
    // for i = 1, 5 do t[i] = i*i end
    // print(#t, t[3])
    let chunk = ChunkBuilder::new(6)
        .constant(LuaValue::Number(1.0))
        .constant(LuaValue::Number(5.0))
        .constant(LuaValue::Number(3.0))
        .constant(LuaValue::string("print"))
        .code(vec![
            abc(OpCode::NewTable, 0, 0, 0),
            abx(OpCode::LoadK, 1, 0),
            abx(OpCode::LoadK, 2, 1),
            abx(OpCode::LoadK, 3, 0),
            asbx(OpCode::ForPrep, 1, 2),
            abc(OpCode::Mul, 5, 4, 4),
            abc(OpCode::SetTable, 0, 4, 5),
            asbx(OpCode::ForLoop, 1, -3),
            abx(OpCode::GetGlobal, 1, 3),
            abc(OpCode::Len, 2, 0, 0),
            abc(OpCode::GetTable, 3, 0, k(2)),
            abc(OpCode::Call, 1, 3, 1),
            abc(OpCode::Return, 0, 1, 0),
        ])
        .build();

    let (result, output) = run_with_output(chunk, &[]);
    assert!(result.is_ok(), "{result:?}");
    assert_eq!(output, "5\t9\n");
}

#[test]
fn test_setlist_fills_array_block() {
    // return #t, t[3] for t = {1, 4, 9, 16, 25}
    let chunk = ChunkBuilder::new(8)
        .constant(LuaValue::Number(1.0))
        .constant(LuaValue::Number(4.0))
        .constant(LuaValue::Number(9.0))
        .constant(LuaValue::Number(16.0))
        .constant(LuaValue::Number(25.0))
        .constant(LuaValue::Number(3.0))
        .code(vec![
            abc(OpCode::NewTable, 0, 5, 0),
            abx(OpCode::LoadK, 1, 0),
            abx(OpCode::LoadK, 2, 1),
            abx(OpCode::LoadK, 3, 2),
            abx(OpCode::LoadK, 4, 3),
            abx(OpCode::LoadK, 5, 4),
            abc(OpCode::SetList, 0, 5, 1),
            abc(OpCode::Len, 6, 0, 0),
            abc(OpCode::GetTable, 7, 0, k(5)),
            abc(OpCode::Return, 6, 3, 0),
        ])
        .build();

    let results = run(chunk, &[]).unwrap();
    assert_eq!(results[0].as_number(), Some(5.0));
    assert_eq!(results[1].as_number(), Some(9.0));
}

#[test]
fn test_setlist_b0_flushes_through_top() {
    // the element count comes from the top of stack
    let chunk = ChunkBuilder::new(5)
        .constant(LuaValue::Number(7.0))
        .constant(LuaValue::Number(8.0))
        .constant(LuaValue::Number(9.0))
        .code(vec![
            abc(OpCode::NewTable, 0, 0, 0),
            abx(OpCode::LoadK, 1, 0),
            abx(OpCode::LoadK, 2, 1),
            abx(OpCode::LoadK, 3, 2),
            abc(OpCode::SetList, 0, 0, 1),
            abc(OpCode::Len, 1, 0, 0),
            abc(OpCode::Return, 1, 2, 0),
        ])
        .build();

    let results = run(chunk, &[]).unwrap();
    assert_eq!(results[0].as_number(), Some(3.0));
}

#[test]
fn test_setlist_extended_c_reads_next_word() {
    // C = 0: the following raw word is the real block index (2 -> base 50)
    let chunk = ChunkBuilder::new(3)
        .constant(LuaValue::Number(99.0))
        .constant(LuaValue::Number(51.0))
        .code(vec![
            abc(OpCode::NewTable, 0, 0, 0),
            abx(OpCode::LoadK, 1, 0),
            abc(OpCode::SetList, 0, 1, 0),
            2, // raw extension word, not an instruction
            abc(OpCode::GetTable, 2, 0, k(1)),
            abc(OpCode::Return, 2, 2, 0),
        ])
        .build();

    let results = run(chunk, &[]).unwrap();
    assert_eq!(results[0].as_number(), Some(99.0));
}

#[test]
fn test_setlist_missing_extension_word_is_internal_error() {
    let chunk = ChunkBuilder::new(2)
        .constant(LuaValue::Number(1.0))
        .code(vec![
            abc(OpCode::NewTable, 0, 0, 0),
            abx(OpCode::LoadK, 1, 0),
            abc(OpCode::SetList, 0, 1, 0),
        ])
        .build();

    let err = run(chunk, &[]).unwrap_err();
    assert!(matches!(err, crate::LuaError::InternalError(_)), "{err:?}");
}

#[test]
fn test_self_method_call() {
    // local t = {}; t.greet = function(self) return 42 end
    // return t:greet()
    let method = ChunkBuilder::new(2)
        .params(1)
        .constant(LuaValue::Number(42.0))
        .code(vec![
            abx(OpCode::LoadK, 1, 0),
            abc(OpCode::Return, 1, 2, 0),
        ])
        .build();

    let chunk = ChunkBuilder::new(3)
        .constant(LuaValue::string("greet"))
        .proto(method)
        .code(vec![
            abc(OpCode::NewTable, 0, 0, 1),
            abx(OpCode::Closure, 1, 0),
            abc(OpCode::SetTable, 0, k(0), 1),
            abc(OpCode::Self_, 1, 0, k(0)),
            abc(OpCode::Call, 1, 2, 2),
            abc(OpCode::Return, 1, 2, 0),
        ])
        .build();

    let results = run(chunk, &[]).unwrap();
    assert_eq!(results[0].as_number(), Some(42.0));
}

#[test]
fn test_hash_and_array_keys_coexist() {
    // t = {}; t.x = 1; t[1] = 2; return t.x, t[1], #t
    let chunk = ChunkBuilder::new(4)
        .constant(LuaValue::string("x"))
        .constant(LuaValue::Number(1.0))
        .constant(LuaValue::Number(2.0))
        .code(vec![
            abc(OpCode::NewTable, 0, 0, 0),
            abc(OpCode::SetTable, 0, k(0), k(1)),
            abc(OpCode::SetTable, 0, k(1), k(2)),
            abc(OpCode::GetTable, 1, 0, k(0)),
            abc(OpCode::GetTable, 2, 0, k(1)),
            abc(OpCode::Len, 3, 0, 0),
            abc(OpCode::Return, 1, 4, 0),
        ])
        .build();

    let results = run(chunk, &[]).unwrap();
    assert_eq!(results[0].as_number(), Some(1.0));
    assert_eq!(results[1].as_number(), Some(2.0));
    assert_eq!(results[2].as_number(), Some(1.0));
}

#[test]
fn test_indexing_non_table_fails() {
    let chunk = ChunkBuilder::new(2)
        .constant(LuaValue::Number(5.0))
        .code(vec![
            abx(OpCode::LoadK, 0, 0),
            abc(OpCode::GetTable, 1, 0, k(0)),
            abc(OpCode::Return, 1, 2, 0),
        ])
        .build();

    let err = run(chunk, &[]).unwrap_err();
    assert!(
        err.message().contains("attempt to index a number value"),
        "{err:?}"
    );
}

#[test]
fn test_storing_nil_removes_hash_key() {
    // t.x = 1; t.x = nil; return t.x
    let chunk = ChunkBuilder::new(3)
        .constant(LuaValue::string("x"))
        .constant(LuaValue::Number(1.0))
        .code(vec![
            abc(OpCode::NewTable, 0, 0, 0),
            abc(OpCode::SetTable, 0, k(0), k(1)),
            abc(OpCode::LoadNil, 1, 1, 0),
            abc(OpCode::SetTable, 0, k(0), 1),
            abc(OpCode::GetTable, 2, 0, k(0)),
            abc(OpCode::Return, 2, 2, 0),
        ])
        .build();

    let results = run(chunk, &[]).unwrap();
    assert!(results[0].is_nil());
}
