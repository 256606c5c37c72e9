// Lua 5.1 binary chunk deserializer.
//
// Consumes the image produced by the external compiler (luac 5.1,
// little-endian, 4-byte ints, 8-byte size_t, 8-byte doubles) and rebuilds
// the prototype tree. Bytes after the top-level prototype are ignored.

use std::rc::Rc;

use tracing::debug;

use super::{Chunk, LocVar, LuaValue};
use crate::lua_vm::{LuaError, LuaResult};

const CHUNK_MAGIC: &[u8; 4] = b"\x1bLua";
const VERSION_51: u8 = 0x51;

const TAG_NIL: u8 = 0;
const TAG_BOOLEAN: u8 = 1;
const TAG_NUMBER: u8 = 3;
const TAG_STRING: u8 = 4;

/// Parse a binary chunk image into its top-level prototype
pub fn load_chunk(data: &[u8]) -> LuaResult<Rc<Chunk>> {
    let mut reader = ChunkReader {
        data,
        pos: 0,
        proto_count: 0,
    };
    reader.read_header()?;
    let chunk = reader.read_function()?;
    debug!(
        source = %chunk.source_name,
        protos = reader.proto_count,
        instructions = chunk.code.len(),
        "chunk loaded"
    );
    Ok(Rc::new(chunk))
}

struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Prototypes are numbered in load order
    proto_count: usize,
}

impl ChunkReader<'_> {
    fn read(&mut self, len: usize) -> LuaResult<&[u8]> {
        let end = self.pos.checked_add(len).filter(|&end| end <= self.data.len());
        match end {
            Some(end) => {
                let bytes = &self.data[self.pos..end];
                self.pos = end;
                Ok(bytes)
            }
            None => Err(LuaError::LoadError(format!(
                "truncated stream at offset {}",
                self.pos
            ))),
        }
    }

    fn read_byte(&mut self) -> LuaResult<u8> {
        Ok(self.read(1)?[0])
    }

    fn read_bool(&mut self) -> LuaResult<bool> {
        Ok(self.read_byte()? != 0)
    }

    fn read_u32(&mut self) -> LuaResult<u32> {
        let b = self.read(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64(&mut self) -> LuaResult<u64> {
        let b = self.read(8)?;
        Ok(u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    fn read_f64(&mut self) -> LuaResult<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// size_t-prefixed bytes; non-empty strings carry a trailing NUL that is
    /// stripped here
    fn read_string(&mut self) -> LuaResult<String> {
        let len = self.read_u64()? as usize;
        if len == 0 {
            return Ok(String::new());
        }
        let mut bytes = self.read(len)?;
        if bytes.last() == Some(&0) {
            bytes = &bytes[..bytes.len() - 1];
        }
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn read_constant(&mut self) -> LuaResult<LuaValue> {
        let tag = self.read_byte()?;
        match tag {
            TAG_NIL => Ok(LuaValue::Nil),
            TAG_BOOLEAN => Ok(LuaValue::Boolean(self.read_bool()?)),
            TAG_NUMBER => Ok(LuaValue::Number(self.read_f64()?)),
            TAG_STRING => Ok(LuaValue::string(self.read_string()?)),
            other => Err(LuaError::LoadError(format!(
                "unknown constant tag {other}"
            ))),
        }
    }

    fn read_local(&mut self) -> LuaResult<LocVar> {
        Ok(LocVar {
            name: self.read_string()?,
            start_pc: self.read_u32()?,
            end_pc: self.read_u32()?,
        })
    }

    fn read_list<T>(
        &mut self,
        mut read_element: impl FnMut(&mut Self) -> LuaResult<T>,
    ) -> LuaResult<Vec<T>> {
        let count = self.read_u32()? as usize;
        let mut list = Vec::with_capacity(count.min(1 << 16));
        for _ in 0..count {
            list.push(read_element(self)?);
        }
        Ok(list)
    }

    fn read_function(&mut self) -> LuaResult<Chunk> {
        let proto_num = self.proto_count;
        self.proto_count += 1;

        Ok(Chunk {
            proto_num,
            source_name: self.read_string()?,
            first_line: self.read_u32()?,
            last_line: self.read_u32()?,
            num_upvalues: self.read_byte()?,
            num_params: self.read_byte()?,
            is_vararg: self.read_byte()?,
            max_stack_size: self.read_byte()? as usize,
            code: self.read_list(Self::read_u32)?,
            constants: self.read_list(Self::read_constant)?,
            protos: self
                .read_list(|reader| reader.read_function().map(Rc::new))?,
            line_info: self.read_list(Self::read_u32)?,
            locals: self.read_list(Self::read_local)?,
            upvalue_names: self.read_list(Self::read_string)?,
        })
    }

    /// 12-byte header; every platform parameter is pinned
    fn read_header(&mut self) -> LuaResult<()> {
        if self.read(4)? != CHUNK_MAGIC {
            return Err(LuaError::LoadError("not a compiled lua chunk".to_string()));
        }
        let version = self.read_byte()?;
        if version != VERSION_51 {
            return Err(LuaError::LoadError(format!(
                "wrong lua version 0x{version:02x} (expected lua 5.1)"
            )));
        }
        if self.read_byte()? != 0 {
            return Err(LuaError::LoadError(
                "not the official chunk format".to_string(),
            ));
        }
        if self.read_byte()? != 1 {
            return Err(LuaError::LoadError(
                "expected little-endian bytecode".to_string(),
            ));
        }
        self.expect_size("int", 4)?;
        self.expect_size("size_t", 8)?;
        self.expect_size("instruction", 4)?;
        self.expect_size("number", 8)?;
        if self.read_byte()? != 0 {
            return Err(LuaError::LoadError(
                "integral number format is not supported".to_string(),
            ));
        }
        Ok(())
    }

    fn expect_size(&mut self, what: &str, expected: u8) -> LuaResult<()> {
        let found = self.read_byte()?;
        if found != expected {
            return Err(LuaError::LoadError(format!(
                "expected {what} size {expected}, found {found}"
            )));
        }
        Ok(())
    }
}
