use thiserror::Error;

/// Errors surfaced by the loader, the VM and host callables.
///
/// Every variant carries a ready-to-print single-line message. Runtime
/// errors raised inside a function are prefixed with `source:line:` by the
/// dispatcher before they unwind (see [`LuaError::located`]).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LuaError {
    /// Malformed or unsupported bytecode image
    #[error("load error: {0}")]
    LoadError(String),
    /// Operation applied to a value of the wrong type
    #[error("{0}")]
    TypeError(String),
    /// Bad argument passed to a host callable
    #[error("{0}")]
    ArgumentError(String),
    /// Error raised from Lua (`error`, failed `assert`, ...)
    #[error("{0}")]
    RuntimeError(String),
    /// VM invariant violation; a bug in the image or in the VM itself
    #[error("internal VM error: {0}")]
    InternalError(String),
}

pub type LuaResult<T> = Result<T, LuaError>;

impl LuaError {
    /// Prefix the message with `source:line:`. Used once, at the frame
    /// where the error originates; located errors pass through unwinding
    /// frames untouched.
    pub fn located(self, source: &str, line: Option<u32>) -> LuaError {
        let at = match line {
            Some(line) => format!("{source}:{line}: "),
            None => format!("{source}: "),
        };
        match self {
            LuaError::TypeError(msg) => LuaError::TypeError(format!("{at}{msg}")),
            LuaError::ArgumentError(msg) => LuaError::ArgumentError(format!("{at}{msg}")),
            LuaError::RuntimeError(msg) => LuaError::RuntimeError(format!("{at}{msg}")),
            other => other,
        }
    }

    /// The message without the variant framing.
    pub fn message(&self) -> &str {
        match self {
            LuaError::LoadError(msg)
            | LuaError::TypeError(msg)
            | LuaError::ArgumentError(msg)
            | LuaError::RuntimeError(msg)
            | LuaError::InternalError(msg) => msg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_located_prefixes_runtime_kinds() {
        let err = LuaError::RuntimeError("boom".to_string()).located("main.lua", Some(3));
        assert_eq!(err, LuaError::RuntimeError("main.lua:3: boom".to_string()));

        let err = LuaError::TypeError("attempt to call a nil value".to_string())
            .located("main.lua", None);
        assert_eq!(err.message(), "main.lua: attempt to call a nil value");
    }

    #[test]
    fn test_located_leaves_load_and_internal_alone() {
        let err = LuaError::LoadError("bad magic".to_string()).located("x", Some(1));
        assert_eq!(err, LuaError::LoadError("bad magic".to_string()));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            LuaError::LoadError("truncated stream".to_string()).to_string(),
            "load error: truncated stream"
        );
        assert_eq!(
            LuaError::RuntimeError("assertion failed!".to_string()).to_string(),
            "assertion failed!"
        );
    }
}
