// Lua table with the classic array/hash split
// - Array part stores values for integer keys [1..=array.len()]
// - Everything else lives in the hash part
// The split is observable through `#t` and the setlist opcode.

use ahash::AHashMap;

use super::LuaValue;

pub struct LuaTable {
    /// Values for integer keys 1..=array.len()
    array: Vec<LuaValue>,
    /// All non-array keys
    hash: AHashMap<LuaValue, LuaValue>,
}

impl LuaTable {
    pub fn new() -> Self {
        LuaTable {
            array: Vec::new(),
            hash: AHashMap::new(),
        }
    }

    /// Size hints come from `newtable`'s floating-byte operands
    pub fn with_capacity(array_hint: usize, hash_hint: usize) -> Self {
        LuaTable {
            array: Vec::with_capacity(array_hint),
            hash: AHashMap::with_capacity(hash_hint),
        }
    }

    /// An integer key belongs to the array part iff it is in range at the
    /// time of the access
    fn array_index(&self, key: &LuaValue) -> Option<usize> {
        let n = key.as_number()?;
        if n.fract() != 0.0 || n < 1.0 {
            return None;
        }
        let idx = n as usize;
        (idx <= self.array.len()).then(|| idx - 1)
    }

    pub fn get(&self, key: &LuaValue) -> LuaValue {
        if let Some(idx) = self.array_index(key) {
            return self.array[idx].clone();
        }
        self.hash.get(key).cloned().unwrap_or(LuaValue::Nil)
    }

    pub fn set(&mut self, key: LuaValue, value: LuaValue) {
        if let Some(idx) = self.array_index(&key) {
            self.array[idx] = value;
            return;
        }
        // extend the array by one at the boundary
        if let Some(n) = key.as_number() {
            if n.fract() == 0.0 && n >= 1.0 && n as usize == self.array.len() + 1 {
                self.array.push(value);
                return;
            }
        }
        if value.is_nil() {
            self.hash.remove(&key);
        } else {
            self.hash.insert(key, value);
        }
    }

    /// `#t`: the largest n such that t[1..=n] are all non-nil in the array
    /// part. Scanning from the front picks the lowest border when the array
    /// has holes; any border is a valid answer.
    pub fn len(&self) -> usize {
        self.array.iter().take_while(|v| !v.is_nil()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 && self.hash.is_empty()
    }

    /// Stateless iteration for `next`: the array part in index order, then
    /// the hash part. Returns the first pair after `key`, or None at the end.
    pub fn next(&self, key: &LuaValue) -> Option<(LuaValue, LuaValue)> {
        let array_start = if key.is_nil() {
            0
        } else if let Some(idx) = self.array_index(key) {
            idx + 1
        } else {
            return self.next_hash_entry(Some(key));
        };

        for (i, val) in self.array.iter().enumerate().skip(array_start) {
            if !val.is_nil() {
                return Some((LuaValue::Number((i + 1) as f64), val.clone()));
            }
        }
        self.next_hash_entry(None)
    }

    fn next_hash_entry(&self, after_key: Option<&LuaValue>) -> Option<(LuaValue, LuaValue)> {
        let mut iter = self.hash.iter();
        if let Some(key) = after_key {
            // skip up to and including the given key
            for (k, _) in iter.by_ref() {
                if k == key {
                    break;
                }
            }
        }
        iter.next().map(|(k, v)| (k.clone(), v.clone()))
    }

    /// `table.insert(t, pos, v)`: shift array elements right
    pub fn insert_at(&mut self, pos: usize, value: LuaValue) {
        let len = self.len();
        if pos >= len + 1 {
            self.set(LuaValue::Number(pos as f64 + 1.0), value);
            return;
        }
        self.array.insert(pos, value);
    }

    /// `table.remove(t, pos)`: shift array elements left
    pub fn remove_at(&mut self, pos: usize) -> LuaValue {
        if pos >= self.array.len() {
            return LuaValue::Nil;
        }
        self.array.remove(pos)
    }

    /// Largest positive numeric key, for `table.maxn`
    pub fn max_numeric_key(&self) -> f64 {
        let mut max = self.array.len() as f64;
        for key in self.hash.keys() {
            if let Some(n) = key.as_number() {
                if n > max {
                    max = n;
                }
            }
        }
        max
    }
}

impl Default for LuaTable {
    fn default() -> Self {
        Self::new()
    }
}
