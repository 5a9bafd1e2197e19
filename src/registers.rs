//! Fixed-size register arrays

use crate::error::{Error, Result};
use crate::value::Value;

/// Number of slots in every register array
pub const SLOTS: usize = 32;

/// An index-addressed array of `SLOTS` values, zero at start.
/// The engine keeps two of them: the ports modelling external peripheral
/// state and the buffer used as scratch memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Registers {
    slots: Vec<Value>,
}

impl Default for Registers {
    fn default() -> Self {
        Registers {
            slots: vec![Value::Integer(0); SLOTS],
        }
    }
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, offset: i64) -> Result<Value> {
        let index = self.index(offset)?;
        Ok(self.slots[index].clone())
    }

    pub fn write(&mut self, offset: i64, value: Value) -> Result<()> {
        let index = self.index(offset)?;
        self.slots[index] = value;
        Ok(())
    }

    fn index(&self, offset: i64) -> Result<usize> {
        usize::try_from(offset)
            .ok()
            .filter(|i| *i < self.slots.len())
            .ok_or(Error::Index {
                offset,
                len: self.slots.len(),
            })
    }
}
