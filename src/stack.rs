//! The value stack. The tail of the vector is the top.

use crate::error::{Error, Result};
use crate::value::Value;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Stack {
    values: Vec<Value>,
}

impl Stack {
    pub fn new() -> Self {
        Stack::default()
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Remove the last `n` values and return them in push order.
    /// Nothing is removed when the stack is too shallow.
    pub fn pop(&mut self, n: usize) -> Result<Vec<Value>> {
        self.require(n)?;
        Ok(self.values.split_off(self.values.len() - n))
    }

    /// Pop a single value
    pub fn pop_one(&mut self) -> Result<Value> {
        self.values
            .pop()
            .ok_or(Error::StackUnderflow { needed: 1, depth: 0 })
    }

    /// Read the `k`-th value from the top, `1` being the top itself
    pub fn peek(&self, k: usize) -> Result<&Value> {
        if k == 0 {
            return Err(Error::StackUnderflow {
                needed: 1,
                depth: self.depth(),
            });
        }
        self.require(k)?;
        Ok(&self.values[self.values.len() - k])
    }

    pub fn dup(&mut self) -> Result<()> {
        let top = self.peek(1)?.clone();
        self.push(top);
        Ok(())
    }

    /// Pop the top as an index `i`, then push a copy of the `i`-th value from the new top.
    pub fn dup_indexed(&mut self) -> Result<()> {
        let index = match self.peek(1)? {
            Value::Integer(n) => *n,
            other => {
                return Err(Error::type_op(
                    "dup2",
                    format!("index must be an integer, got {}", other.kind()),
                ))
            }
        };
        if index < 1 {
            return Err(Error::Index {
                offset: index,
                len: self.depth().saturating_sub(1),
            });
        }
        // check the depth below the index before touching anything
        let index = index as usize;
        self.require(index.saturating_add(1))?;
        self.values.pop();
        let copy = self.peek(index)?.clone();
        self.push(copy);
        Ok(())
    }

    pub fn swap(&mut self) -> Result<()> {
        self.require(2)?;
        let len = self.values.len();
        self.values.swap(len - 1, len - 2);
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values from bottom to top
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    fn require(&self, needed: usize) -> Result<()> {
        if self.values.len() < needed {
            Err(Error::StackUnderflow {
                needed,
                depth: self.values.len(),
            })
        } else {
            Ok(())
        }
    }
}
