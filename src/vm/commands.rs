//! Command implementations. Each one takes the optional raw argument of its line.
//!
//! Binary operators work on `top OP second`, where `second` is the value
//! pushed before `top`. Depth is checked before anything is removed, so an
//! underflow leaves the stack as it was, and so does a serial command run
//! before `uinit` or a bad `uwrite` count. Every other failure happens after
//! the operands were popped, and those operands stay consumed.

use std::{io::Write, thread, time::Duration};

use tracing::debug;

use super::{Flow, Vm};
use crate::{
    error::{Error, Result},
    registers::Registers,
    stack::Stack,
    token::Op,
    value::Value,
};

impl<W: Write> Vm<W> {
    /// Push the coerced argument
    pub(super) fn cmd_put(&mut self, arg: Option<&str>) -> Result<Flow> {
        let value = coerce_arg(Op::Put, arg)?;
        self.stack.push(value);
        Ok(Flow::Next)
    }

    pub(super) fn cmd_add(&mut self, _arg: Option<&str>) -> Result<Flow> {
        self.binary(Op::Add)
    }

    pub(super) fn cmd_sub(&mut self, _arg: Option<&str>) -> Result<Flow> {
        self.binary(Op::Sub)
    }

    pub(super) fn cmd_mul(&mut self, _arg: Option<&str>) -> Result<Flow> {
        self.binary(Op::Mul)
    }

    pub(super) fn cmd_div(&mut self, _arg: Option<&str>) -> Result<Flow> {
        self.binary(Op::Div)
    }

    pub(super) fn cmd_pow(&mut self, _arg: Option<&str>) -> Result<Flow> {
        self.binary(Op::Pow)
    }

    /// Push `top` when it is falsy, `second` otherwise
    pub(super) fn cmd_and(&mut self, _arg: Option<&str>) -> Result<Flow> {
        let mut operands = self.stack.pop(2)?;
        let (top, second) = (operands.remove(1), operands.remove(0));
        let result = if top.is_truthy() { second } else { top };
        self.push_literal(&result)
    }

    /// Push `top` when it is truthy, `second` otherwise
    pub(super) fn cmd_or(&mut self, _arg: Option<&str>) -> Result<Flow> {
        let mut operands = self.stack.pop(2)?;
        let (top, second) = (operands.remove(1), operands.remove(0));
        let result = if top.is_truthy() { top } else { second };
        self.push_literal(&result)
    }

    pub(super) fn cmd_dup(&mut self, _arg: Option<&str>) -> Result<Flow> {
        self.stack.dup()?;
        Ok(Flow::Next)
    }

    pub(super) fn cmd_dup2(&mut self, _arg: Option<&str>) -> Result<Flow> {
        self.stack.dup_indexed()?;
        Ok(Flow::Next)
    }

    pub(super) fn cmd_swap(&mut self, _arg: Option<&str>) -> Result<Flow> {
        self.stack.swap()?;
        Ok(Flow::Next)
    }

    /// Drop `n` values, one when no count is given
    pub(super) fn cmd_pop(&mut self, arg: Option<&str>) -> Result<Flow> {
        let count = match arg {
            Some(_) => int_arg(Op::Pop, arg)?,
            None => 1,
        };
        let count = usize::try_from(count)
            .map_err(|_| Error::type_op("pop", format!("negative count {}", count)))?;
        self.stack.pop(count)?;
        Ok(Flow::Next)
    }

    pub(super) fn cmd_sqrt(&mut self, _arg: Option<&str>) -> Result<Flow> {
        let value = self.stack.pop_one()?;
        let x = number("sqrt", &value)?;
        if x < 0.0 {
            return Err(Error::type_op("sqrt", format!("math domain error for {}", x)));
        }
        self.stack.push(Value::Float(x.sqrt()));
        Ok(Flow::Next)
    }

    pub(super) fn cmd_print(&mut self, _arg: Option<&str>) -> Result<Flow> {
        let value = self.stack.pop_one()?;
        writeln!(self.output, "{}", value)?;
        Ok(Flow::Next)
    }

    /// Pop a condition and jump by the argument when it is greater than zero
    pub(super) fn cmd_ifs(&mut self, arg: Option<&str>) -> Result<Flow> {
        let condition = self.stack.pop_one()?;
        if number("ifs", &condition)? > 0.0 {
            Ok(Flow::Jump(int_arg(Op::Ifs, arg)?))
        } else {
            Ok(Flow::Next)
        }
    }

    pub(super) fn cmd_dbg(&mut self, arg: Option<&str>) -> Result<Flow> {
        let value = coerce_arg(Op::Dbg, arg)?;
        self.debug = number("dbg", &value)? > 0.0;
        debug!(enabled = self.debug, "debug flag");
        Ok(Flow::Next)
    }

    /// Block for the argument in seconds
    pub(super) fn cmd_slp(&mut self, arg: Option<&str>) -> Result<Flow> {
        let value = coerce_arg(Op::Slp, arg)?;
        let seconds = duration("slp", &value)?;
        thread::sleep(seconds);
        Ok(Flow::Next)
    }

    pub(super) fn cmd_ior(&mut self, arg: Option<&str>) -> Result<Flow> {
        let value = self.ports.read(int_arg(Op::Ior, arg)?)?;
        self.stack.push(value);
        Ok(Flow::Next)
    }

    pub(super) fn cmd_iow(&mut self, _arg: Option<&str>) -> Result<Flow> {
        store(Op::Iow, &mut self.stack, &mut self.ports)
    }

    pub(super) fn cmd_bufr(&mut self, arg: Option<&str>) -> Result<Flow> {
        let value = self.buffer.read(int_arg(Op::Bufr, arg)?)?;
        self.stack.push(value);
        Ok(Flow::Next)
    }

    pub(super) fn cmd_bufw(&mut self, _arg: Option<&str>) -> Result<Flow> {
        store(Op::Bufw, &mut self.stack, &mut self.buffer)
    }

    /// Pop the timeout in seconds, then the baud rate, and open the serial
    /// port named by the argument or the configured default.
    pub(super) fn cmd_uinit(&mut self, arg: Option<&str>) -> Result<Flow> {
        let operands = self.stack.pop(2)?;
        let (timeout, baud) = (&operands[1], &operands[0]);

        let baud = baud
            .as_int()
            .and_then(|b| u32::try_from(b).ok())
            .filter(|b| *b > 0)
            .ok_or_else(|| Error::type_op("uinit", format!("invalid baud rate {}", baud)))?;
        let timeout = duration("uinit", timeout)?;
        let port = arg.unwrap_or(self.config.serial_port.as_str()).to_string();

        debug!(%port, baud, ?timeout, "opening serial port");
        self.serial = Some(self.opener.open(&port, baud, timeout)?);
        Ok(Flow::Next)
    }

    /// Poll one byte. Pushes the byte and `1`, or only `0` when nothing arrived.
    pub(super) fn cmd_uread(&mut self, _arg: Option<&str>) -> Result<Flow> {
        let port = self
            .serial
            .as_mut()
            .ok_or_else(|| Error::type_op("uread", "serial port is not initialized"))?;

        match port.read_byte()? {
            Some(byte) => {
                self.stack.push(Value::Str(char::from(byte).to_string()));
                self.stack.push(Value::Integer(1));
            }
            None => self.stack.push(Value::Integer(0)),
        }
        Ok(Flow::Next)
    }

    /// Pop a count `n` and `n` payload values and write them as bytes, the
    /// most recently pushed first.
    pub(super) fn cmd_uwrite(&mut self, _arg: Option<&str>) -> Result<Flow> {
        if self.serial.is_none() {
            return Err(Error::type_op("uwrite", "serial port is not initialized"));
        }

        let count = match self.stack.peek(1)? {
            Value::Integer(n) if *n >= 0 => *n as usize,
            other => return Err(Error::type_op("uwrite", format!("invalid count {}", other))),
        };
        if self.debug {
            writeln!(self.output, "uwrite m:{}", count)?;
        }

        let mut operands = self.stack.pop(count.saturating_add(1))?;
        operands.pop();
        let bytes = operands
            .iter()
            .rev()
            .map(to_byte)
            .collect::<Result<Vec<u8>>>()?;

        if let Some(port) = self.serial.as_mut() {
            port.write(&bytes)?;
        }
        Ok(Flow::Next)
    }

    /// Push a result through the literal path, the way `put` would
    fn push_literal(&mut self, value: &Value) -> Result<Flow> {
        let value = Value::coerce(&value.to_string())?;
        self.stack.push(value);
        Ok(Flow::Next)
    }

    /// Pop two numbers and push `top OP second`
    fn binary(&mut self, op: Op) -> Result<Flow> {
        let operands = self.stack.pop(2)?;
        let result = arith(op, &operands[1], &operands[0])?;
        self.stack.push(result);
        Ok(Flow::Next)
    }
}

/// Pop an offset (top) and a value and store the value in `registers`
fn store(op: Op, stack: &mut Stack, registers: &mut Registers) -> Result<Flow> {
    let mut operands = stack.pop(2)?;
    let offset = operands.remove(1);
    let data = operands.remove(0);

    let offset = offset
        .as_int()
        .ok_or_else(|| Error::type_op(op.name(), format!("offset must be an integer, got {}", offset)))?;
    registers.write(offset, data)?;
    Ok(Flow::Next)
}

fn arith(op: Op, top: &Value, second: &Value) -> Result<Value> {
    match (top, second) {
        (Value::Integer(a), Value::Integer(b)) => int_arith(op, *a, *b),
        _ => float_arith(op, number(op.name(), top)?, number(op.name(), second)?),
    }
}

fn int_arith(op: Op, a: i64, b: i64) -> Result<Value> {
    let result = match op {
        Op::Add => a.checked_add(b),
        Op::Sub => a.checked_sub(b),
        Op::Mul => a.checked_mul(b),
        Op::Pow if b >= 0 => u32::try_from(b).ok().and_then(|b| a.checked_pow(b)),
        _ => return float_arith(op, a as f64, b as f64),
    };
    result
        .map(Value::Integer)
        .ok_or_else(|| Error::type_op(op.name(), "integer overflow"))
}

fn float_arith(op: Op, a: f64, b: f64) -> Result<Value> {
    let result = match op {
        Op::Add => a + b,
        Op::Sub => a - b,
        Op::Mul => a * b,
        Op::Div => {
            if b == 0.0 {
                return Err(Error::type_op("div", "division by zero"));
            }
            a / b
        }
        Op::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(Error::type_op("pow", "zero cannot be raised to a negative power"));
            }
            let r = a.powf(b);
            if r.is_nan() && !a.is_nan() && !b.is_nan() {
                return Err(Error::type_op("pow", "result is not a real number"));
            }
            r
        }
        _ => return Err(Error::type_op(op.name(), "not an arithmetic command")),
    };
    Ok(Value::Float(result))
}

fn number(command: &'static str, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| Error::type_op(command, format!("expected a number, got {} '{}'", value.kind(), value)))
}

fn duration(command: &'static str, value: &Value) -> Result<Duration> {
    let seconds = number(command, value)?;
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| Error::type_op(command, format!("invalid duration {}", seconds)))
}

fn to_byte(value: &Value) -> Result<u8> {
    let byte = match value {
        Value::Integer(n) => u8::try_from(*n).ok(),
        Value::Str(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => u8::try_from(c).ok(),
                _ => None,
            }
        }
        Value::Float(_) => None,
    };
    byte.ok_or_else(|| Error::type_op("uwrite", format!("cannot write {} as a byte", value)))
}

fn required(op: Op, arg: Option<&str>) -> Result<&str> {
    arg.ok_or_else(|| Error::type_op(op.name(), "missing argument"))
}

fn coerce_arg(op: Op, arg: Option<&str>) -> Result<Value> {
    Value::coerce(required(op, arg)?)
}

fn int_arg(op: Op, arg: Option<&str>) -> Result<i64> {
    match coerce_arg(op, arg)? {
        Value::Integer(n) => Ok(n),
        other => Err(Error::type_op(
            op.name(),
            format!("expected an integer argument, got {} '{}'", other.kind(), other),
        )),
    }
}
