//! UCODE is a small stack-based script engine for scripting digital I/O and a
//! serial port on microcontroller-class devices.
//!
//! # Example
//!
//! ```text
//! put 3
//! dup
//! print
//! put -1
//! add
//! dup
//! ifs -4
//! ```
//!
//! Prints `3`, `2` and `1`, then stops with `0` left on the stack.
//!
//! # Program format
//!
//! One command per line, optionally followed by a single argument token.
//! Blank lines do nothing. Argument tokens are coerced into values:
//!
//! - `0x1F` is a hexadecimal integer
//! - anything with a `.` is a float (`1.5`, `-0.25`)
//! - digits with an optional leading `-` are an integer
//! - everything else is a string
//!
//! # Commands
//!
//! Binary commands compute `top OP second`, so `put 5`, `put 2`, `sub` leaves `-3`.
//!
//! | Command | Usage        | Brief   |
//! |---------|--------------|---------|
//! | put     | put _value_  | Push `value`. |
//! | add     | add          | Pop two numbers and push their sum. |
//! | sub     | sub          | Pop two numbers and push `top - second`. |
//! | mul     | mul          | Pop two numbers and push their product. |
//! | div     | div          | Pop two numbers and push `top / second` as a float. |
//! | pow     | pow          | Pop two numbers and push `top ** second`. |
//! | and     | and          | Pop two values, push `top` if it is falsy, else `second`. |
//! | or      | or           | Pop two values, push `top` if it is truthy, else `second`. |
//! | sqrt    | sqrt         | Pop a non-negative number and push its square root. |
//! | dup     | dup          | Push a copy of the top value. |
//! | dup2    | dup2         | Pop an index `i` and push a copy of the `i`-th value from the top. |
//! | swap    | swap         | Exchange the top two values. |
//! | pop     | pop _[n]_    | Drop `n` values, one by default. |
//! | print   | print        | Pop a value and print it on its own line. |
//! | ifs     | ifs _offset_ | Pop a condition. If it is greater than zero, move `offset` lines relative to this one. |
//! | dbg     | dbg _flag_   | Turn line tracing on (`1`) or off (`0`). |
//! | slp     | slp _secs_   | Sleep for `secs` seconds. Fractions are allowed. |
//! | ior     | ior _offset_ | Push port register `offset`. |
//! | iow     | iow          | Pop an offset and a value and store the value in that port register. |
//! | bufr    | bufr _offset_ | Push buffer register `offset`. |
//! | bufw    | bufw         | Pop an offset and a value and store the value in that buffer register. |
//! | uinit   | uinit _[port]_ | Pop a timeout in seconds, then a baud rate, and open the serial port. |
//! | uread   | uread        | Poll one byte. Pushes the byte and `1`, or only `0`. |
//! | uwrite  | uwrite       | Pop a count `n` and `n` values and write them as bytes. |
//!
//! # Errors
//!
//! Every error is fatal. The run stops at the failing line and returns a [`Fault`].
//!
//! - Stack underflow: a command needs more values than the stack holds.
//! - Type or operation error: a string where a number is needed, a domain
//!   error such as `sqrt` of a negative number, or a serial command before `uinit`.
//! - Syntax error: an unknown command or more than one argument.
//! - Parse error: a malformed number such as `0xZZ` or `1.2.3`.
//! - Index error: a register offset outside `0..32` or a jump before the first line.

pub mod config;
pub mod error;
mod lexer;
pub mod program;
pub mod registers;
pub mod serial;
pub mod stack;
pub mod token;
pub mod value;
pub mod vm;

pub use config::Config;
pub use error::{Error, Fault, Result};
pub use program::Program;
pub use value::Value;
pub use vm::{Flow, State, Vm};
