//! Interpreter that runs a program line by line

mod commands;

use std::{
    collections::HashMap,
    io::{self, Write},
};

use tracing::{debug, info, trace};

use crate::{
    config::Config,
    error::{Error, Fault, Result},
    program::Program,
    registers::Registers,
    serial::{NoSerial, SerialOpener, SerialPort},
    stack::Stack,
    token::Op,
    value::Value,
};

/// What a command asks the loop to do with the cursor
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Flow {
    /// Advance to the next line
    Next,
    /// Move the cursor by a relative offset instead of advancing
    Jump(i64),
}

/// State of the interpreter after a step
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum State {
    Running,
    Halted,
}

type CommandFn<W> = fn(&mut Vm<W>, Option<&str>) -> Result<Flow>;

/// Interpreter state. One instance owns everything a run touches, so
/// independent interpreters can coexist.
pub struct Vm<W: Write = io::Stdout> {
    program: Program,
    cursor: usize,
    halted: bool,
    executed: usize,

    stack: Stack,
    ports: Registers,
    buffer: Registers,

    opener: Box<dyn SerialOpener>,
    serial: Option<Box<dyn SerialPort>>,

    config: Config,
    debug: bool,
    output: W,
    commands: HashMap<Op, CommandFn<W>>, // command table
}

impl Vm<io::Stdout> {
    /// Interpreter printing to stdout
    pub fn new(program: Program, config: Config) -> Self {
        Vm::with_output(program, config, io::stdout())
    }
}

impl<W: Write> Vm<W> {
    pub fn with_output(program: Program, config: Config, output: W) -> Self {
        let mut commands: HashMap<Op, CommandFn<W>> = HashMap::new();
        commands.insert(Op::Put, Self::cmd_put);
        commands.insert(Op::Add, Self::cmd_add);
        commands.insert(Op::Sub, Self::cmd_sub);
        commands.insert(Op::Mul, Self::cmd_mul);
        commands.insert(Op::Div, Self::cmd_div);
        commands.insert(Op::Pow, Self::cmd_pow);
        commands.insert(Op::And, Self::cmd_and);
        commands.insert(Op::Or, Self::cmd_or);
        commands.insert(Op::Dup, Self::cmd_dup);
        commands.insert(Op::Dup2, Self::cmd_dup2);
        commands.insert(Op::Swap, Self::cmd_swap);
        commands.insert(Op::Pop, Self::cmd_pop);
        commands.insert(Op::Sqrt, Self::cmd_sqrt);
        commands.insert(Op::Print, Self::cmd_print);
        commands.insert(Op::Ifs, Self::cmd_ifs);
        commands.insert(Op::Dbg, Self::cmd_dbg);
        commands.insert(Op::Slp, Self::cmd_slp);
        commands.insert(Op::Ior, Self::cmd_ior);
        commands.insert(Op::Iow, Self::cmd_iow);
        commands.insert(Op::Bufr, Self::cmd_bufr);
        commands.insert(Op::Bufw, Self::cmd_bufw);
        commands.insert(Op::Uinit, Self::cmd_uinit);
        commands.insert(Op::Uread, Self::cmd_uread);
        commands.insert(Op::Uwrite, Self::cmd_uwrite);

        Vm {
            program,
            cursor: 0,
            halted: false,
            executed: 0,
            stack: Stack::new(),
            ports: Registers::new(),
            buffer: Registers::new(),
            opener: Box::new(NoSerial),
            serial: None,
            debug: config.debug,
            config,
            output,
            commands,
        }
    }

    /// Use `opener` to open the transport when the program runs `uinit`
    pub fn with_serial(mut self, opener: impl SerialOpener + 'static) -> Self {
        self.opener = Box::new(opener);
        self
    }

    /// Run until the cursor leaves the program or a line fails.
    pub fn run(&mut self) -> std::result::Result<(), Fault> {
        while self.step()? == State::Running {}

        info!(lines = self.executed, "program finished");
        Ok(())
    }

    /// Execute the line under the cursor. A failure halts the interpreter for good.
    pub fn step(&mut self) -> std::result::Result<State, Fault> {
        if self.halted || self.cursor >= self.program.len() {
            self.halted = true;
            return Ok(State::Halted);
        }

        let line = self.cursor;
        let flow = self.exec_line(line).map_err(|error| self.fault(line, error))?;
        self.advance(flow).map_err(|error| self.fault(line, error))?;
        self.executed += 1;

        if self.cursor >= self.program.len() {
            self.halted = true;
            Ok(State::Halted)
        } else {
            Ok(State::Running)
        }
    }

    fn exec_line(&mut self, cursor: usize) -> Result<Flow> {
        let (op, arg) = match self.program.decode(cursor)? {
            Some(line) => (line.op, line.arg.map(str::to_string)),
            None => return Ok(Flow::Next),
        };
        trace!(cursor, command = op.name(), arg = arg.as_deref(), "exec");

        if self.debug {
            let text = self.program.text(cursor).unwrap_or_default().trim().to_string();
            writeln!(self.output, "DBG-> L{}-----------------------------", cursor)?;
            writeln!(self.output, "DBG-> line:{}", text)?;
            writeln!(self.output, "DBG-> before run stack:{}", self.stack_listing())?;
        }

        let command = self.commands[&op];
        let flow = command(self, arg.as_deref())?;

        if self.debug {
            writeln!(self.output, "DBG-> after run stack:{}", self.stack_listing())?;
        }

        Ok(flow)
    }

    fn advance(&mut self, flow: Flow) -> Result<()> {
        match flow {
            Flow::Next => self.cursor += 1,
            Flow::Jump(offset) => {
                let target = (self.cursor as i64).checked_add(offset).unwrap_or(-1);
                if target < 0 {
                    return Err(Error::Index {
                        offset: target,
                        len: self.program.len(),
                    });
                }
                debug!(from = self.cursor, to = target, "jump");
                self.cursor = target as usize;
            }
        }
        Ok(())
    }

    fn fault(&mut self, line: usize, error: Error) -> Fault {
        self.halted = true;
        Fault {
            line,
            text: self.program.text(line).unwrap_or_default().trim().to_string(),
            error,
        }
    }

    fn stack_listing(&self) -> String {
        let items: Vec<String> = self.stack.as_slice().iter().map(Value::to_string).collect();
        format!("[{}]", items.join(", "))
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn ports(&self) -> &Registers {
        &self.ports
    }

    /// Port registers mirror external peripherals, so the embedder may set them
    pub fn ports_mut(&mut self) -> &mut Registers {
        &mut self.ports
    }

    pub fn buffer(&self) -> &Registers {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn serial_bound(&self) -> bool {
        self.serial.is_some()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::{LoopbackOpener, LoopbackPort};
    use std::{cell::RefCell, rc::Rc, time::Duration};

    /// Remembers the arguments of every `open`
    #[derive(Default, Clone)]
    struct RecordingOpener {
        opened: Rc<RefCell<Vec<(String, u32, Duration)>>>,
    }

    impl SerialOpener for RecordingOpener {
        fn open(&mut self, port: &str, baud: u32, timeout: Duration) -> io::Result<Box<dyn SerialPort>> {
            self.opened.borrow_mut().push((port.to_string(), baud, timeout));
            Ok(Box::new(LoopbackPort::default()))
        }
    }

    fn load(lines: &[&str]) -> Vm<Vec<u8>> {
        let program: Program = lines.iter().collect();
        Vm::with_output(program, Config::new(), Vec::new())
    }

    fn run(lines: &[&str]) -> Vm<Vec<u8>> {
        let mut vm = load(lines);
        vm.run().unwrap();
        vm
    }

    fn run_err(lines: &[&str]) -> (Vm<Vec<u8>>, Fault) {
        let mut vm = load(lines);
        let fault = vm.run().unwrap_err();
        (vm, fault)
    }

    fn top(vm: &Vm<Vec<u8>>) -> Value {
        vm.stack().peek(1).unwrap().clone()
    }

    fn stack(vm: &Vm<Vec<u8>>) -> Vec<Value> {
        vm.stack().as_slice().to_vec()
    }

    fn output(vm: &Vm<Vec<u8>>) -> String {
        String::from_utf8(vm.output().clone()).unwrap()
    }

    #[test]
    fn add() {
        let vm = run(&["put 3", "put 4", "add"]);
        assert_eq!(stack(&vm), vec![Value::Integer(7)]);

        let vm = run(&["put 4", "put 3", "add"]);
        assert_eq!(top(&vm), Value::Integer(7));
    }

    #[test]
    fn sub_is_top_minus_second() {
        let vm = run(&["put 5", "put 2", "sub"]);
        assert_eq!(stack(&vm), vec![Value::Integer(-3)]);
    }

    #[test]
    fn div_and_pow_are_top_first() {
        let vm = run(&["put 2", "put 10", "div"]);
        assert_eq!(top(&vm), Value::Float(5.0));

        let vm = run(&["put 3", "put 2", "pow"]);
        assert_eq!(top(&vm), Value::Integer(8));

        let vm = run(&["put -1", "put 2", "pow"]);
        assert_eq!(top(&vm), Value::Float(0.5));
    }

    #[test]
    fn mixed_arithmetic_is_float() {
        let vm = run(&["put 1.5", "put 2", "mul"]);
        assert_eq!(top(&vm), Value::Float(3.0));

        let vm = run(&["put 0x10", "put 0.5", "add"]);
        assert_eq!(top(&vm), Value::Float(16.5));
    }

    #[test]
    fn sqrt() {
        let vm = run(&["put 4", "sqrt"]);
        assert_eq!(stack(&vm), vec![Value::Float(2.0)]);
    }

    #[test]
    fn dup_and_dup2() {
        let vm = run(&["put 10", "dup"]);
        assert_eq!(stack(&vm), vec![Value::Integer(10), Value::Integer(10)]);

        let vm = run(&["put 1", "put 2", "put 3", "put 2", "dup2"]);
        let expected: Vec<Value> = [1, 2, 3, 2].into_iter().map(Value::Integer).collect();
        assert_eq!(stack(&vm), expected);
    }

    #[test]
    fn swap_and_pop() {
        let vm = run(&["put 1", "put 2", "swap"]);
        assert_eq!(stack(&vm), vec![Value::Integer(2), Value::Integer(1)]);

        let vm = run(&["put 1", "put 2", "put 3", "pop"]);
        assert_eq!(stack(&vm).len(), 2);

        let vm = run(&["put 1", "put 2", "put 3", "pop 2"]);
        assert_eq!(stack(&vm), vec![Value::Integer(1)]);

        let (vm, fault) = run_err(&["put 1", "pop 2"]);
        assert!(matches!(fault.error, Error::StackUnderflow { needed: 2, depth: 1 }));
        assert_eq!(stack(&vm).len(), 1);
    }

    #[test]
    fn logical() {
        let vm = run(&["put 5", "put 0", "and"]);
        assert_eq!(top(&vm), Value::Integer(0));

        let vm = run(&["put 5", "put 7", "and"]);
        assert_eq!(top(&vm), Value::Integer(5));

        let vm = run(&["put 5", "put 0", "or"]);
        assert_eq!(top(&vm), Value::Integer(5));

        let vm = run(&["put 5", "put 7", "or"]);
        assert_eq!(top(&vm), Value::Integer(7));

        let vm = run(&["put 0", "put abc", "or"]);
        assert_eq!(top(&vm), Value::Str("abc".into()));
    }

    #[test]
    fn print_writes_canonical_lines() {
        let vm = run(&["put 0x0A", "print", "put 2.0", "print", "put hi", "print"]);
        assert_eq!(output(&vm), "10\n2.0\nhi\n");
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn ifs_not_taken() {
        let vm = run(&["put -1", "ifs 2", "put 1", "put 2"]);
        assert_eq!(stack(&vm), vec![Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn ifs_taken_skips_lines() {
        let vm = run(&["put 1", "ifs 2", "put 1", "put 2"]);
        assert_eq!(stack(&vm), vec![Value::Integer(2)]);
    }

    #[test]
    fn ifs_backwards_loop() {
        // count down from 3, printing each value
        let vm = run(&["put 3", "dup", "print", "put -1", "add", "dup", "ifs -4"]);
        assert_eq!(output(&vm), "3\n2\n1\n");
        assert_eq!(stack(&vm), vec![Value::Integer(0)]);
    }

    #[test]
    fn jump_past_end_completes() {
        let vm = run(&["put 1", "ifs 100", "put 5"]);
        assert!(vm.is_halted());
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn jump_before_start_fails() {
        let (_, fault) = run_err(&["put 1", "ifs -5"]);
        assert_eq!(fault.line, 1);
        assert!(matches!(fault.error, Error::Index { offset: -4, .. }));
    }

    #[test]
    fn unknown_command_halts() {
        let (vm, fault) = run_err(&["put 1", "foo", "put 2"]);
        assert_eq!(fault.line, 1);
        assert!(matches!(fault.error, Error::Syntax { .. }));
        assert_eq!(stack(&vm), vec![Value::Integer(1)]);
    }

    #[test]
    fn add_on_empty_stack_halts() {
        let (vm, fault) = run_err(&["add", "put 1"]);
        assert!(matches!(fault.error, Error::StackUnderflow { needed: 2, depth: 0 }));
        assert!(vm.stack().is_empty());
        assert_eq!(vm.cursor(), 0);
    }

    #[test]
    fn halted_vm_stays_halted() {
        let mut vm = load(&["foo", "put 1"]);
        assert!(vm.step().is_err());
        assert_eq!(vm.step().unwrap(), State::Halted);
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn step_by_step() {
        let mut vm = load(&["put 1", "", "put 2"]);
        assert_eq!(vm.step().unwrap(), State::Running);
        assert_eq!(vm.step().unwrap(), State::Running);
        assert_eq!(vm.cursor(), 2);
        assert_eq!(vm.step().unwrap(), State::Halted);
        assert_eq!(vm.stack().depth(), 2);
    }

    #[test]
    fn registers() {
        let vm = run(&["ior 0"]);
        assert_eq!(top(&vm), Value::Integer(0));

        let vm = run(&["put 42", "put 3", "iow", "ior 3"]);
        assert_eq!(stack(&vm), vec![Value::Integer(42)]);
        assert_eq!(vm.ports().read(3).unwrap(), Value::Integer(42));

        let vm = run(&["put 1.5", "put 31", "bufw", "bufr 31"]);
        assert_eq!(stack(&vm), vec![Value::Float(1.5)]);
        assert_eq!(vm.ports().read(31).unwrap(), Value::Integer(0));
    }

    #[test]
    fn register_out_of_range() {
        let (_, fault) = run_err(&["ior 32"]);
        assert!(matches!(fault.error, Error::Index { offset: 32, len: 32 }));

        let (vm, fault) = run_err(&["put 1", "put -1", "bufw"]);
        assert!(matches!(fault.error, Error::Index { .. }));
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn embedder_sets_ports() {
        let mut vm = load(&["ior 5", "print"]);
        vm.ports_mut().write(5, Value::Integer(0x55)).unwrap();
        vm.run().unwrap();
        assert_eq!(output(&vm), "85\n");
    }

    #[test]
    fn debug_trace() {
        let vm = run(&["dbg 1", "put 7", "dbg 0", "put 8"]);
        let out = output(&vm);
        assert!(out.contains("DBG-> line:put 7"));
        assert!(out.contains("DBG-> after run stack:[7]"));
        assert!(!out.contains("put 8"));
        assert!(!vm.debug());
    }

    #[test]
    fn negative_dbg_turns_tracing_off() {
        let vm = run(&["dbg 1", "dbg -1", "put 7"]);
        assert!(!vm.debug());
        assert!(!output(&vm).contains("put 7"));

        let (_, fault) = run_err(&["dbg on"]);
        assert!(matches!(fault.error, Error::TypeOperation { command: "dbg", .. }));
    }

    #[test]
    fn serial_round_trip() {
        let program: Program = ["put 9600", "put 1", "uinit", "put 0x41", "put 1", "uwrite", "uread", "uread"]
            .into_iter()
            .collect();
        let mut vm = Vm::with_output(program, Config::new(), Vec::new()).with_serial(LoopbackOpener::new());
        vm.run().unwrap();
        assert!(vm.serial_bound());
        assert_eq!(
            stack(&vm),
            vec![Value::Str("A".into()), Value::Integer(1), Value::Integer(0)]
        );
    }

    #[test]
    fn serial_before_uinit() {
        let (_, fault) = run_err(&["uread"]);
        assert!(matches!(fault.error, Error::TypeOperation { command: "uread", .. }));
    }

    #[test]
    fn missing_transport() {
        let (_, fault) = run_err(&["put 9600", "put 1", "uinit"]);
        assert!(matches!(fault.error, Error::Io(_)));
    }

    #[test]
    fn uinit_pops_timeout_then_baud() {
        let opener = RecordingOpener::default();
        let program: Program = ["put 9600", "put 1", "uinit", "put 115200", "put 0.5", "uinit 3"]
            .into_iter()
            .collect();
        let mut vm = Vm::with_output(program, Config::new(), Vec::new()).with_serial(opener.clone());
        vm.run().unwrap();

        assert_eq!(
            *opener.opened.borrow(),
            vec![
                ("2".to_string(), 9600, Duration::from_secs(1)),
                ("3".to_string(), 115200, Duration::from_millis(500)),
            ]
        );
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn uinit_rejects_float_baud() {
        let (_, fault) = run_err(&["put 9600.0", "put 1", "uinit"]);
        assert!(matches!(fault.error, Error::TypeOperation { command: "uinit", .. }));
    }

    #[test]
    fn hex_with_sign_fails() {
        let (vm, fault) = run_err(&["put 0x-5", "print"]);
        assert!(matches!(fault.error, Error::Parse { .. }));
        assert!(output(&vm).is_empty());
    }
}
