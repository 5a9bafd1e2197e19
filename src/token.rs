/// Commands understood by the engine
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Op {
    Put,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    And,
    Or,
    Dup,
    Dup2,
    Swap,
    Pop,
    Sqrt,
    Print,
    Ifs,
    Dbg,
    Slp,
    Ior,
    Iow,
    Bufr,
    Bufw,
    Uinit,
    Uread,
    Uwrite,
}

impl Op {
    pub const ALL: [Op; 24] = [
        Op::Put,
        Op::Add,
        Op::Sub,
        Op::Mul,
        Op::Div,
        Op::Pow,
        Op::And,
        Op::Or,
        Op::Dup,
        Op::Dup2,
        Op::Swap,
        Op::Pop,
        Op::Sqrt,
        Op::Print,
        Op::Ifs,
        Op::Dbg,
        Op::Slp,
        Op::Ior,
        Op::Iow,
        Op::Bufr,
        Op::Bufw,
        Op::Uinit,
        Op::Uread,
        Op::Uwrite,
    ];

    /// Look up a command by its source name. Names are case sensitive.
    pub fn new(name: &str) -> Option<Self> {
        Op::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Op::Put => "put",
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::Pow => "pow",
            Op::And => "and",
            Op::Or => "or",
            Op::Dup => "dup",
            Op::Dup2 => "dup2",
            Op::Swap => "swap",
            Op::Pop => "pop",
            Op::Sqrt => "sqrt",
            Op::Print => "print",
            Op::Ifs => "ifs",
            Op::Dbg => "dbg",
            Op::Slp => "slp",
            Op::Ior => "ior",
            Op::Iow => "iow",
            Op::Bufr => "bufr",
            Op::Bufw => "bufw",
            Op::Uinit => "uinit",
            Op::Uread => "uread",
            Op::Uwrite => "uwrite",
        }
    }
}
