use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use ucode::{serial::LoopbackOpener, Config, Program, Vm};

#[derive(Parser, Debug)]
#[command(name = "runner")]
#[command(about = "Run a ucode program")]
struct Args {
    /// Path to the program
    #[arg(default_value = "code.txt")]
    program: PathBuf,

    /// Serial port opened by `uinit` when the program names none
    #[arg(long, default_value = "2")]
    port: String,

    /// Start with line tracing enabled
    #[arg(long)]
    debug: bool,

    /// Log interpreter events to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if args.verbose { "ucode=debug" } else { "warn" })
    });
    fmt().with_env_filter(filter).with_target(false).init();

    let program = Program::from_file(&args.program)?;
    let config = Config {
        serial_port: args.port,
        debug: args.debug,
    };

    // no hardware driver here, so the serial port is an in-memory loopback
    let mut vm = Vm::new(program, config).with_serial(LoopbackOpener::new());
    vm.run()
        .with_context(|| format!("{} exited", args.program.display()))?;

    Ok(())
}
