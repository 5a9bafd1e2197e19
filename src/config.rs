//! Interpreter configuration

/// Settings fixed before a run starts
#[derive(Debug, Clone)]
pub struct Config {
    /// Port handed to the serial opener when `uinit` has no argument
    pub serial_port: String,

    /// Initial state of the debug flag
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            serial_port: "2".to_string(),
            debug: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }
}
