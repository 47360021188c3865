/// Words of one line, with the trailing background marker already removed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tokens {
    pub words: Vec<String>,
    pub background: bool,
}

/// One external or built-in command, ready to dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    /// Program name followed by its arguments; never empty.
    pub argv: Vec<String>,
    pub stdin: Option<String>,
    pub stdout: Option<String>,
    pub background: bool,
}

impl Command {
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Arguments after the program name.
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}
