// ABOUTME: Named command shortcuts for one-off tasks.
// ABOUTME: A shortcut is either a command line or an explicit argument list.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CommandShortcut {
    Line(String),
    Args(Vec<String>),
}

impl CommandShortcut {
    /// Arguments to pass as the container command override.
    pub fn to_args(&self) -> Vec<String> {
        match self {
            CommandShortcut::Line(line) => split_command_line(line),
            CommandShortcut::Args(args) => args.clone(),
        }
    }
}

/// Split a literal command line on whitespace. No shell quoting is applied;
/// use the list form of a shortcut for arguments containing spaces.
pub fn split_command_line(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}
