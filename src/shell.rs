//! Rendering of invocations into a single shell command line.

use crate::core::Invocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFlavor {
    /// `sh -c`
    Posix,
    /// `cmd.exe /C`
    Cmd,
}

impl ShellFlavor {
    pub fn native() -> Self {
        if cfg!(windows) {
            ShellFlavor::Cmd
        } else {
            ShellFlavor::Posix
        }
    }

    /// Program and leading argument used to hand a command line to the shell.
    pub fn launcher(self) -> (&'static str, &'static str) {
        match self {
            ShellFlavor::Posix => ("sh", "-c"),
            ShellFlavor::Cmd => ("cmd", "/C"),
        }
    }

    pub fn quote(self, arg: &str) -> String {
        match self {
            ShellFlavor::Posix => quote_posix(arg),
            ShellFlavor::Cmd => quote_cmd(arg),
        }
    }
}

/// Quote a single argument for `sh -c`.
/// - Empty strings become `''`
/// - Strings with shell metacharacters are wrapped in single quotes
/// - Embedded single quotes are escaped as `'\''`
pub fn quote_posix(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    const SHELL_META: &[char] = &[
        ' ', '\t', '\n', '\'', '"', '\\', '$', '`', '!', '*', '?', '[', ']', '(', ')', '{', '}',
        '<', '>', '|', '&', ';', '#', '~',
    ];

    if !arg.contains(SHELL_META) {
        return arg.to_string();
    }

    format!("'{}'", arg.replace('\'', "'\\''"))
}

/// Quote a single argument for `cmd /C`. Whitespace, cmd operators and `%`
/// force quoting; embedded double quotes are doubled. `%` is emitted outside
/// the quotes as `^%` so cmd does not expand it as a variable.
pub fn quote_cmd(arg: &str) -> String {
    if arg.is_empty() {
        return "\"\"".to_string();
    }

    const CMD_META: &[char] = &[' ', '\t', '&', '|', '<', '>', '^', '(', ')', '"', '%'];

    if !arg.contains(CMD_META) {
        return arg.to_string();
    }

    let quoted = arg.replace('"', "\"\"").replace('%', "\"^%\"");
    format!("\"{quoted}\"")
}

/// Raw argument string handed to `cmd.exe`. `/S` makes cmd strip exactly the
/// outer pair of quotes, leaving the rendered line untouched.
pub fn cmd_raw_args(command_line: &str) -> String {
    format!("/S /C \"{command_line}\"")
}

pub fn render(invocation: &Invocation, flavor: ShellFlavor) -> String {
    std::iter::once(&invocation.program)
        .chain(invocation.args.iter())
        .map(|part| flavor.quote(part))
        .collect::<Vec<_>>()
        .join(" ")
}
