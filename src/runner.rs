//! Side effects of executing an action.
//!
//! Every action ends in exactly one [`Launch`]: spawning a program, or asking
//! the OS scripting bridge to drive an application. Actions describe the
//! launch and hand it to a [`CommandRunner`], which keeps process spawning in
//! one place and lets tests record launches instead of performing them.

use std::{
    ffi::OsString,
    fmt::{Display, Formatter, Result as FmtResult},
    io,
    path::Path,
    process::{Command, Stdio},
};

use tracing::info;

/// Program used to open files, folders and URLs with their default handler.
#[cfg(target_os = "macos")]
pub const OPEN_PROGRAM: &str = "open";
#[cfg(not(target_os = "macos"))]
pub const OPEN_PROGRAM: &str = "xdg-open";

/// A single side effect to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launch {
    /// Spawn `program` with `args`
    Command {
        program: String,
        args: Vec<OsString>,
    },

    /// Run an `AppleScript` source through `osascript`
    AppleScript(String),
}

impl Launch {
    /// Spawn `program` with the given arguments.
    pub fn command<I, A>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self::Command {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Open a path with its default handler (Finder for directories).
    #[must_use]
    pub fn open_path(path: &Path) -> Self {
        Self::command(OPEN_PROGRAM, [path.as_os_str()])
    }

    /// Open a URL in the default browser.
    #[must_use]
    pub fn open_url(url: &str) -> Self {
        Self::command(OPEN_PROGRAM, [url])
    }
}

impl Display for Launch {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Command { program, args } => {
                write!(f, "{program}")?;
                for arg in args {
                    write!(f, " \"{}\"", arg.to_string_lossy())?;
                }
                Ok(())
            }
            Self::AppleScript(_) => f.write_str("osascript -e <script>"),
        }
    }
}

/// Performs launches on behalf of actions.
pub trait CommandRunner {
    /// Perform `launch`.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be started.
    fn run(&self, launch: &Launch) -> io::Result<()>;
}

/// [`CommandRunner`] that spawns real processes.
///
/// Children are started detached from our stdio and not waited on: the
/// launcher expects the plugin to exit while the opened application lives on.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, launch: &Launch) -> io::Result<()> {
        info!("launching {launch}");

        let mut command = match launch {
            Launch::Command { program, args } => {
                let mut command = Command::new(program);
                command.args(args);
                command
            }
            Launch::AppleScript(script) => {
                let mut command = Command::new("osascript");
                command.arg("-e").arg(script);
                command
            }
        };

        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
    }
}
