//! External command actions

use crate::action::{Action, ActionContext};
use stagehook_errors::{Error, HookError};
use stagehook_events::{EventEmitter, HookEvent};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Instant;
use tracing::debug;

/// Number of trailing stderr lines kept in an exit error
const STDERR_TAIL_LINES: usize = 20;

/// Runs an external program and treats a nonzero exit status as failure
///
/// The command runs to completion on the caller's thread with stdin closed.
/// Each stdout and stderr line is emitted as an event as soon as it is read.
/// There is no timeout.
#[derive(Debug, Clone)]
pub struct CommandAction {
    name: String,
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
    message: Option<String>,
}

impl CommandAction {
    /// Create a command action running `program` in `working_dir`
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            message: None,
        }
    }

    /// Build from an argv-style list (program first)
    ///
    /// # Errors
    ///
    /// Returns an error if `argv` is empty.
    pub fn from_argv(
        name: impl Into<String>,
        argv: &[String],
        working_dir: impl Into<PathBuf>,
    ) -> Result<Self, Error> {
        let name = name.into();
        let (program, args) = argv.split_first().ok_or_else(|| {
            Error::internal(format!("command for {name} has no program"))
        })?;
        Ok(Self::new(name, program.clone(), working_dir).args(args))
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.args.push(arg.as_ref().to_string());
        }
        self
    }

    /// Message announced before the command starts
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Command line as shown to users
    #[must_use]
    pub fn display_command(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    /// Relative program paths such as `./create_www.sh` resolve against the
    /// working directory; bare names go through `PATH`.
    fn resolved_program(&self) -> PathBuf {
        let program = Path::new(&self.program);
        if program.is_relative() && program.components().count() > 1 {
            self.working_dir.join(program)
        } else {
            program.to_path_buf()
        }
    }

    fn launch_error(&self, error: &std::io::Error) -> HookError {
        HookError::ActionLaunch {
            action: self.name.clone(),
            program: self.program.clone(),
            message: error.to_string(),
        }
    }

    /// Emit every line read from `pipe`, keeping the last few for error reports
    fn forward_lines(
        &self,
        ctx: &ActionContext,
        pipe: impl Read,
        is_stderr: bool,
    ) -> VecDeque<String> {
        let mut reader = BufReader::new(pipe);
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = String::from_utf8_lossy(&buf)
                .trim_end_matches(['\n', '\r'])
                .to_string();

            ctx.emit_hook(HookEvent::CommandOutput {
                action: self.name.clone(),
                line: line.clone(),
                is_stderr,
            });

            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }

        tail
    }
}

impl Action for CommandAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, ctx: &ActionContext) -> Result<(), Error> {
        if let Some(message) = &self.message {
            ctx.emit_hook(HookEvent::ActionMessage {
                action: self.name.clone(),
                message: message.clone(),
            });
        }

        ctx.emit_hook(HookEvent::CommandStarted {
            action: self.name.clone(),
            command: self.display_command(),
            working_dir: self.working_dir.clone(),
        });
        debug!(
            action = %self.name,
            command = %self.display_command(),
            working_dir = %self.working_dir.display(),
            "spawning hook command"
        );

        let program = self.resolved_program();
        ctx.emit_debug(format!("{}: resolved program {}", self.name, program.display()));

        let started = Instant::now();
        let mut child = Command::new(&program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.launch_error(&e))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stderr_tail = thread::scope(|scope| {
            let stderr_reader = scope.spawn(|| {
                stderr
                    .map(|pipe| self.forward_lines(ctx, pipe, true))
                    .unwrap_or_default()
            });
            if let Some(pipe) = stdout {
                self.forward_lines(ctx, pipe, false);
            }
            stderr_reader.join().unwrap_or_default()
        });

        let status = child.wait().map_err(|e| self.launch_error(&e))?;

        ctx.emit_hook(HookEvent::CommandCompleted {
            action: self.name.clone(),
            exit_code: status.code(),
            duration: started.elapsed(),
        });

        if !status.success() {
            return Err(HookError::ActionExit {
                action: self.name.clone(),
                program: self.program.clone(),
                code: status.code(),
                stderr: Vec::from(stderr_tail).join("\n"),
            }
            .into());
        }

        Ok(())
    }
}
