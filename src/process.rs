//! Caller-side handle for the listener subprocess.
//!
//! [`ListenerProcess`] spawns and owns the child process that holds the
//! native notification event loop. Communication is JSON-lines over the
//! child's piped stdio: [`ListenerRequest`] objects go down its stdin, and
//! [`ActivationEvent`](crate::protocol::ActivationEvent) objects come back
//! up its stdout (handed off to the drain thread via [`take_stdout`]).
//! Stderr lines are forwarded to the log by a background thread so a noisy
//! child can never block on a full pipe.
//!
//! [`take_stdout`]: ListenerProcess::take_stdout

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use crate::error::Error;
use crate::listener::LISTENER_ENV;
use crate::protocol::ListenerRequest;

/// Manages the listener subprocess with JSON-line communication.
pub struct ListenerProcess {
    /// The child process handle, if still alive.
    child: Option<Child>,
    /// Writer to the child's stdin, if still open and not yet handed out.
    stdin_writer: Option<ChildStdin>,
    /// The child's stdout, until claimed by the drain thread.
    stdout: Option<ChildStdout>,
    /// Handle to the background thread logging stderr.
    _stderr_thread: Option<JoinHandle<()>>,
}

impl ListenerProcess {
    /// Spawn a listener subprocess with piped stdin/stdout/stderr.
    ///
    /// A background thread forwards the child's stderr lines to the log at
    /// warn level.
    ///
    /// # Errors
    /// Returns [`Error::Spawn`] if the subprocess cannot be spawned and
    /// [`Error::Pipe`] if a stdio pipe cannot be captured.
    pub fn spawn(
        command: &str,
        args: &[&str],
        env_vars: &HashMap<String, String>,
    ) -> Result<Self, Error> {
        let mut cmd = Command::new(command);
        cmd.args(args).envs(env_vars);
        Self::spawn_command(cmd)
    }

    /// Spawn the current executable as a listener.
    ///
    /// The child is marked with the [`LISTENER_ENV`] environment variable;
    /// host binaries hand control over by calling
    /// [`listener::run_if_listener`](crate::listener::run_if_listener) at
    /// the top of `main`.
    pub fn spawn_self() -> Result<Self, Error> {
        let exe = std::env::current_exe().map_err(Error::Spawn)?;
        let mut cmd = Command::new(exe);
        cmd.env(LISTENER_ENV, "1");
        Self::spawn_command(cmd)
    }

    fn spawn_command(mut cmd: Command) -> Result<Self, Error> {
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(Error::Spawn)?;

        let stdin_writer = child.stdin.take();
        let stdout = child.stdout.take().ok_or(Error::Pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(Error::Pipe("stderr"))?;

        // Stderr logger thread: drain the pipe so the child never blocks on it
        let stderr_thread = std::thread::spawn(move || {
            let reader = BufReader::new(stderr);
            for line in reader.lines() {
                match line {
                    Ok(text) => {
                        if !text.is_empty() {
                            log::warn!("listener stderr: {text}");
                        }
                    }
                    Err(e) => {
                        log::debug!("error reading listener stderr: {e}");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            child: Some(child),
            stdin_writer,
            stdout: Some(stdout),
            _stderr_thread: Some(stderr_thread),
        })
    }

    /// Check if the child process is still alive.
    ///
    /// Uses `try_wait()` to check without blocking. Returns `false` if the
    /// process has exited or if there is no child process.
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(Some(_status)) => false, // Process has exited
                Ok(None) => true,           // Process still running
                Err(_) => false,            // Error checking status
            },
            None => false,
        }
    }

    /// Serialize a [`ListenerRequest`] and write it to the child's stdin as
    /// a line.
    ///
    /// # Errors
    /// Returns [`Error::ChannelClosed`] if the stdin writer was taken or
    /// dropped, and [`Error::ChannelWrite`] if the write fails.
    pub fn send(&mut self, request: &ListenerRequest) -> Result<(), Error> {
        let stdin = self.stdin_writer.as_mut().ok_or(Error::ChannelClosed)?;
        let json = serde_json::to_string(request)?;
        writeln!(stdin, "{json}").map_err(Error::ChannelWrite)?;
        stdin.flush().map_err(Error::ChannelWrite)?;
        Ok(())
    }

    /// Take ownership of the child's stdin writer, e.g. to share it between
    /// the manager and cancellation handles. Subsequent [`send`](Self::send)
    /// calls return [`Error::ChannelClosed`].
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.stdin_writer.take()
    }

    /// Take ownership of the child's stdout, to hand to the drain thread.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Stop the subprocess.
    ///
    /// Drops the stdin writer (sending EOF to the child), kills the child
    /// process if it's still running, and waits for it to exit. The native
    /// event loop has no interrupt point, so termination is forceful rather
    /// than cooperative.
    pub fn stop(&mut self) {
        // Drop stdin to send EOF
        self.stdin_writer.take();

        if let Some(ref mut child) = self.child {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.child.take();
    }
}

impl Drop for ListenerProcess {
    fn drop(&mut self) {
        self.stop();
    }
}
