//! Byte sources for decode sessions: files, standard input, and converter pipes.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read, StdinLock};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};

use log::{debug, warn};

use crate::error::PnmError;
use crate::resolve::ConverterTable;

/// Filename that selects the process's standard input.
pub const STDIN_NAME: &str = "-";

/// A buffered byte stream that knows how to release itself.
///
/// `close` consumes the source, so a session can only close it once.
pub trait ByteSource: BufRead {
    fn close(self) -> io::Result<()>;
}

impl<T: AsRef<[u8]>> ByteSource for Cursor<T> {
    fn close(self) -> io::Result<()> {
        Ok(())
    }
}

/// An opened input: plain file, standard input, or converter subprocess.
#[derive(Debug)]
pub enum Source {
    File(BufReader<File>),
    Stdin(StdinLock<'static>),
    Pipe {
        child: Child,
        stdout: BufReader<ChildStdout>,
        command: String,
    },
}

impl Source {
    /// Open `name` for decoding.
    ///
    /// `-` reads standard input. A name matching `converters` spawns the
    /// converter with the name as its last argument and reads its stdout.
    /// Anything else is opened as a file.
    pub fn open(name: &str, converters: &ConverterTable) -> Result<Self, PnmError> {
        if name == STDIN_NAME {
            debug!("reading standard input");
            return Ok(Source::Stdin(io::stdin().lock()));
        }
        match converters.resolve(name) {
            None => {
                let file = File::open(name).map_err(|source| PnmError::Open {
                    path: PathBuf::from(name),
                    source,
                })?;
                Ok(Source::File(BufReader::new(file)))
            }
            Some(converter) => {
                let command = converter.display_command(name);
                debug!("spawning converter: {command}");
                let mut child = Command::new(&converter.program)
                    .args(&converter.args)
                    .arg(name)
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .spawn()
                    .map_err(|source| PnmError::Spawn {
                        command: command.clone(),
                        source,
                    })?;
                let Some(stdout) = child.stdout.take() else {
                    // stdout was requested as piped; reap the child anyway.
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(PnmError::Spawn {
                        command,
                        source: io::Error::other("converter has no stdout pipe"),
                    });
                };
                Ok(Source::Pipe {
                    child,
                    stdout: BufReader::new(stdout),
                    command,
                })
            }
        }
    }

    /// Whether the bytes come from a converter subprocess.
    pub fn is_pipe(&self) -> bool {
        matches!(self, Source::Pipe { .. })
    }
}

impl Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Source::File(r) => r.read(buf),
            Source::Stdin(r) => r.read(buf),
            Source::Pipe { stdout, .. } => stdout.read(buf),
        }
    }
}

impl BufRead for Source {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            Source::File(r) => r.fill_buf(),
            Source::Stdin(r) => r.fill_buf(),
            Source::Pipe { stdout, .. } => stdout.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            Source::File(r) => r.consume(amt),
            Source::Stdin(r) => r.consume(amt),
            Source::Pipe { stdout, .. } => stdout.consume(amt),
        }
    }
}

impl ByteSource for Source {
    /// Files are dropped, standard input is left open, and pipes are
    /// drained of their reader and waited on.
    fn close(self) -> io::Result<()> {
        match self {
            Source::File(file) => {
                drop(file);
                Ok(())
            }
            Source::Stdin(_) => Ok(()),
            Source::Pipe {
                mut child,
                stdout,
                command,
            } => {
                drop(stdout);
                let status = child.wait()?;
                if !status.success() {
                    warn!("converter `{command}` exited with {status}");
                }
                Ok(())
            }
        }
    }
}
