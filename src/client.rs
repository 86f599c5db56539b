//! Client Engine
//!
//! Reads commands one line at a time and turns each into exactly one
//! request/reply exchange with the server. The client is single-threaded:
//! it waits for the full reply before reading the next line.

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, Read, Write};
use std::path::PathBuf;

use crate::config::ClientConfig;
use crate::error::{CixError, Result};
use crate::protocol::{read_header, read_payload, write_message, Command, Filename, Header};

/// Static command summary printed by `help`
pub const HELP_TEXT: &str = "\
exit         - Exit the program.  Equivalent to EOF.
get filename - Copy remote file to local host.
help         - Print help summary.
ls           - List names of files on remote server.
put filename - Copy local file to remote host.
rm filename  - Remove file from remote server.
";

/// Maps command words typed by the user to protocol commands.
/// Built once; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CommandTable {
    commands: HashMap<&'static str, Command>,
}

impl CommandTable {
    pub fn new() -> Self {
        let commands = HashMap::from([
            ("exit", Command::Exit),
            ("help", Command::Help),
            ("ls", Command::List),
            ("get", Command::Fetch),
            ("put", Command::Store),
            ("rm", Command::Delete),
        ]);
        Self { commands }
    }

    /// Look up a command word; unknown words give `Command::Error`
    pub fn lookup(&self, token: &str) -> Command {
        self.commands
            .get(token)
            .copied()
            .unwrap_or(Command::Error)
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Split an input line into its command word and argument
///
/// The first whitespace run separates the two; everything after it is the
/// argument, taken whole. Blank lines give `None`.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((token, rest)) => Some((token, rest.trim_start())),
        None => Some((line, "")),
    }
}

/// What the input loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// A connected client session
pub struct Client<S> {
    stream: S,
    config: ClientConfig,
    table: CommandTable,
}

impl<S: Read + Write> Client<S> {
    pub fn new(stream: S, config: ClientConfig) -> Self {
        Self {
            stream,
            config,
            table: CommandTable::new(),
        }
    }

    /// Run the interactive loop until `exit` or end of input
    ///
    /// Recoverable errors are printed to `out` and the loop continues.
    /// Transport and protocol errors end the loop and are returned.
    /// Input lines that are not UTF-8 are reported and skipped.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, out: &mut W) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            let Ok(line) = std::str::from_utf8(&buf) else {
                tracing::debug!("skipping non-UTF-8 input line");
                writeln!(out, "error: input line is not valid UTF-8")?;
                out.flush()?;
                continue;
            };
            tracing::debug!("command {:?}", line);

            match self.execute_line(line, out) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => return Ok(()),
                Err(e) if e.is_recoverable() => {
                    tracing::debug!("command failed: {}", e);
                    writeln!(out, "error: {}", e)?;
                }
                Err(e) => return Err(e),
            }
            out.flush()?;
        }
        tracing::debug!("end of input");
        Ok(())
    }

    /// Execute one line of user input
    pub fn execute_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let Some((token, arg)) = parse_line(line) else {
            return Ok(Flow::Continue);
        };

        match self.table.lookup(token) {
            Command::Exit => return Ok(Flow::Exit),
            Command::Help => out.write_all(HELP_TEXT.as_bytes())?,
            Command::List => {
                let listing = self.list()?;
                out.write_all(&listing)?;
            }
            Command::Fetch => {
                let len = self.fetch(arg)?;
                writeln!(out, "{}: fetched {} bytes", arg, len)?;
            }
            Command::Store => {
                let len = self.store(arg)?;
                writeln!(out, "{}: stored {} bytes", arg, len)?;
            }
            Command::Delete => {
                self.delete(arg)?;
                writeln!(out, "{}: removed", arg)?;
            }
            _ => writeln!(out, "{}: invalid command", line.trim())?,
        }
        Ok(Flow::Continue)
    }

    /// LIST: the server's listing text
    pub fn list(&mut self) -> Result<Vec<u8>> {
        let reply = self.exchange(&Header::new(Command::List), &[])?;
        expect_reply(Command::List, &reply, Command::ListResult)?;
        self.receive_payload(&reply)
    }

    /// FETCH: copy a server file into the local directory
    ///
    /// Returns the number of bytes written. Nothing is written on NAK.
    pub fn fetch(&mut self, name: &str) -> Result<usize> {
        let name = Filename::parse(name)?;

        let reply = self.exchange(&Header::request(Command::Fetch, &name), &[])?;
        expect_reply(Command::Fetch, &reply, Command::FileResult)?;
        let contents = self.receive_payload(&reply)?;

        let path = self.local_path(&name);
        fs::write(&path, &contents).map_err(|source| CixError::LocalFile { path, source })?;
        Ok(contents.len())
    }

    /// STORE: copy a local file to the server
    ///
    /// The whole file is read before the header is built so the announced
    /// length is exact.
    pub fn store(&mut self, name: &str) -> Result<u32> {
        let name = Filename::parse(name)?;

        let path = self.local_path(&name);
        let contents = fs::read(&path).map_err(|source| CixError::LocalFile { path, source })?;
        let len = u32::try_from(contents.len())
            .ok()
            .filter(|&len| len <= self.config.max_payload)
            .ok_or(CixError::PayloadTooLarge {
                size: contents.len() as u64,
                max: self.config.max_payload,
            })?;

        let request = Header::request(Command::Store, &name).with_byte_count(len);
        let reply = self.exchange(&request, &contents)?;
        expect_reply(Command::Store, &reply, Command::Ack)?;
        Ok(len)
    }

    /// DELETE: remove a server file
    pub fn delete(&mut self, name: &str) -> Result<()> {
        let name = Filename::parse(name)?;

        let reply = self.exchange(&Header::request(Command::Delete, &name), &[])?;
        expect_reply(Command::Delete, &reply, Command::Ack)
    }

    /// Give back the underlying stream
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Send one request and wait for its reply header
    fn exchange(&mut self, request: &Header, payload: &[u8]) -> Result<Header> {
        tracing::debug!("sending header {}", request);
        write_message(&mut self.stream, request, payload)?;
        if !payload.is_empty() {
            tracing::debug!("sent {} bytes", payload.len());
        }

        let reply = read_header(&mut self.stream)?;
        tracing::debug!("received header {}", reply);
        Ok(reply)
    }

    fn receive_payload(&mut self, reply: &Header) -> Result<Vec<u8>> {
        let payload = read_payload(&mut self.stream, reply.byte_count, self.config.max_payload)?;
        tracing::debug!("received {} bytes", payload.len());
        Ok(payload)
    }

    fn local_path(&self, name: &Filename) -> PathBuf {
        self.config.local_dir.join(name.as_str())
    }
}

/// Check the reply matches the request
///
/// NAK is an ordinary refusal; anything else unexpected means the peers
/// disagree about the protocol.
fn expect_reply(request: Command, reply: &Header, wanted: Command) -> Result<()> {
    if reply.command == wanted {
        Ok(())
    } else if reply.command == Command::Nak {
        Err(CixError::Nak {
            command: request,
            code: reply.byte_count,
        })
    } else {
        Err(CixError::Protocol(format!(
            "sent {}, server returned {}",
            request, reply
        )))
    }
}
