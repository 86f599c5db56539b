//! Command definitions
//!
//! The command vocabulary shared by client and server.

use std::fmt;

/// Command codes carried in the header's command byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Sentinel for unrecognized input and unknown wire codes
    Error = 0,
    /// Client-local: end the session
    Exit = 1,
    /// Request: copy a server file to the client
    Fetch = 2,
    /// Client-local: print the command summary
    Help = 3,
    /// Request: list the server's files
    List = 4,
    /// Request: copy a client file to the server
    Store = 5,
    /// Request: remove a server file
    Delete = 6,
    /// Reply to FETCH, payload is the file contents
    FileResult = 7,
    /// Reply to LIST, payload is the listing text
    ListResult = 8,
    /// Positive acknowledgement
    Ack = 9,
    /// Negative acknowledgement, byte_count holds an OS error code
    Nak = 10,
}

impl Command {
    /// Decode a wire code. Codes outside the vocabulary map to `Error`.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Command::Exit,
            2 => Command::Fetch,
            3 => Command::Help,
            4 => Command::List,
            5 => Command::Store,
            6 => Command::Delete,
            7 => Command::FileResult,
            8 => Command::ListResult,
            9 => Command::Ack,
            10 => Command::Nak,
            _ => Command::Error,
        }
    }

    /// The wire code
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::Error => "ERROR",
            Command::Exit => "EXIT",
            Command::Fetch => "FETCH",
            Command::Help => "HELP",
            Command::List => "LIST",
            Command::Store => "STORE",
            Command::Delete => "DELETE",
            Command::FileResult => "FILE-RESULT",
            Command::ListResult => "LIST-RESULT",
            Command::Ack => "ACK",
            Command::Nak => "NAK",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
