use crate::{
    error::Error,
    transport::{LogLine, Transport},
    types::Level,
};
use parking_lot::Mutex;
use std::{
    fmt,
    io::{self, Write},
};

type Writer = Box<dyn Write + Send>;

/// Single-line JSON on the standard streams: info and debug to stdout, warnings
/// and errors to stderr.
pub struct ConsoleTransport {
    out: Mutex<Writer>,
    err: Mutex<Writer>,
}

impl ConsoleTransport {
    pub fn stdio() -> Self {
        Self::with_writers(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn with_writers(out: Writer, err: Writer) -> Self {
        Self {
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }
}

impl fmt::Debug for ConsoleTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleTransport").finish_non_exhaustive()
    }
}

impl Transport for ConsoleTransport {
    fn name(&self) -> &'static str {
        "console"
    }

    fn write(&self, line: &LogLine) -> Result<(), Error> {
        let mut bytes = serde_json::to_vec(&line.fields)?;
        bytes.push(b'\n');

        let stream = match line.level {
            Level::Error | Level::Warn => &self.err,
            Level::Info | Level::Debug => &self.out,
        };
        let mut w = stream.lock();
        w.write_all(&bytes)?;
        w.flush()?;
        Ok(())
    }
}
