use crate::{
    error::Error,
    transport::{LogLine, Transport},
    types::Level,
};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// Every record, all levels.
pub const COMBINED_LOG: &str = "combined.log";
/// Error level records only.
pub const ERROR_LOG: &str = "error.log";

/// Durable append-only JSON line files.
#[derive(Debug)]
pub struct FileTransport {
    dir: PathBuf,
    service: String,
    combined: Mutex<File>,
    errors: Mutex<File>,
}

impl FileTransport {
    /// Opens (creating when needed) both log files under `dir`.
    pub fn open<P: AsRef<Path>, S: Into<String>>(dir: P, service: S) -> Result<Self, Error> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| Error::log_dir(dir, e))?;
        let combined = open_append(&dir.join(COMBINED_LOG)).map_err(|e| Error::log_dir(dir, e))?;
        let errors = open_append(&dir.join(ERROR_LOG)).map_err(|e| Error::log_dir(dir, e))?;
        Ok(Self {
            dir: dir.to_owned(),
            service: service.into(),
            combined: Mutex::new(combined),
            errors: Mutex::new(errors),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `level`, `message` and `service` lead, followed by the record fields.
    fn encode(&self, line: &LogLine) -> Result<Vec<u8>, Error> {
        let mut obj = Map::new();
        obj.insert("level".into(), line.level.to_string().into());
        obj.insert("message".into(), line.message.clone().into());
        obj.insert("service".into(), self.service.clone().into());
        for (key, value) in line.fields.iter() {
            if !obj.contains_key(key) {
                obj.insert(key.clone(), value.clone());
            }
        }
        let mut bytes = serde_json::to_vec(&Value::Object(obj))?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Transport for FileTransport {
    fn name(&self) -> &'static str {
        "file"
    }

    fn write(&self, line: &LogLine) -> Result<(), Error> {
        let bytes = self.encode(line)?;
        let combined = self.combined.lock().write_all(&bytes);
        let errors = if line.level == Level::Error {
            self.errors.lock().write_all(&bytes)
        } else {
            Ok(())
        };
        combined?;
        errors?;
        Ok(())
    }
}
