//! Stream codec: JSON records in, JSON responses out.

use std::io::{Read, Write};
use std::sync::Mutex;

use serde_json::Value;
use tracing::{debug, warn};

use pulsefeed_core::types::{Command, Response};

/// Streaming decoder yielding typed commands.
///
/// Records that do not decode into a known command are skipped with a
/// debug log and no response. Malformed JSON ends the stream like EOF.
pub struct RequestReader<R: Read> {
    records: serde_json::StreamDeserializer<'static, serde_json::de::IoRead<R>, Value>,
}

impl<R: Read> RequestReader<R> {
    /// Wrap an input stream of self-delimiting JSON records.
    pub fn new(input: R) -> Self {
        Self {
            records: serde_json::Deserializer::from_reader(input).into_iter(),
        }
    }

    /// Next recognized command, or `None` on EOF or malformed input.
    pub fn next(&mut self) -> Option<Command> {
        loop {
            match self.records.next()? {
                Ok(record) => match Command::from_value(&record) {
                    Some(command) => return Some(command),
                    None => debug!("dropping unrecognized record: {record}"),
                },
                Err(e) => {
                    debug!("input stream ended: {e}");
                    return None;
                }
            }
        }
    }
}

/// Serializing response encoder: one JSON object per line.
///
/// The underlying stream is a single-writer resource; the mutex
/// serializes writes from concurrent consumers. An encode failure drops
/// that response and processing continues.
pub struct ResponseWriter<W: Write> {
    output: Mutex<W>,
}

impl<W: Write> ResponseWriter<W> {
    /// Wrap an output stream.
    pub fn new(output: W) -> Self {
        Self {
            output: Mutex::new(output),
        }
    }

    /// Encode one response.
    pub fn write(&self, response: &Response) {
        let mut output = self.output.lock().unwrap();
        let result = serde_json::to_writer(&mut *output, response)
            .map_err(std::io::Error::from)
            .and_then(|()| output.write_all(b"\n"));
        if let Err(e) = result {
            warn!("failed to encode response: {e}");
        }
    }

    /// Hand back the underlying stream.
    pub fn into_inner(self) -> W {
        self.output.into_inner().unwrap()
    }
}
