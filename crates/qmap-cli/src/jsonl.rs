//! JSON-lines transport for operation streams.
//!
//! Each line holds one operation object, e.g.
//! `{"kind":{"gate":"cx"},"qubits":[0,3]}`. Blank lines and lines starting
//! with `#` are ignored on input.

use std::io::{BufRead, Write};

use qmap_ir::{PhysicalOperation, VirtualOperation};
use qmap_route::{OperationSink, OperationSource, RouteError, RouteResult};

/// Reads virtual operations lazily from a line-oriented reader.
pub struct JsonLinesSource<R> {
    reader: R,
    line: String,
    line_number: usize,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> OperationSource for JsonLinesSource<R> {
    fn pull(&mut self) -> RouteResult<Option<VirtualOperation>> {
        loop {
            self.line.clear();
            let read = self.reader.read_line(&mut self.line).map_err(|e| {
                RouteError::Stream(format!("read failed after line {}: {e}", self.line_number))
            })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let text = self.line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            return serde_json::from_str(text)
                .map(Some)
                .map_err(|e| RouteError::Stream(format!("line {}: {e}", self.line_number)));
        }
    }
}

/// Writes physical operations as one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of operations written.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> RouteResult<()> {
        self.writer
            .flush()
            .map_err(|e| RouteError::Stream(format!("flush failed: {e}")))
    }
}

impl<W: Write> OperationSink for JsonLinesSink<W> {
    fn push(&mut self, op: PhysicalOperation) -> RouteResult<()> {
        serde_json::to_writer(&mut self.writer, &op)
            .map_err(|e| RouteError::Stream(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| RouteError::Stream(e.to_string()))?;
        self.written += 1;
        Ok(())
    }
}
