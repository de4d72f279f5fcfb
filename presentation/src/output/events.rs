//! Newline-delimited JSON event output (`--output events`).

use council_domain::DeliberationEvent;
use std::io::{self, Write};

/// Writes each [`DeliberationEvent`] as one JSON line and flushes it, so a
/// consumer reading the pipe sees events as they happen.
pub struct EventLineWriter<W: Write> {
    out: W,
}

impl<W: Write> EventLineWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_event(&mut self, event: &DeliberationEvent) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
