use super::{AggregateRecorder, Record, Recorder};

/// Buffered recorder.
///
/// Keeps every record in memory. Records written with [`Recorder::write`] or
/// stored with [`AggregateRecorder::store`] end up in the same buffer, and
/// [`AggregateRecorder::flush`] only remembers the step at which it was called.
/// Mostly useful for inspecting what a training run emitted.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    flushed_steps: Vec<i64>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.buf.iter()
    }

    /// Returns the steps given to [`AggregateRecorder::flush`].
    pub fn flushed_steps(&self) -> &[i64] {
        &self.flushed_steps
    }

    /// Returns the records having the key `k`.
    pub fn with_key<'a>(&'a self, k: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.buf.iter().filter(move |r| r.get(k).is_some())
    }
}

impl Recorder for BufferedRecorder {
    /// Write a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}

impl AggregateRecorder for BufferedRecorder {
    fn store(&mut self, record: Record) {
        self.buf.push(record);
    }

    fn flush(&mut self, step: i64) {
        self.flushed_steps.push(step);
    }
}
