//! A recorder writing through the `log` facade.
use super::{AggregateRecorder, Record, RecordValue};
use log::info;
use std::collections::BTreeMap;

/// A recorder writing aggregated records through the [`log`] facade.
///
/// Scalars stored between two flushes are averaged per key. Strings keep
/// the last stored value. Each flush emits a single `info!` line with keys in
/// lexicographic order.
#[derive(Default)]
pub struct LogRecorder {
    scalars: BTreeMap<String, Vec<f32>>,
    strings: BTreeMap<String, String>,
}

impl LogRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn format(&self) -> String {
        let scalars = self.scalars.iter().map(|(k, vs)| {
            let mean = vs.iter().sum::<f32>() / vs.len() as f32;
            format!("{}={:.5}", k, mean)
        });
        let strings = self.strings.iter().map(|(k, v)| format!("{}={}", k, v));
        scalars.chain(strings).collect::<Vec<_>>().join(", ")
    }
}

impl AggregateRecorder for LogRecorder {
    fn store(&mut self, record: Record) {
        for (k, v) in record.into_iter_in_record() {
            match v {
                RecordValue::Scalar(v) => self.scalars.entry(k).or_default().push(v),
                RecordValue::String(s) => {
                    self.strings.insert(k, s);
                }
                RecordValue::DateTime(t) => {
                    self.strings.insert(k, t.to_rfc3339());
                }
                // Arrays are not summarised in a log line
                RecordValue::Array1(_) => {}
            }
        }
    }

    fn flush(&mut self, step: i64) {
        if self.scalars.is_empty() && self.strings.is_empty() {
            return;
        }
        info!("[{}] {}", step, self.format());
        self.scalars.clear();
        self.strings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_recorder_averages_scalars() {
        let mut recorder = LogRecorder::new();
        recorder.store(Record::from_scalar("loss", 1.0));
        recorder.store(Record::from_scalar("loss", 3.0));
        recorder.store(Record::from_slice(&[(
            "phase",
            RecordValue::String("train".into()),
        )]));
        assert_eq!(recorder.format(), "loss=2.00000, phase=train");

        recorder.flush(0);
        assert!(recorder.scalars.is_empty());
        assert!(recorder.strings.is_empty());
    }
}
