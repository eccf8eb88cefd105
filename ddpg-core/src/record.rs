//! Types and traits for recording training metrics.
//!
//! A [`Record`] is a set of key-value pairs emitted by the components of the
//! training loop: the agent reports losses and value statistics, the evaluator
//! reports returns, and the trainer adds counters. Records are passed to an
//! [`AggregateRecorder`], which plays the role of the metrics sink.
//!
//! ```rust
//! use ddpg_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("Epoch", RecordValue::Scalar(3.0));
//! record.insert("QFunction/AverageQ", RecordValue::Scalar(-1.5));
//! assert_eq!(record.get_scalar("Epoch").unwrap(), 3.0);
//! ```
mod base;
mod buffered_recorder;
mod log_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use log_recorder::LogRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
