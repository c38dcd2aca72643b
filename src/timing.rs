//! Timing
//!
//! Scope guard that records how long an operation took.
use crate::sink::ObservationSink;
use std::time::Instant;

/// Starts timing when created and reports the elapsed seconds to the sink
/// when dropped, whichever way the enclosing scope is left.
pub struct LatencyTimer<'a, S: ObservationSink + ?Sized> {
    sink: &'a S,
    operation: &'a str,
    start: Instant,
}

impl<'a, S: ObservationSink + ?Sized> LatencyTimer<'a, S> {
    pub fn start(sink: &'a S, operation: &'a str) -> Self {
        LatencyTimer {
            sink,
            operation,
            start: Instant::now(),
        }
    }

    /// Seconds elapsed so far.
    pub fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl<S: ObservationSink + ?Sized> Drop for LatencyTimer<'_, S> {
    fn drop(&mut self) {
        self.sink.emit_latency(self.operation, self.elapsed());
    }
}
