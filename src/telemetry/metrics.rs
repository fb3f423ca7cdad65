//! Request counters.
//!
//! Thread-safe counters shared by every request task.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counter for thread-safe increment operations.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    /// Creates a new counter initialized to zero.
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Increments the counter by 1.
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds a value to the counter.
    pub fn add(&self, val: u64) {
        self.0.fetch_add(val, Ordering::Relaxed);
    }

    /// Gets the current value of the counter.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Server-wide request statistics.
#[derive(Debug, Default)]
pub struct ServerStats {
    /// Requests handed to the dispatcher.
    pub received: Counter,
    /// Advertise replies produced.
    pub advertised: Counter,
    /// Reply messages produced.
    pub replied: Counter,
    /// Requests ignored without a reply.
    pub dropped: Counter,
    /// Requests aborted by an error.
    pub errors: Counter,
    /// Datagrams that failed to decode.
    pub rx_errors: Counter,
    /// Bytes of reply data sent.
    pub tx_bytes: Counter,
    /// Replies that failed to send.
    pub tx_errors: Counter,
}

impl ServerStats {
    /// Creates a new stats block initialized to zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a reply handed to the socket.
    pub fn record_tx(&self, bytes: usize) {
        self.tx_bytes.add(bytes as u64);
    }

    /// Exports all counters as key-value pairs.
    pub fn export(&self) -> Vec<(String, u64)> {
        vec![
            ("received".into(), self.received.get()),
            ("advertised".into(), self.advertised.get()),
            ("replied".into(), self.replied.get()),
            ("dropped".into(), self.dropped.get()),
            ("errors".into(), self.errors.get()),
            ("rx_errors".into(), self.rx_errors.get()),
            ("tx_bytes".into(), self.tx_bytes.get()),
            ("tx_errors".into(), self.tx_errors.get()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_basic() {
        let counter = Counter::new();
        assert_eq!(counter.get(), 0);

        counter.inc();
        assert_eq!(counter.get(), 1);

        counter.add(10);
        assert_eq!(counter.get(), 11);
    }

    #[test]
    fn test_server_stats_export() {
        let stats = ServerStats::new();

        stats.received.add(3);
        stats.advertised.inc();
        stats.replied.inc();
        stats.dropped.inc();
        stats.record_tx(120);
        stats.record_tx(80);

        let exported = stats.export();
        assert!(exported.contains(&("received".into(), 3)));
        assert!(exported.contains(&("advertised".into(), 1)));
        assert!(exported.contains(&("replied".into(), 1)));
        assert!(exported.contains(&("dropped".into(), 1)));
        assert!(exported.contains(&("errors".into(), 0)));
        assert!(exported.contains(&("tx_bytes".into(), 200)));
    }
}
