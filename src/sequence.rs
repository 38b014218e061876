//! Per-key request ordering.
//!
//! Every refresh is tagged with a sequence number that increases monotonically per key.
//! A response may only be written back while its number is still the latest one issued
//! for its key, so a slow response can never overwrite one from a newer request.
//!
//! Each issued number is held by a [`Ticket`]. Dropping the ticket marks the number as
//! settled, which lets a superseded request wait until nothing newer is in flight.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, watch};

struct KeySequence {
    issued: u64,
    /// Highest settled sequence number.
    settled: Arc<watch::Sender<u64>>,
}

#[derive(Default)]
pub(crate) struct Sequencer {
    keys: Mutex<HashMap<String, KeySequence>>,
}

/// Holds the sequencer lock. No sequence can be issued while this is alive.
pub(crate) struct SequenceGuard<'a> {
    keys: MutexGuard<'a, HashMap<String, KeySequence>>,
}

/// An issued sequence number. Settles on drop.
pub(crate) struct Ticket {
    seq: u64,
    settled: Arc<watch::Sender<u64>>,
}

impl Sequencer {
    /// Issue the next sequence number for `key`. The first number for a key is `1`.
    pub async fn issue(&self, key: &str) -> Ticket {
        self.lock().await.issue(key)
    }

    /// Lock the sequencer so a check and the write that follows it are atomic.
    pub async fn lock(&self) -> SequenceGuard<'_> {
        SequenceGuard {
            keys: self.keys.lock().await,
        }
    }
}

impl SequenceGuard<'_> {
    /// Issue the next sequence number for `key` without releasing the lock.
    pub fn issue(&mut self, key: &str) -> Ticket {
        let entry = self
            .keys
            .entry(key.to_string())
            .or_insert_with(|| KeySequence {
                issued: 0,
                settled: Arc::new(watch::channel(0).0),
            });
        entry.issued += 1;
        Ticket {
            seq: entry.issued,
            settled: Arc::clone(&entry.settled),
        }
    }

    pub fn is_latest(&self, key: &str, seq: u64) -> bool {
        self.keys.get(key).map(|k| k.issued) == Some(seq)
    }

    /// The latest sequence issued for `key` and a receiver to wait for it to settle.
    ///
    /// `None` when every issued sequence for `key` has settled.
    pub fn in_flight(&self, key: &str) -> Option<(u64, watch::Receiver<u64>)> {
        let entry = self.keys.get(key)?;
        if *entry.settled.borrow() >= entry.issued {
            return None;
        }
        Some((entry.issued, entry.settled.subscribe()))
    }
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let seq = self.seq;
        self.settled.send_if_modified(|settled| {
            if seq > *settled {
                *settled = seq;
                true
            } else {
                false
            }
        });
    }
}
