//! Outstanding-RPC counter behind the busy indicator

use std::sync::Arc;
use tokio::sync::watch;

/// Counts in-flight RPCs. The indicator is visible while the count is non-zero.
#[derive(Debug, Clone)]
pub struct BusyGauge {
    tx: Arc<watch::Sender<usize>>,
}

impl BusyGauge {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Mark one RPC as started; it ends when the guard drops
    pub fn enter(&self) -> BusyGuard {
        self.tx.send_modify(|n| *n += 1);
        BusyGuard {
            tx: self.tx.clone(),
        }
    }

    pub fn outstanding(&self) -> usize {
        *self.tx.borrow()
    }

    pub fn is_busy(&self) -> bool {
        self.outstanding() > 0
    }

    /// Watch the count change
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.tx.subscribe()
    }
}

impl Default for BusyGauge {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the gauge on drop, including on early return
#[derive(Debug)]
pub struct BusyGuard {
    tx: Arc<watch::Sender<usize>>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.tx.send_modify(|n| *n = n.saturating_sub(1));
    }
}
