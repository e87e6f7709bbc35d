//! Offline shell cache
//!
//! Keeps the application shell available without network access and
//! moves between shell versions without serving mixed-version assets.
//!
//! # Lifecycle
//!
//! | Step | Effect |
//! |------|--------|
//! | Install | Fetch the whole asset set into a store named for the version; any failure aborts |
//! | Skip waiting | A successful install activates immediately |
//! | Activate | Delete every store but the current one, then claim the page |
//! | Fetch | Reads go network-first with cache fallback; everything else bypasses the cache |
//! | Reset | Unregister, delete every store, reload |

pub mod registration;
pub mod storage;
pub mod worker;

pub use registration::{
    spawn_worker, LifecycleEvent, RegisterOutcome, RegistrationRecord, ResetReport,
    ShellRegistration, WorkerHandle, WorkerMessage, WorkerStatus,
};
pub use storage::{CacheStorage, CacheStore, StoreInfo};
pub use worker::{ShellWorker, WorkerState};
