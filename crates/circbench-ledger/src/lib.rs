//! Result ledger for circbench.
//!
//! Two CSV tables live in the ledger directory: `results_table.csv`, one row
//! per completed (instance, variant, repetition), and `instances_table.csv`,
//! the parameters each instance was generated with. A `ledger.lock` file
//! keeps a second campaign from appending to the same directory.

mod ledger;
mod lock;
mod record;

pub use ledger::{AppendOutcome, Ledger, read_instances, read_results};
pub use lock::{LOCK_FILE, LedgerLock, LockInfo, read_lock_info};
pub use record::{
    INSTANCES_FILE, INSTANCES_HEADER, InstanceRecord, LedgerRecord, RESULTS_FILE, RESULTS_HEADER,
};
