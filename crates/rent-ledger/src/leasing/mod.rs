//! The rental ledger: entity model, lease accounting engine, maintenance
//! problem tracking, and the notification and persistence seams they share.

pub mod accounting;
pub mod documents;
pub mod domain;
pub mod memory;
pub mod notify;
pub mod problems;
pub mod repository;
pub mod tenancy;

pub use accounting::{months_due, remaining_months, LeaseAccounting, LedgerError};
pub use memory::MemoryLedger;
pub use repository::LedgerStore;

use chrono::NaiveDate;

/// Supplies the accounting date. Engine operations take `today` explicitly;
/// this seam exists for the layers that have to come up with one.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock dates in the server's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}
