//! The lease accounting engine: months-elapsed arithmetic, payment status
//! transitions, and idempotent due-state notifications.

use super::domain::{Lease, LeaseId, MessageLinks, PaymentStatus, UserId};
use super::notify::{EmailGateway, Notifier};
use super::repository::{LedgerStore, StoreError, UnitProfile};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("lease {0:?} references a rental unit that no longer exists")]
    DanglingUnit(LeaseId),
}

/// Whole calendar months from `from` to `to`, counting a month only once its
/// day-of-month anniversary has passed. Negative when `to` precedes `from`.
fn whole_months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    let months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if to.day() < from.day() {
        months - 1
    } else {
        months
    }
}

/// Full months left on the lease term. Zero once `today` passes the end date.
pub fn remaining_months(lease: &Lease, today: NaiveDate) -> u32 {
    if today > lease.end_date {
        return 0;
    }
    whole_months_between(today, lease.end_date).max(0) as u32
}

/// Full rental periods elapsed and unpaid.
///
/// `elapsed * monthly - amount_paid`, floored to whole months and clamped to
/// zero; overpayment therefore reads as nothing due. A lease that has not
/// started yet owes nothing. Exact-cents arithmetic throughout.
pub fn months_due(lease: &Lease, today: NaiveDate) -> u32 {
    if today < lease.start_date {
        return 0;
    }
    if lease.monthly_amount <= Decimal::ZERO {
        return 0;
    }
    let elapsed = whole_months_between(lease.start_date, today).max(0);
    let owed = Decimal::from(elapsed) * lease.monthly_amount - lease.amount_paid;
    if owed <= Decimal::ZERO {
        return 0;
    }
    (owed / lease.monthly_amount).floor().to_u32().unwrap_or(0)
}

/// Outcome of a batch recompute across one landlord's leases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortfolioRefresh {
    pub refreshed: usize,
    pub failed: usize,
}

/// Stateful engine driving status transitions and notifications.
///
/// Every mutation runs under a per-lease lock so concurrent payment
/// submissions cannot double-credit `amount_paid`.
pub struct LeaseAccounting<S, E> {
    store: Arc<S>,
    notifier: Notifier<S, E>,
    locks: Mutex<HashMap<LeaseId, Arc<Mutex<()>>>>,
}

/// Message timestamps derive from the supplied accounting date so repeated
/// runs over the same day are reproducible.
fn message_timestamp(today: NaiveDate) -> DateTime<Utc> {
    today.and_time(NaiveTime::MIN).and_utc()
}

impl<S, E> LeaseAccounting<S, E>
where
    S: LedgerStore,
    E: EmailGateway,
{
    pub fn new(store: Arc<S>, mail: Arc<E>) -> Self {
        Self {
            notifier: Notifier::new(Arc::clone(&store), mail),
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn lease_lock(&self, id: &LeaseId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("lock registry poisoned");
        locks.entry(id.clone()).or_default().clone()
    }

    fn fetch_lease(&self, id: &LeaseId) -> Result<Lease, LedgerError> {
        Ok(self.store.lease(id)?.ok_or(StoreError::NotFound)?)
    }

    fn profile_for(&self, lease: &Lease) -> Result<UnitProfile, LedgerError> {
        self.store
            .unit_profile(&lease.unit)?
            .ok_or_else(|| LedgerError::DanglingUnit(lease.id.clone()))
    }

    /// Notify the owner and every tenant about the current due-state, at
    /// most once per distinct state.
    ///
    /// Identical owner messages suppress the whole send, so repeated calls
    /// while nothing changed are no-ops. Tenant messages share the body and
    /// ride on the owner-scoped dedup key.
    pub fn notify_months_due(&self, lease_id: &LeaseId, today: NaiveDate) -> Result<(), LedgerError> {
        let lease = self.fetch_lease(lease_id)?;
        self.notify_due_state(&lease, today)
    }

    fn notify_due_state(&self, lease: &Lease, today: NaiveDate) -> Result<(), LedgerError> {
        let due = months_due(lease, today);
        if due == 0 {
            return Ok(());
        }

        let profile = self.profile_for(lease)?;
        let due_amount = lease.monthly_amount * Decimal::from(due);
        let body = format!(
            "Rent due for {}: {} month(s) outstanding, totaling {}.",
            profile.address, due, due_amount
        );
        let links = MessageLinks {
            unit: Some(lease.unit.clone()),
            lease: Some(lease.id.clone()),
        };

        if self.store.message_exists(&profile.owner, &links, &body)? {
            return Ok(());
        }

        let at = message_timestamp(today);
        self.notifier
            .record_and_email(&profile.owner, "Rent due", &body, links.clone(), at)?;
        for tenant in &lease.tenants {
            self.notifier
                .record_and_email(tenant, "Rent due", &body, links.clone(), at)?;
        }
        Ok(())
    }

    /// Re-derive the payment status from the due count and persist any flip,
    /// then notify. Notification cadence follows due-count changes, not the
    /// status transition itself.
    pub fn update_payment_status(
        &self,
        lease_id: &LeaseId,
        today: NaiveDate,
    ) -> Result<PaymentStatus, LedgerError> {
        let lock = self.lease_lock(lease_id);
        let _guard = lock.lock().expect("lease lock poisoned");
        self.refresh_status(lease_id, today)
    }

    fn refresh_status(
        &self,
        lease_id: &LeaseId,
        today: NaiveDate,
    ) -> Result<PaymentStatus, LedgerError> {
        let mut lease = self.fetch_lease(lease_id)?;
        let due = months_due(&lease, today);

        if due > 0 && lease.payment_status == PaymentStatus::Paid {
            lease.payment_status = PaymentStatus::Pending;
            self.store.update_lease(lease.clone())?;
        } else if due == 0 && lease.payment_status == PaymentStatus::Pending {
            lease.payment_status = PaymentStatus::Paid;
            self.store.update_lease(lease.clone())?;
        }

        self.notify_due_state(&lease, today)?;
        Ok(lease.payment_status)
    }

    /// Credit up to `months` whole rental periods against the lease.
    ///
    /// Returns `Ok(false)` with no side effects when nothing is due or
    /// `months` is zero; the caller must check the flag. A successful
    /// payment re-derives the status and records a payment-received
    /// notification for the owner.
    pub fn pay(
        &self,
        lease_id: &LeaseId,
        months: u32,
        today: NaiveDate,
    ) -> Result<bool, LedgerError> {
        let lock = self.lease_lock(lease_id);
        let _guard = lock.lock().expect("lease lock poisoned");

        let mut lease = self.fetch_lease(lease_id)?;
        let due = months_due(&lease, today);
        if due == 0 || months == 0 {
            return Ok(false);
        }

        let pay_months = months.min(due);
        let amount = lease.monthly_amount * Decimal::from(pay_months);
        lease.amount_paid += amount;
        self.store.update_lease(lease.clone())?;

        self.refresh_status(lease_id, today)?;

        let refreshed = self.fetch_lease(lease_id)?;
        let new_due = months_due(&refreshed, today);
        let profile = self.profile_for(&refreshed)?;
        let body = format!(
            "Payment received for {}: {} covering {} month(s); {} month(s) now due.",
            profile.address, amount, pay_months, new_due
        );
        let links = MessageLinks {
            unit: Some(refreshed.unit.clone()),
            lease: Some(refreshed.id.clone()),
        };
        self.notifier.record_and_email(
            &profile.owner,
            "Payment received",
            &body,
            links,
            message_timestamp(today),
        )?;

        Ok(true)
    }

    /// Refresh every lease on the landlord's units. One lease failing is
    /// logged and skipped; the rest still run.
    pub fn refresh_portfolio(
        &self,
        owner: &UserId,
        today: NaiveDate,
    ) -> Result<PortfolioRefresh, LedgerError> {
        let mut refreshed = 0;
        let mut failed = 0;
        for lease in self.store.leases_by_owner(owner)? {
            match self.update_payment_status(&lease.id, today) {
                Ok(_) => refreshed += 1,
                Err(err) => {
                    failed += 1;
                    warn!(lease = %lease.id.0, error = %err, "portfolio refresh skipped lease");
                }
            }
        }
        Ok(PortfolioRefresh { refreshed, failed })
    }
}
