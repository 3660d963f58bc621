//! Maintenance problem tracking. Two states only: a problem is open while
//! its record exists and resolved by deleting it; the deletion itself
//! notifies the reporting tenant.

use super::domain::{MessageLinks, Problem, ProblemId, RentalUnitRef, UserId};
use super::notify::{EmailGateway, Notifier};
use super::repository::{LedgerStore, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ProblemError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("problem references a rental unit that no longer exists")]
    UnknownUnit,
}

pub struct ProblemTracker<S, E> {
    store: Arc<S>,
    notifier: Notifier<S, E>,
}

impl<S, E> ProblemTracker<S, E>
where
    S: LedgerStore,
    E: EmailGateway,
{
    pub fn new(store: Arc<S>, mail: Arc<E>) -> Self {
        Self {
            notifier: Notifier::new(Arc::clone(&store), mail),
            store,
        }
    }

    /// File a problem against a rental unit on behalf of a tenant.
    pub fn report(
        &self,
        tenant: UserId,
        unit: RentalUnitRef,
        description: String,
        reported_at: DateTime<Utc>,
    ) -> Result<Problem, ProblemError> {
        if self.store.unit_profile(&unit)?.is_none() {
            return Err(ProblemError::UnknownUnit);
        }
        Ok(self
            .store
            .insert_problem(Problem::new(tenant, unit, description, reported_at))?)
    }

    /// Resolve a problem by deleting it, then tell the reporting tenant.
    ///
    /// One-directional: there is no reopen and no resolved-problem history.
    pub fn resolve(
        &self,
        problem_id: &ProblemId,
        resolved_at: DateTime<Utc>,
    ) -> Result<(), ProblemError> {
        let problem = self
            .store
            .problem(problem_id)?
            .ok_or(StoreError::NotFound)?;
        self.store.delete_problem(problem_id)?;

        let address = self
            .store
            .unit_profile(&problem.unit)?
            .map(|profile| profile.address)
            .unwrap_or_else(|| "your rental".to_string());
        let body = format!(
            "Your reported problem at {} has been resolved: {}",
            address, problem.description
        );
        self.notifier.record_and_email(
            &problem.tenant,
            "Problem resolved",
            &body,
            MessageLinks {
                unit: Some(problem.unit),
                lease: None,
            },
            resolved_at,
        )?;
        Ok(())
    }
}
