use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use rent_ledger::leasing::documents::DocumentDesk;
use rent_ledger::leasing::domain::UserId;
use rent_ledger::leasing::notify::{EmailError, EmailGateway};
use rent_ledger::leasing::problems::ProblemTracker;
use rent_ledger::leasing::tenancy::TenancyService;
use rent_ledger::leasing::{Clock, LeaseAccounting, LedgerStore, SystemClock};
use serde::Deserialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Mail adapter for deployments without an SMTP relay: every send is logged
/// and reported as delivered. The in-app message is the system of record.
pub(crate) struct LoggingMailer {
    from_address: String,
}

impl LoggingMailer {
    pub(crate) fn new(from_address: String) -> Self {
        Self { from_address }
    }
}

impl EmailGateway for LoggingMailer {
    fn send(&self, recipient: &UserId, subject: &str, _body: &str) -> Result<(), EmailError> {
        info!(from = %self.from_address, recipient = %recipient.0, %subject, "email dispatched");
        Ok(())
    }
}

/// Every ledger service wired over one shared store and mail gateway.
pub(crate) struct LedgerServices<S, E> {
    pub(crate) store: Arc<S>,
    pub(crate) tenancy: TenancyService<S>,
    pub(crate) accounting: LeaseAccounting<S, E>,
    pub(crate) problems: ProblemTracker<S, E>,
    pub(crate) documents: DocumentDesk<S>,
    clock: SystemClock,
}

impl<S, E> LedgerServices<S, E>
where
    S: LedgerStore,
    E: EmailGateway,
{
    pub(crate) fn new(store: Arc<S>, mail: Arc<E>) -> Self {
        Self {
            tenancy: TenancyService::new(Arc::clone(&store)),
            accounting: LeaseAccounting::new(Arc::clone(&store), Arc::clone(&mail)),
            problems: ProblemTracker::new(Arc::clone(&store), mail),
            documents: DocumentDesk::new(Arc::clone(&store)),
            store,
            clock: SystemClock,
        }
    }

    /// The accounting date for requests that do not override it.
    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
