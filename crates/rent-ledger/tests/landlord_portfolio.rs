use chrono::{NaiveDate, TimeZone, Utc};
use rent_ledger::leasing::accounting::PortfolioRefresh;
use rent_ledger::leasing::documents::DocumentDesk;
use rent_ledger::leasing::domain::{DocumentStatus, PaymentStatus, RentalUnitRef, UserId};
use rent_ledger::leasing::notify::{EmailError, EmailGateway};
use rent_ledger::leasing::problems::ProblemTracker;
use rent_ledger::leasing::tenancy::{NewUnit, TenancyService};
use rent_ledger::leasing::{LeaseAccounting, LedgerStore, MemoryLedger};
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn landlord() -> UserId {
    UserId("landlord-ada".to_string())
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(UserId, String)>>,
}

impl EmailGateway for RecordingMailer {
    fn send(&self, recipient: &UserId, subject: &str, _body: &str) -> Result<(), EmailError> {
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push((recipient.clone(), subject.to_string()));
        Ok(())
    }
}

fn unit_intake(label: &str, rent: rust_decimal::Decimal) -> NewUnit {
    NewUnit {
        label: label.to_string(),
        size: "720 sqft".to_string(),
        bedrooms: 2,
        bathrooms: 1,
        monthly_rent: rent,
    }
}

/// A two-unit complex refreshed in one sweep: every lease gets its status
/// recomputed against the same accounting date.
#[test]
fn portfolio_refresh_covers_every_unit_in_a_complex() {
    let store = Arc::new(MemoryLedger::new());
    let mail = Arc::new(RecordingMailer::default());
    let tenancy = TenancyService::new(Arc::clone(&store));
    let engine = LeaseAccounting::new(Arc::clone(&store), Arc::clone(&mail));

    let complex = tenancy
        .register_complex("88 Harbor Street".to_string(), landlord())
        .expect("register complex");
    let unit_a = tenancy
        .register_unit(&complex.id, unit_intake("1A", dec!(900)))
        .expect("register 1A");
    let unit_b = tenancy
        .register_unit(&complex.id, unit_intake("2B", dec!(1100)))
        .expect("register 2B");

    let lease_a = tenancy
        .create_lease(
            RentalUnitRef::Unit(unit_a.id),
            vec![UserId("tenant-1".to_string())],
            date(2024, 1, 1),
            date(2025, 1, 1),
            dec!(900),
        )
        .expect("lease 1A");
    let lease_b = tenancy
        .create_lease(
            RentalUnitRef::Unit(unit_b.id),
            vec![UserId("tenant-2".to_string())],
            date(2024, 3, 1),
            date(2025, 3, 1),
            dec!(1100),
        )
        .expect("lease 2B");

    // 2B is fully paid up; 1A has arrears.
    engine.pay(&lease_b.id, 2, date(2024, 5, 10)).expect("settle 2B");

    let outcome = engine
        .refresh_portfolio(&landlord(), date(2024, 5, 10))
        .expect("refresh");
    assert_eq!(outcome, PortfolioRefresh { refreshed: 2, failed: 0 });

    let stored_a = store.lease(&lease_a.id).expect("query").expect("lease");
    assert_eq!(stored_a.payment_status, PaymentStatus::Pending);
    let stored_b = store.lease(&lease_b.id).expect("query").expect("lease");
    assert_eq!(stored_b.payment_status, PaymentStatus::Paid);

    // The arrears notice names the complex address with the unit label.
    let notices = store.messages_for(&landlord()).expect("messages");
    assert!(notices
        .iter()
        .any(|message| message.body.contains("88 Harbor Street, unit 1A")));
}

/// A tenant reports a leak, the landlord resolves it: the record disappears
/// and the tenant is told, with the full unit address in the message.
#[test]
fn problem_resolution_deletes_the_record_and_notifies_the_tenant() {
    let store = Arc::new(MemoryLedger::new());
    let mail = Arc::new(RecordingMailer::default());
    let tenancy = TenancyService::new(Arc::clone(&store));
    let tracker = ProblemTracker::new(Arc::clone(&store), Arc::clone(&mail));
    let reporter = UserId("tenant-1".to_string());

    let complex = tenancy
        .register_complex("88 Harbor Street".to_string(), landlord())
        .expect("register complex");
    let unit = tenancy
        .register_unit(&complex.id, unit_intake("1A", dec!(900)))
        .expect("register unit");

    let reported_at = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).single().expect("timestamp");
    let problem = tracker
        .report(
            reporter.clone(),
            RentalUnitRef::Unit(unit.id),
            "kitchen sink leaks".to_string(),
            reported_at,
        )
        .expect("report");

    let open = store.problems_by_owner(&landlord()).expect("problems");
    assert_eq!(open.len(), 1);

    let resolved_at = Utc.with_ymd_and_hms(2024, 5, 3, 16, 0, 0).single().expect("timestamp");
    tracker.resolve(&problem.id, resolved_at).expect("resolve");

    assert!(store.problem(&problem.id).expect("query").is_none());
    assert!(store.problems_by_owner(&landlord()).expect("problems").is_empty());

    let messages = store.messages_for(&reporter).expect("messages");
    assert_eq!(messages.len(), 1);
    assert!(messages[0].body.contains("88 Harbor Street, unit 1A"));
    assert!(messages[0].body.contains("kitchen sink leaks"));
}

/// Receipts attach to a lease unverified and flip to verified on review.
#[test]
fn documents_attach_to_a_lease_and_verify() {
    let store = Arc::new(MemoryLedger::new());
    let tenancy = TenancyService::new(Arc::clone(&store));
    let desk = DocumentDesk::new(Arc::clone(&store));

    let complex = tenancy
        .register_complex("88 Harbor Street".to_string(), landlord())
        .expect("register complex");
    let unit = tenancy
        .register_unit(&complex.id, unit_intake("1A", dec!(900)))
        .expect("register unit");
    let lease = tenancy
        .create_lease(
            RentalUnitRef::Unit(unit.id),
            vec![UserId("tenant-1".to_string())],
            date(2024, 1, 1),
            date(2025, 1, 1),
            dec!(900),
        )
        .expect("lease");

    let uploaded_at = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).single().expect("timestamp");
    let document = desk
        .attach(
            "May rent receipt".to_string(),
            Some(lease.id.clone()),
            "blob/receipts/2024-05.pdf".to_string(),
            uploaded_at,
        )
        .expect("attach");
    assert_eq!(document.status, DocumentStatus::Unverified);

    let verified = desk.verify(&document.id).expect("verify");
    assert_eq!(verified.status, DocumentStatus::Verified);

    let on_lease = desk.for_lease(&lease.id).expect("list");
    assert_eq!(on_lease.len(), 1);
    assert_eq!(on_lease[0].status, DocumentStatus::Verified);
}
