use chrono::NaiveDate;
use rent_ledger::leasing::domain::{PaymentStatus, PriceStatus, PropertyKind, RentalUnitRef, UserId};
use rent_ledger::leasing::notify::{EmailError, EmailGateway};
use rent_ledger::leasing::tenancy::{NewProperty, TenancyService};
use rent_ledger::leasing::{months_due, remaining_months, LeaseAccounting, LedgerStore, MemoryLedger};
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn landlord() -> UserId {
    UserId("landlord-ada".to_string())
}

fn tenant() -> UserId {
    UserId("tenant-bo".to_string())
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(UserId, String)>>,
}

impl RecordingMailer {
    fn sent(&self) -> Vec<(UserId, String)> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }
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

fn house_intake() -> NewProperty {
    NewProperty {
        owner: landlord(),
        address: "12 Cherry Lane".to_string(),
        kind: PropertyKind::House,
        size: "1400 sqft".to_string(),
        bedrooms: 3,
        bathrooms: 2,
        parking_spaces: 1,
        amenities: "garden, garage".to_string(),
        description: "detached house".to_string(),
        monthly_rent: dec!(1000),
        rent_status: PriceStatus::Fixed,
    }
}

/// A lease signed mid-January, revisited through the spring: months accrue,
/// partial payment brings the balance down, settling flips the status back.
#[test]
fn a_quarter_of_rent_accrual_and_payment() {
    let store = Arc::new(MemoryLedger::new());
    let mail = Arc::new(RecordingMailer::default());
    let tenancy = TenancyService::new(Arc::clone(&store));
    let engine = LeaseAccounting::new(Arc::clone(&store), Arc::clone(&mail));

    let property = tenancy.register_property(house_intake()).expect("register");
    let lease = tenancy
        .create_lease(
            RentalUnitRef::Property(property.id),
            vec![tenant()],
            date(2024, 1, 15),
            date(2025, 1, 15),
            dec!(1000),
        )
        .expect("lease created");

    // Mid-April: three anniversaries have passed, nine remain on the term.
    let today = date(2024, 4, 20);
    let stored = store.lease(&lease.id).expect("query").expect("lease");
    assert_eq!(months_due(&stored, today), 3);
    assert_eq!(remaining_months(&stored, today), 8);

    let status = engine
        .update_payment_status(&lease.id, today)
        .expect("refresh");
    assert_eq!(status, PaymentStatus::Pending);

    // The refresh notified owner and tenant once; repeating it adds nothing.
    engine
        .update_payment_status(&lease.id, today)
        .expect("refresh again");
    assert_eq!(store.messages_for(&landlord()).expect("messages").len(), 1);
    assert_eq!(store.messages_for(&tenant()).expect("messages").len(), 1);

    // Two months paid: one still due, status stays pending.
    let accepted = engine.pay(&lease.id, 2, today).expect("pay");
    assert!(accepted);
    let stored = store.lease(&lease.id).expect("query").expect("lease");
    assert_eq!(stored.amount_paid, dec!(2000));
    assert_eq!(stored.payment_status, PaymentStatus::Pending);
    assert_eq!(months_due(&stored, today), 1);

    // Settling the rest flips the lease to paid.
    let accepted = engine.pay(&lease.id, 5, today).expect("pay remainder");
    assert!(accepted);
    let stored = store.lease(&lease.id).expect("query").expect("lease");
    assert_eq!(stored.amount_paid, dec!(3000), "capped at what was due");
    assert_eq!(stored.payment_status, PaymentStatus::Paid);
    assert_eq!(months_due(&stored, today), 0);

    // Nothing due now, so a further payment is refused outright.
    let accepted = engine.pay(&lease.id, 1, today).expect("pay on settled");
    assert!(!accepted);
    let stored = store.lease(&lease.id).expect("query").expect("lease");
    assert_eq!(stored.amount_paid, dec!(3000));

    // Owner saw the April due notice, the reduced-balance notice after the
    // partial payment, and a receipt per accepted payment.
    let owner_subjects: Vec<String> = mail
        .sent()
        .into_iter()
        .filter(|(recipient, _)| *recipient == landlord())
        .map(|(_, subject)| subject)
        .collect();
    assert_eq!(
        owner_subjects,
        vec!["Rent due", "Rent due", "Payment received", "Payment received"]
    );
}

/// A month later the cycle repeats: a fresh anniversary re-opens the balance
/// and the changed due-state produces a new notification.
#[test]
fn the_next_anniversary_reopens_the_balance() {
    let store = Arc::new(MemoryLedger::new());
    let mail = Arc::new(RecordingMailer::default());
    let tenancy = TenancyService::new(Arc::clone(&store));
    let engine = LeaseAccounting::new(Arc::clone(&store), Arc::clone(&mail));

    let property = tenancy.register_property(house_intake()).expect("register");
    let lease = tenancy
        .create_lease(
            RentalUnitRef::Property(property.id),
            vec![tenant()],
            date(2024, 1, 15),
            date(2025, 1, 15),
            dec!(1000),
        )
        .expect("lease created");

    let april = date(2024, 4, 20);
    engine.pay(&lease.id, 3, april).expect("settle april");
    let stored = store.lease(&lease.id).expect("query").expect("lease");
    assert_eq!(stored.payment_status, PaymentStatus::Paid);

    let may = date(2024, 5, 15);
    let status = engine.update_payment_status(&lease.id, may).expect("refresh");
    assert_eq!(status, PaymentStatus::Pending);
    let stored = store.lease(&lease.id).expect("query").expect("lease");
    assert_eq!(months_due(&stored, may), 1);

    let due_notices = store
        .messages_for(&landlord())
        .expect("messages")
        .into_iter()
        .filter(|message| message.body.starts_with("Rent due"))
        .count();
    assert_eq!(due_notices, 1, "may notice is the first rent-due message");
}
