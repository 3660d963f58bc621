use crate::infra::{LedgerServices, LoggingMailer};
use chrono::{Local, Months, NaiveDate, NaiveTime};
use clap::Args;
use rent_ledger::error::AppError;
use rent_ledger::leasing::domain::{Lease, LeaseId, PriceStatus, PropertyKind, RentalUnitRef, UserId};
use rent_ledger::leasing::repository::StoreError;
use rent_ledger::leasing::tenancy::{NewProperty, NewUnit};
use rent_ledger::leasing::{months_due, remaining_months, LedgerStore, MemoryLedger};
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Accounting date for the walkthrough (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

/// Seed a landlord's portfolio, let three months of rent accrue, and settle
/// part of it, printing the ledger after each step.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let start = today
        .checked_sub_months(Months::new(3))
        .unwrap_or(today);
    let end = start
        .checked_add_months(Months::new(12))
        .unwrap_or(start);

    let store = Arc::new(MemoryLedger::new());
    let mail = Arc::new(LoggingMailer::new("ledger@localhost".to_string()));
    let services = LedgerServices::new(Arc::clone(&store), mail);

    let landlord = UserId("landlord-demo".to_string());
    let tenant = UserId("tenant-demo".to_string());

    println!("Rental ledger demo (accounting date {today})");

    let house = services.tenancy.register_property(NewProperty {
        owner: landlord.clone(),
        address: "12 Cherry Lane".to_string(),
        kind: PropertyKind::House,
        size: "1400 sqft".to_string(),
        bedrooms: 3,
        bathrooms: 2,
        parking_spaces: 1,
        amenities: "garden, garage".to_string(),
        description: "detached house".to_string(),
        monthly_rent: Decimal::from(1000),
        rent_status: PriceStatus::Fixed,
    })?;
    let complex = services
        .tenancy
        .register_complex("88 Harbor Street".to_string(), landlord.clone())?;
    let unit = services.tenancy.register_unit(
        &complex.id,
        NewUnit {
            label: "2B".to_string(),
            size: "720 sqft".to_string(),
            bedrooms: 2,
            bathrooms: 1,
            monthly_rent: Decimal::from(900),
        },
    )?;
    println!(
        "Registered {} and {} (unit {})",
        house.address, complex.address, unit.label
    );

    let lease = services.tenancy.create_lease(
        RentalUnitRef::Property(house.id.clone()),
        vec![tenant.clone()],
        start,
        end,
        Decimal::from(1000),
    )?;
    println!(
        "Lease {} signed {start} to {end} at 1000/month",
        lease.id.0
    );

    let status = services.accounting.update_payment_status(&lease.id, today)?;
    let stored = fetch(&*store, &lease.id)?;
    println!(
        "After refresh: {} month(s) due, {} month(s) remaining, status {}",
        months_due(&stored, today),
        remaining_months(&stored, today),
        status.label()
    );

    let accepted = services.accounting.pay(&lease.id, 2, today)?;
    let stored = fetch(&*store, &lease.id)?;
    println!(
        "Paid 2 months (accepted: {accepted}): balance {} paid, {} month(s) still due, status {}",
        stored.amount_paid,
        months_due(&stored, today),
        stored.payment_status.label()
    );

    let reported_at = today.and_time(NaiveTime::MIN).and_utc();
    let problem = services.problems.report(
        tenant.clone(),
        RentalUnitRef::Unit(unit.id.clone()),
        "kitchen sink leaks".to_string(),
        reported_at,
    )?;
    println!("Problem reported: {}", problem.description);
    services.problems.resolve(&problem.id, reported_at)?;
    println!("Problem resolved and the record removed");

    println!("\nMessages for {}:", landlord.0);
    for message in store.messages_for(&landlord)? {
        println!("  - {}", message.body);
    }
    println!("Messages for {}:", tenant.0);
    for message in store.messages_for(&tenant)? {
        println!("  - {}", message.body);
    }

    Ok(())
}

fn fetch<S: LedgerStore>(store: &S, lease_id: &LeaseId) -> Result<Lease, AppError> {
    Ok(store.lease(lease_id)?.ok_or(StoreError::NotFound)?)
}
