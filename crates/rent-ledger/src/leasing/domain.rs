//! Entity model for the rental ledger: properties, complexes, units, leases,
//! messages, documents, and maintenance problems.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Mint a process-unique identifier with a readable prefix (`lease-000042`).
pub(crate) fn next_id(prefix: &str) -> String {
    let n = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{n:06}")
}

/// A landlord or tenant account. Accounts live outside this crate; the
/// ledger only stores references to them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComplexId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProblemId(pub String);

/// Reference to either a standalone property or a unit inside a complex.
///
/// Replaces the nullable dual foreign keys of the original schema so that
/// engine code never branches on nulls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalUnitRef {
    Property(PropertyId),
    Unit(UnitId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Condo,
    Apartment,
    Studio,
    House,
    Townhouse,
    Bungalow,
    CoOp,
    Loft,
    Barn,
    Shack,
    Cottage,
    Parking,
}

impl PropertyKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Condo => "Condo",
            Self::Apartment => "Apartment",
            Self::Studio => "Studio",
            Self::House => "House",
            Self::Townhouse => "Townhouse",
            Self::Bungalow => "Bungalow",
            Self::CoOp => "Co-op",
            Self::Loft => "Loft",
            Self::Barn => "Barn",
            Self::Shack => "Shack",
            Self::Cottage => "Cottage",
            Self::Parking => "Parking",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceStatus {
    Negotiable,
    Fixed,
}

impl PriceStatus {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Negotiable => Self::Fixed,
            Self::Fixed => Self::Negotiable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyStatus {
    Available,
    Rented,
}

/// A standalone rental property owned directly by a landlord.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub address: String,
    pub kind: PropertyKind,
    pub size: String,
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub parking_spaces: u8,
    pub amenities: String,
    pub description: String,
    pub monthly_rent: Decimal,
    pub rent_status: PriceStatus,
    pub status: OccupancyStatus,
    pub owner: UserId,
}

/// A building owned by a landlord, containing zero or more units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyComplex {
    pub id: ComplexId,
    pub address: String,
    pub owner: UserId,
}

/// A rentable unit inside a complex. Ownership derives from the complex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub complex: ComplexId,
    pub label: String,
    pub size: String,
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub monthly_rent: Decimal,
    pub status: OccupancyStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
        }
    }
}

/// Contractual link between one rental unit and its tenants.
///
/// `amount_paid` only ever grows, and only in whole multiples of
/// `monthly_amount`; the accounting engine owns both rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lease {
    pub id: LeaseId,
    pub unit: RentalUnitRef,
    pub tenants: Vec<UserId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_amount: Decimal,
    pub amount_paid: Decimal,
    pub payment_status: PaymentStatus,
}

impl Lease {
    pub(crate) fn new(
        unit: RentalUnitRef,
        tenants: Vec<UserId>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        monthly_amount: Decimal,
    ) -> Self {
        Self {
            id: LeaseId(next_id("lease")),
            unit,
            tenants,
            start_date,
            end_date,
            monthly_amount,
            amount_paid: Decimal::ZERO,
            payment_status: PaymentStatus::Pending,
        }
    }
}

/// Optional entity links attached to a notification record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLinks {
    pub unit: Option<RentalUnitRef>,
    pub lease: Option<LeaseId>,
}

/// An in-app notification. Immutable once created; the message table is an
/// append-only audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub recipient: UserId,
    pub links: MessageLinks,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub(crate) fn new(
        recipient: UserId,
        links: MessageLinks,
        body: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId(next_id("msg")),
            recipient,
            links,
            body,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Unverified,
    Verified,
}

/// Supporting paperwork (receipts, payment proof). The blob itself lives in
/// external storage; `storage_key` is an opaque reference validated upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub lease: Option<LeaseId>,
    pub storage_key: String,
    pub status: DocumentStatus,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    pub(crate) fn new(
        title: String,
        lease: Option<LeaseId>,
        storage_key: String,
        uploaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DocumentId(next_id("doc")),
            title,
            lease,
            storage_key,
            status: DocumentStatus::Unverified,
            uploaded_at,
        }
    }
}

/// A maintenance problem reported by a tenant. Resolution deletes the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: ProblemId,
    pub tenant: UserId,
    pub unit: RentalUnitRef,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Problem {
    pub(crate) fn new(
        tenant: UserId,
        unit: RentalUnitRef,
        description: String,
        reported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ProblemId(next_id("problem")),
            tenant,
            unit,
            description,
            created_at: reported_at,
            updated_at: reported_at,
        }
    }
}
