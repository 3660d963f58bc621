//! Persistence contract the engine and trackers are written against.

use super::domain::{
    ComplexId, Document, DocumentId, Lease, LeaseId, Message, MessageLinks, OccupancyStatus,
    Problem, ProblemId, Property, PropertyComplex, PropertyId, RentalUnitRef, Unit, UnitId,
    UserId,
};
use rust_decimal::Decimal;

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The accounting engine treats a property and a complex unit uniformly
/// through this resolved view.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitProfile {
    pub unit: RentalUnitRef,
    pub address: String,
    pub owner: UserId,
    pub monthly_rent: Decimal,
    pub status: OccupancyStatus,
}

/// Storage abstraction covering every ledger entity.
///
/// Cascade contract: deleting a complex deletes its units; deleting a
/// property or unit deletes the leases and problems referencing it. Messages
/// and documents are append-only audit records and are never cascaded.
pub trait LedgerStore: Send + Sync {
    fn insert_property(&self, property: Property) -> Result<Property, StoreError>;
    fn property(&self, id: &PropertyId) -> Result<Option<Property>, StoreError>;
    fn update_property(&self, property: Property) -> Result<(), StoreError>;
    fn delete_property(&self, id: &PropertyId) -> Result<(), StoreError>;
    fn properties_by_owner(&self, owner: &UserId) -> Result<Vec<Property>, StoreError>;

    fn insert_complex(&self, complex: PropertyComplex) -> Result<PropertyComplex, StoreError>;
    fn complex(&self, id: &ComplexId) -> Result<Option<PropertyComplex>, StoreError>;
    fn delete_complex(&self, id: &ComplexId) -> Result<(), StoreError>;

    fn insert_unit(&self, unit: Unit) -> Result<Unit, StoreError>;
    fn unit(&self, id: &UnitId) -> Result<Option<Unit>, StoreError>;
    fn update_unit(&self, unit: Unit) -> Result<(), StoreError>;
    fn delete_unit(&self, id: &UnitId) -> Result<(), StoreError>;
    fn units_of_complex(&self, id: &ComplexId) -> Result<Vec<Unit>, StoreError>;

    fn insert_lease(&self, lease: Lease) -> Result<Lease, StoreError>;
    fn lease(&self, id: &LeaseId) -> Result<Option<Lease>, StoreError>;
    fn update_lease(&self, lease: Lease) -> Result<(), StoreError>;
    fn delete_lease(&self, id: &LeaseId) -> Result<(), StoreError>;
    fn leases(&self) -> Result<Vec<Lease>, StoreError>;
    fn lease_for_unit(&self, unit: &RentalUnitRef) -> Result<Option<Lease>, StoreError>;

    fn insert_message(&self, message: Message) -> Result<Message, StoreError>;
    fn messages_for(&self, recipient: &UserId) -> Result<Vec<Message>, StoreError>;
    /// Identical-content lookup backing notification deduplication.
    fn message_exists(
        &self,
        recipient: &UserId,
        links: &MessageLinks,
        body: &str,
    ) -> Result<bool, StoreError>;

    fn insert_document(&self, document: Document) -> Result<Document, StoreError>;
    fn document(&self, id: &DocumentId) -> Result<Option<Document>, StoreError>;
    fn update_document(&self, document: Document) -> Result<(), StoreError>;
    fn documents_for_lease(&self, lease: &LeaseId) -> Result<Vec<Document>, StoreError>;

    fn insert_problem(&self, problem: Problem) -> Result<Problem, StoreError>;
    fn problem(&self, id: &ProblemId) -> Result<Option<Problem>, StoreError>;
    fn delete_problem(&self, id: &ProblemId) -> Result<(), StoreError>;
    fn problems_by_owner(&self, owner: &UserId) -> Result<Vec<Problem>, StoreError>;

    /// Resolve either side of a [`RentalUnitRef`] to the view the engine
    /// needs: address, owner, rent, occupancy.
    fn unit_profile(&self, unit: &RentalUnitRef) -> Result<Option<UnitProfile>, StoreError> {
        match unit {
            RentalUnitRef::Property(id) => Ok(self.property(id)?.map(|property| UnitProfile {
                unit: unit.clone(),
                address: property.address,
                owner: property.owner,
                monthly_rent: property.monthly_rent,
                status: property.status,
            })),
            RentalUnitRef::Unit(id) => {
                let Some(found) = self.unit(id)? else {
                    return Ok(None);
                };
                let Some(complex) = self.complex(&found.complex)? else {
                    return Ok(None);
                };
                Ok(Some(UnitProfile {
                    unit: unit.clone(),
                    address: format!("{}, unit {}", complex.address, found.label),
                    owner: complex.owner,
                    monthly_rent: found.monthly_rent,
                    status: found.status,
                }))
            }
        }
    }

    /// Every lease whose rental unit belongs to `owner`.
    fn leases_by_owner(&self, owner: &UserId) -> Result<Vec<Lease>, StoreError> {
        let mut owned = Vec::new();
        for lease in self.leases()? {
            if let Some(profile) = self.unit_profile(&lease.unit)? {
                if profile.owner == *owner {
                    owned.push(lease);
                }
            }
        }
        Ok(owned)
    }
}
