//! Lease lifecycle and the occupancy invariant: a rental unit is `Rented`
//! exactly while an active lease references it.

use super::domain::{
    next_id, ComplexId, Lease, LeaseId, OccupancyStatus, PriceStatus, Property, PropertyComplex,
    PropertyId, PropertyKind, RentalUnitRef, Unit, UnitId, UserId,
};
use super::repository::{LedgerStore, StoreError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum TenancyError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("lease term must end after it starts")]
    InvalidTerm,
    #[error("monthly rent must be positive")]
    NonPositiveRent,
    #[error("rental unit no longer exists")]
    UnknownUnit,
    #[error("rental unit is not available")]
    UnitUnavailable,
    #[error("tenant is already on the lease")]
    TenantAlreadyOnLease,
    #[error("tenant is not on the lease")]
    TenantNotOnLease,
}

/// Intake payload for a standalone property listing.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProperty {
    pub owner: UserId,
    pub address: String,
    pub kind: PropertyKind,
    pub size: String,
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub parking_spaces: u8,
    #[serde(default)]
    pub amenities: String,
    #[serde(default)]
    pub description: String,
    pub monthly_rent: Decimal,
    pub rent_status: PriceStatus,
}

/// Intake payload for a unit inside an existing complex.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUnit {
    pub label: String,
    pub size: String,
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub monthly_rent: Decimal,
}

/// What happened to the lease after a tenant removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantRemoval {
    LeaseRetained,
    LeaseClosed,
}

/// Registration and lease lifecycle operations.
pub struct TenancyService<S> {
    store: Arc<S>,
}

impl<S> TenancyService<S>
where
    S: LedgerStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn register_property(&self, intake: NewProperty) -> Result<Property, TenancyError> {
        if intake.monthly_rent <= Decimal::ZERO {
            return Err(TenancyError::NonPositiveRent);
        }
        let property = Property {
            id: PropertyId(next_id("prop")),
            address: intake.address,
            kind: intake.kind,
            size: intake.size,
            bedrooms: intake.bedrooms,
            bathrooms: intake.bathrooms,
            parking_spaces: intake.parking_spaces,
            amenities: intake.amenities,
            description: intake.description,
            monthly_rent: intake.monthly_rent,
            rent_status: intake.rent_status,
            status: OccupancyStatus::Available,
            owner: intake.owner,
        };
        Ok(self.store.insert_property(property)?)
    }

    pub fn register_complex(
        &self,
        address: String,
        owner: UserId,
    ) -> Result<PropertyComplex, TenancyError> {
        let complex = PropertyComplex {
            id: ComplexId(next_id("complex")),
            address,
            owner,
        };
        Ok(self.store.insert_complex(complex)?)
    }

    pub fn register_unit(
        &self,
        complex_id: &ComplexId,
        intake: NewUnit,
    ) -> Result<Unit, TenancyError> {
        if intake.monthly_rent <= Decimal::ZERO {
            return Err(TenancyError::NonPositiveRent);
        }
        let unit = Unit {
            id: UnitId(next_id("unit")),
            complex: complex_id.clone(),
            label: intake.label,
            size: intake.size,
            bedrooms: intake.bedrooms,
            bathrooms: intake.bathrooms,
            monthly_rent: intake.monthly_rent,
            status: OccupancyStatus::Available,
        };
        Ok(self.store.insert_unit(unit)?)
    }

    /// Flip a listing between negotiable and fixed rent.
    pub fn toggle_rent_status(&self, id: &PropertyId) -> Result<PriceStatus, TenancyError> {
        let mut property = self.store.property(id)?.ok_or(StoreError::NotFound)?;
        property.rent_status = property.rent_status.toggled();
        let flipped = property.rent_status;
        self.store.update_property(property)?;
        Ok(flipped)
    }

    /// Create a lease over an available unit and mark the unit rented.
    ///
    /// An empty tenant list is allowed: assignment may happen after signing.
    pub fn create_lease(
        &self,
        unit: RentalUnitRef,
        tenants: Vec<UserId>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        monthly_amount: Decimal,
    ) -> Result<Lease, TenancyError> {
        if end_date <= start_date {
            return Err(TenancyError::InvalidTerm);
        }
        if monthly_amount <= Decimal::ZERO {
            return Err(TenancyError::NonPositiveRent);
        }
        let profile = self
            .store
            .unit_profile(&unit)?
            .ok_or(TenancyError::UnknownUnit)?;
        if profile.status != OccupancyStatus::Available
            || self.store.lease_for_unit(&unit)?.is_some()
        {
            return Err(TenancyError::UnitUnavailable);
        }

        let lease = self.store.insert_lease(Lease::new(
            unit.clone(),
            tenants,
            start_date,
            end_date,
            monthly_amount,
        ))?;
        self.set_unit_status(&unit, OccupancyStatus::Rented)?;
        Ok(lease)
    }

    pub fn add_tenant(&self, lease_id: &LeaseId, tenant: UserId) -> Result<(), TenancyError> {
        let mut lease = self.store.lease(lease_id)?.ok_or(StoreError::NotFound)?;
        if lease.tenants.contains(&tenant) {
            return Err(TenancyError::TenantAlreadyOnLease);
        }
        lease.tenants.push(tenant);
        Ok(self.store.update_lease(lease)?)
    }

    /// Take a tenant off the lease. Removing the last tenant closes the
    /// lease and frees the unit.
    pub fn remove_tenant(
        &self,
        lease_id: &LeaseId,
        tenant: &UserId,
    ) -> Result<TenantRemoval, TenancyError> {
        let mut lease = self.store.lease(lease_id)?.ok_or(StoreError::NotFound)?;
        let before = lease.tenants.len();
        lease.tenants.retain(|candidate| candidate != tenant);
        if lease.tenants.len() == before {
            return Err(TenancyError::TenantNotOnLease);
        }

        if lease.tenants.is_empty() {
            self.close_lease(lease)?;
            return Ok(TenantRemoval::LeaseClosed);
        }
        self.store.update_lease(lease)?;
        Ok(TenantRemoval::LeaseRetained)
    }

    /// Owner-initiated deletion: removes the lease and frees the unit.
    pub fn terminate_lease(&self, lease_id: &LeaseId) -> Result<(), TenancyError> {
        let lease = self.store.lease(lease_id)?.ok_or(StoreError::NotFound)?;
        self.close_lease(lease)
    }

    fn close_lease(&self, lease: Lease) -> Result<(), TenancyError> {
        self.store.delete_lease(&lease.id)?;
        self.set_unit_status(&lease.unit, OccupancyStatus::Available)
    }

    /// The unit may already be gone (cascaded delete); that is not an error
    /// when reverting to available.
    fn set_unit_status(
        &self,
        unit: &RentalUnitRef,
        status: OccupancyStatus,
    ) -> Result<(), TenancyError> {
        match unit {
            RentalUnitRef::Property(id) => match self.store.property(id)? {
                Some(mut property) => {
                    property.status = status;
                    Ok(self.store.update_property(property)?)
                }
                None if status == OccupancyStatus::Available => Ok(()),
                None => Err(TenancyError::UnknownUnit),
            },
            RentalUnitRef::Unit(id) => match self.store.unit(id)? {
                Some(mut found) => {
                    found.status = status;
                    Ok(self.store.update_unit(found)?)
                }
                None if status == OccupancyStatus::Available => Ok(()),
                None => Err(TenancyError::UnknownUnit),
            },
        }
    }
}
