//! `Mutex<HashMap>`-backed reference implementation of [`LedgerStore`].

use super::domain::{
    ComplexId, Document, DocumentId, Lease, LeaseId, Message, MessageId, MessageLinks, Problem,
    ProblemId, Property, PropertyComplex, PropertyId, RentalUnitRef, Unit, UnitId, UserId,
};
use super::repository::{LedgerStore, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Records {
    properties: HashMap<PropertyId, Property>,
    complexes: HashMap<ComplexId, PropertyComplex>,
    units: HashMap<UnitId, Unit>,
    leases: HashMap<LeaseId, Lease>,
    messages: HashMap<MessageId, Message>,
    documents: HashMap<DocumentId, Document>,
    problems: HashMap<ProblemId, Problem>,
}

impl Records {
    /// Drop every lease and problem referencing a rental unit that is being
    /// deleted. Messages and documents stay: they are audit records.
    fn purge_unit_references(&mut self, unit: &RentalUnitRef) {
        self.leases.retain(|_, lease| lease.unit != *unit);
        self.problems.retain(|_, problem| problem.unit != *unit);
    }
}

/// In-process store used by the service binary and the test suites.
#[derive(Default, Clone)]
pub struct MemoryLedger {
    records: Arc<Mutex<Records>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Records> {
        self.records.lock().expect("ledger mutex poisoned")
    }
}

impl LedgerStore for MemoryLedger {
    fn insert_property(&self, property: Property) -> Result<Property, StoreError> {
        let mut records = self.lock();
        if records.properties.contains_key(&property.id) {
            return Err(StoreError::Conflict);
        }
        records
            .properties
            .insert(property.id.clone(), property.clone());
        Ok(property)
    }

    fn property(&self, id: &PropertyId) -> Result<Option<Property>, StoreError> {
        Ok(self.lock().properties.get(id).cloned())
    }

    fn update_property(&self, property: Property) -> Result<(), StoreError> {
        let mut records = self.lock();
        if !records.properties.contains_key(&property.id) {
            return Err(StoreError::NotFound);
        }
        records.properties.insert(property.id.clone(), property);
        Ok(())
    }

    fn delete_property(&self, id: &PropertyId) -> Result<(), StoreError> {
        let mut records = self.lock();
        if records.properties.remove(id).is_none() {
            return Err(StoreError::NotFound);
        }
        records.purge_unit_references(&RentalUnitRef::Property(id.clone()));
        Ok(())
    }

    fn properties_by_owner(&self, owner: &UserId) -> Result<Vec<Property>, StoreError> {
        Ok(self
            .lock()
            .properties
            .values()
            .filter(|property| property.owner == *owner)
            .cloned()
            .collect())
    }

    fn insert_complex(&self, complex: PropertyComplex) -> Result<PropertyComplex, StoreError> {
        let mut records = self.lock();
        if records.complexes.contains_key(&complex.id) {
            return Err(StoreError::Conflict);
        }
        records.complexes.insert(complex.id.clone(), complex.clone());
        Ok(complex)
    }

    fn complex(&self, id: &ComplexId) -> Result<Option<PropertyComplex>, StoreError> {
        Ok(self.lock().complexes.get(id).cloned())
    }

    fn delete_complex(&self, id: &ComplexId) -> Result<(), StoreError> {
        let mut records = self.lock();
        if records.complexes.remove(id).is_none() {
            return Err(StoreError::NotFound);
        }
        let orphaned: Vec<UnitId> = records
            .units
            .values()
            .filter(|unit| unit.complex == *id)
            .map(|unit| unit.id.clone())
            .collect();
        for unit_id in orphaned {
            records.units.remove(&unit_id);
            records.purge_unit_references(&RentalUnitRef::Unit(unit_id));
        }
        Ok(())
    }

    fn insert_unit(&self, unit: Unit) -> Result<Unit, StoreError> {
        let mut records = self.lock();
        if !records.complexes.contains_key(&unit.complex) {
            return Err(StoreError::NotFound);
        }
        if records.units.contains_key(&unit.id) {
            return Err(StoreError::Conflict);
        }
        records.units.insert(unit.id.clone(), unit.clone());
        Ok(unit)
    }

    fn unit(&self, id: &UnitId) -> Result<Option<Unit>, StoreError> {
        Ok(self.lock().units.get(id).cloned())
    }

    fn update_unit(&self, unit: Unit) -> Result<(), StoreError> {
        let mut records = self.lock();
        if !records.units.contains_key(&unit.id) {
            return Err(StoreError::NotFound);
        }
        records.units.insert(unit.id.clone(), unit);
        Ok(())
    }

    fn delete_unit(&self, id: &UnitId) -> Result<(), StoreError> {
        let mut records = self.lock();
        if records.units.remove(id).is_none() {
            return Err(StoreError::NotFound);
        }
        records.purge_unit_references(&RentalUnitRef::Unit(id.clone()));
        Ok(())
    }

    fn units_of_complex(&self, id: &ComplexId) -> Result<Vec<Unit>, StoreError> {
        Ok(self
            .lock()
            .units
            .values()
            .filter(|unit| unit.complex == *id)
            .cloned()
            .collect())
    }

    fn insert_lease(&self, lease: Lease) -> Result<Lease, StoreError> {
        let mut records = self.lock();
        if records.leases.contains_key(&lease.id) {
            return Err(StoreError::Conflict);
        }
        records.leases.insert(lease.id.clone(), lease.clone());
        Ok(lease)
    }

    fn lease(&self, id: &LeaseId) -> Result<Option<Lease>, StoreError> {
        Ok(self.lock().leases.get(id).cloned())
    }

    fn update_lease(&self, lease: Lease) -> Result<(), StoreError> {
        let mut records = self.lock();
        if !records.leases.contains_key(&lease.id) {
            return Err(StoreError::NotFound);
        }
        records.leases.insert(lease.id.clone(), lease);
        Ok(())
    }

    fn delete_lease(&self, id: &LeaseId) -> Result<(), StoreError> {
        let mut records = self.lock();
        if records.leases.remove(id).is_none() {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn leases(&self) -> Result<Vec<Lease>, StoreError> {
        Ok(self.lock().leases.values().cloned().collect())
    }

    fn lease_for_unit(&self, unit: &RentalUnitRef) -> Result<Option<Lease>, StoreError> {
        Ok(self
            .lock()
            .leases
            .values()
            .find(|lease| lease.unit == *unit)
            .cloned())
    }

    fn insert_message(&self, message: Message) -> Result<Message, StoreError> {
        let mut records = self.lock();
        if records.messages.contains_key(&message.id) {
            return Err(StoreError::Conflict);
        }
        records.messages.insert(message.id.clone(), message.clone());
        Ok(message)
    }

    fn messages_for(&self, recipient: &UserId) -> Result<Vec<Message>, StoreError> {
        let mut messages: Vec<Message> = self
            .lock()
            .messages
            .values()
            .filter(|message| message.recipient == *recipient)
            .cloned()
            .collect();
        messages.sort_by_key(|message| message.created_at);
        Ok(messages)
    }

    fn message_exists(
        &self,
        recipient: &UserId,
        links: &MessageLinks,
        body: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.lock().messages.values().any(|message| {
            message.recipient == *recipient && message.links == *links && message.body == body
        }))
    }

    fn insert_document(&self, document: Document) -> Result<Document, StoreError> {
        let mut records = self.lock();
        if records.documents.contains_key(&document.id) {
            return Err(StoreError::Conflict);
        }
        records
            .documents
            .insert(document.id.clone(), document.clone());
        Ok(document)
    }

    fn document(&self, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        Ok(self.lock().documents.get(id).cloned())
    }

    fn update_document(&self, document: Document) -> Result<(), StoreError> {
        let mut records = self.lock();
        if !records.documents.contains_key(&document.id) {
            return Err(StoreError::NotFound);
        }
        records.documents.insert(document.id.clone(), document);
        Ok(())
    }

    fn documents_for_lease(&self, lease: &LeaseId) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .lock()
            .documents
            .values()
            .filter(|document| document.lease.as_ref() == Some(lease))
            .cloned()
            .collect())
    }

    fn insert_problem(&self, problem: Problem) -> Result<Problem, StoreError> {
        let mut records = self.lock();
        if records.problems.contains_key(&problem.id) {
            return Err(StoreError::Conflict);
        }
        records.problems.insert(problem.id.clone(), problem.clone());
        Ok(problem)
    }

    fn problem(&self, id: &ProblemId) -> Result<Option<Problem>, StoreError> {
        Ok(self.lock().problems.get(id).cloned())
    }

    fn delete_problem(&self, id: &ProblemId) -> Result<(), StoreError> {
        let mut records = self.lock();
        if records.problems.remove(id).is_none() {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn problems_by_owner(&self, owner: &UserId) -> Result<Vec<Problem>, StoreError> {
        let records = self.lock();
        let mut owned: Vec<Problem> = records
            .problems
            .values()
            .filter(|problem| match &problem.unit {
                RentalUnitRef::Property(id) => records
                    .properties
                    .get(id)
                    .is_some_and(|property| property.owner == *owner),
                RentalUnitRef::Unit(id) => records
                    .units
                    .get(id)
                    .and_then(|unit| records.complexes.get(&unit.complex))
                    .is_some_and(|complex| complex.owner == *owner),
            })
            .cloned()
            .collect();
        owned.sort_by_key(|problem| problem.created_at);
        owned.reverse();
        Ok(owned)
    }
}
