use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::offering::{OfferingInput, ServiceOffering};
use crate::domain::ports::OfferingRepository;
use crate::domain::session::Principal;

use super::profile_service::ProfileService;

#[derive(Clone)]
pub struct OfferingService {
    offerings: Arc<dyn OfferingRepository>,
    profiles: ProfileService,
}

impl OfferingService {
    pub fn new(offerings: Arc<dyn OfferingRepository>, profiles: ProfileService) -> Self {
        Self {
            offerings,
            profiles,
        }
    }

    pub fn create(
        &self,
        principal: &Principal,
        input: OfferingInput,
    ) -> Result<ServiceOffering, DomainError> {
        let vendor = self.profiles.own_vendor(principal)?;
        let offering = self.offerings.create(vendor.id, input.validate()?)?;
        log::info!("Vendor {} added service {}", vendor.id, offering.id);
        Ok(offering)
    }

    pub fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        input: OfferingInput,
    ) -> Result<ServiceOffering, DomainError> {
        self.owned(principal, id)?;
        self.offerings.update(id, input.validate()?)
    }

    /// Hides the offering from listings; orders that reference it stay valid.
    pub fn deactivate(&self, principal: &Principal, id: Uuid) -> Result<(), DomainError> {
        self.owned(principal, id)?;
        self.offerings.deactivate(id)?;
        log::info!("Service {} deactivated", id);
        Ok(())
    }

    pub fn list_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<ServiceOffering>, DomainError> {
        self.profiles.vendor(vendor_id)?;
        self.offerings.list_active_for_vendor(vendor_id)
    }

    pub fn find(&self, id: Uuid) -> Result<ServiceOffering, DomainError> {
        self.offerings
            .find_by_id(id)?
            .ok_or(DomainError::NotFound("Service"))
    }

    fn owned(&self, principal: &Principal, id: Uuid) -> Result<ServiceOffering, DomainError> {
        let vendor = self.profiles.own_vendor(principal)?;
        let offering = self.find(id)?;
        if offering.vendor_id != vendor.id {
            return Err(DomainError::Forbidden(
                "service belongs to another vendor".into(),
            ));
        }
        Ok(offering)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::{BigDecimal, Zero};

    use super::*;
    use crate::infrastructure::memory::InMemoryStore;

    fn service() -> OfferingService {
        let store = Arc::new(InMemoryStore::new());
        OfferingService::new(store.clone(), ProfileService::new(store))
    }

    fn input(name: &str) -> OfferingInput {
        OfferingInput {
            name: name.into(),
            description: None,
            price: BigDecimal::from_str("28.00").unwrap(),
            estimated_time: None,
            unit: "cylinder".into(),
            discount: BigDecimal::zero(),
            tags: vec![],
            payment_methods: vec!["cash".into()],
            max_quantity: 2,
        }
    }

    #[test]
    fn vendor_creates_and_lists_offerings() {
        let svc = service();
        let vendor = Principal::vendor(Uuid::new_v4());
        let created = svc.create(&vendor, input("6kg refill")).unwrap();

        let listed = svc.list_for_vendor(created.vendor_id).unwrap();
        assert_eq!(listed, vec![created]);
    }

    #[test]
    fn customers_cannot_create_offerings() {
        let err = service()
            .create(&Principal::customer(Uuid::new_v4()), input("x"))
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn other_vendors_cannot_edit() {
        let svc = service();
        let owner = Principal::vendor(Uuid::new_v4());
        let rival = Principal::vendor(Uuid::new_v4());
        let created = svc.create(&owner, input("6kg refill")).unwrap();

        assert!(matches!(
            svc.update(&rival, created.id, input("stolen")),
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            svc.deactivate(&rival, created.id),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn deactivated_offering_leaves_listing() {
        let svc = service();
        let owner = Principal::vendor(Uuid::new_v4());
        let created = svc.create(&owner, input("6kg refill")).unwrap();
        svc.deactivate(&owner, created.id).unwrap();

        assert!(svc.list_for_vendor(created.vendor_id).unwrap().is_empty());
        assert!(!svc.find(created.id).unwrap().is_active);
    }

    #[test]
    fn invalid_input_is_rejected_before_storage() {
        let svc = service();
        let owner = Principal::vendor(Uuid::new_v4());
        let mut bad = input("6kg refill");
        bad.max_quantity = 0;
        assert!(matches!(
            svc.create(&owner, bad),
            Err(DomainError::InvalidInput(_))
        ));
    }
}
