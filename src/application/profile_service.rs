use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::ProfileRepository;
use crate::domain::profile::{
    UserProfile, UserProfileUpdate, Vendor, VendorProfile, VendorUpdate, DEFAULT_BUSINESS_NAME,
};
use crate::domain::session::{Principal, Role};

/// The profile a principal sees for its current role.
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    Customer(UserProfile),
    Vendor(VendorProfile),
}

#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    /// Fetch-or-create for whichever side the principal is acting on.
    pub fn my_profile(&self, principal: &Principal) -> Result<Profile, DomainError> {
        match principal.role {
            Role::Customer => self
                .profiles
                .get_or_create_user_profile(principal.id)
                .map(Profile::Customer),
            Role::Vendor => self.vendor_profile(principal).map(Profile::Vendor),
        }
    }

    pub fn vendor_profile(&self, principal: &Principal) -> Result<VendorProfile, DomainError> {
        principal.require_role(Role::Vendor)?;
        self.profiles
            .get_or_create_vendor_profile(principal.id, DEFAULT_BUSINESS_NAME)
    }

    /// The business record owned by a vendor principal.
    pub fn own_vendor(&self, principal: &Principal) -> Result<Vendor, DomainError> {
        principal.require_role(Role::Vendor)?;
        match self.profiles.find_vendor_by_owner(principal.id)? {
            Some(vendor) => Ok(vendor),
            None => Ok(self.vendor_profile(principal)?.vendor),
        }
    }

    pub fn vendor(&self, vendor_id: Uuid) -> Result<Vendor, DomainError> {
        self.profiles
            .find_vendor(vendor_id)?
            .ok_or(DomainError::NotFound("Vendor"))
    }

    pub fn update_customer_profile(
        &self,
        principal: &Principal,
        update: UserProfileUpdate,
    ) -> Result<UserProfile, DomainError> {
        principal.require_role(Role::Customer)?;
        self.profiles.get_or_create_user_profile(principal.id)?;
        let update = UserProfileUpdate {
            full_name: non_blank(update.full_name),
            phone: non_blank(update.phone),
            avatar_url: non_blank(update.avatar_url),
            address: non_blank(update.address),
        };
        self.profiles.update_user_profile(principal.id, update)
    }

    pub fn update_vendor(
        &self,
        principal: &Principal,
        update: VendorUpdate,
    ) -> Result<Vendor, DomainError> {
        let vendor = self.own_vendor(principal)?;
        if let Some(name) = &update.business_name {
            if name.trim().is_empty() {
                return Err(DomainError::InvalidInput(
                    "business_name must not be empty".into(),
                ));
            }
        }
        let update = VendorUpdate {
            business_name: non_blank(update.business_name),
            description: non_blank(update.description),
            address: non_blank(update.address),
            logo_url: non_blank(update.logo_url),
            is_open: update.is_open,
        };
        let updated = self.profiles.update_vendor(vendor.id, update)?;
        log::info!("Vendor {} updated its business record", updated.id);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryStore;

    fn service() -> ProfileService {
        ProfileService::new(Arc::new(InMemoryStore::new()))
    }

    #[test]
    fn customer_profile_is_created_once() {
        let svc = service();
        let principal = Principal::customer(Uuid::new_v4());

        let Profile::Customer(first) = svc.my_profile(&principal).unwrap() else {
            panic!("expected a customer profile");
        };
        let Profile::Customer(second) = svc.my_profile(&principal).unwrap() else {
            panic!("expected a customer profile");
        };
        assert_eq!(first, second);
    }

    #[test]
    fn vendor_profile_pairs_owner_and_business() {
        let svc = service();
        let principal = Principal::vendor(Uuid::new_v4());

        let Profile::Vendor(first) = svc.my_profile(&principal).unwrap() else {
            panic!("expected a vendor profile");
        };
        assert_eq!(first.owner.id, principal.id);
        assert_eq!(first.vendor.owner_id, principal.id);
        assert_eq!(first.vendor.business_name, DEFAULT_BUSINESS_NAME);

        let again = svc.own_vendor(&principal).unwrap();
        assert_eq!(again.id, first.vendor.id);
    }

    #[test]
    fn customers_cannot_edit_vendor_records() {
        let svc = service();
        let err = svc
            .update_vendor(&Principal::customer(Uuid::new_v4()), VendorUpdate::default())
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn blank_business_name_is_rejected() {
        let svc = service();
        let principal = Principal::vendor(Uuid::new_v4());
        let err = svc
            .update_vendor(
                &principal,
                VendorUpdate {
                    business_name: Some("   ".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn customer_update_ignores_blank_fields() {
        let svc = service();
        let principal = Principal::customer(Uuid::new_v4());
        svc.update_customer_profile(
            &principal,
            UserProfileUpdate {
                full_name: Some("Wanjiru".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let updated = svc
            .update_customer_profile(
                &principal,
                UserProfileUpdate {
                    full_name: Some("  ".into()),
                    address: Some("Kilimani".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.full_name.as_deref(), Some("Wanjiru"));
        assert_eq!(updated.address.as_deref(), Some("Kilimani"));
    }

    #[test]
    fn unknown_vendor_is_not_found() {
        assert!(matches!(
            service().vendor(Uuid::new_v4()),
            Err(DomainError::NotFound("Vendor"))
        ));
    }
}
