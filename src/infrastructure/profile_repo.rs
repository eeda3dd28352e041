use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::ProfileRepository;
use crate::domain::profile::{UserProfile, UserProfileUpdate, Vendor, VendorProfile, VendorUpdate};
use crate::schema::{user_profiles, vendor_owners, vendors};

use super::models::{
    NewUserProfileRow, NewVendorOwnerRow, NewVendorRow, UserProfileChangeset, UserProfileRow,
    VendorChangeset, VendorOwnerRow, VendorRow,
};

pub struct DieselProfileRepository {
    pool: DbPool,
}

impl DieselProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ProfileRepository for DieselProfileRepository {
    fn get_or_create_user_profile(&self, principal_id: Uuid) -> Result<UserProfile, DomainError> {
        let mut conn = self.pool.get()?;

        let inserted = diesel::insert_into(user_profiles::table)
            .values(&NewUserProfileRow { id: principal_id })
            .on_conflict(user_profiles::id)
            .do_nothing()
            .execute(&mut conn)?;
        if inserted > 0 {
            log::info!("Created user profile for {}", principal_id);
        }

        let row = user_profiles::table
            .find(principal_id)
            .select(UserProfileRow::as_select())
            .first::<UserProfileRow>(&mut conn)?;
        Ok(row.into())
    }

    fn update_user_profile(
        &self,
        principal_id: Uuid,
        update: UserProfileUpdate,
    ) -> Result<UserProfile, DomainError> {
        let mut conn = self.pool.get()?;

        let row: Option<UserProfileRow> = diesel::update(user_profiles::table.find(principal_id))
            .set(&UserProfileChangeset {
                full_name: update.full_name,
                phone: update.phone,
                avatar_url: update.avatar_url,
                address: update.address,
                updated_at: Utc::now(),
            })
            .get_result(&mut conn)
            .optional()?;
        row.map(UserProfile::from)
            .ok_or(DomainError::NotFound("Profile"))
    }

    fn get_or_create_vendor_profile(
        &self,
        principal_id: Uuid,
        default_business_name: &str,
    ) -> Result<VendorProfile, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::insert_into(vendor_owners::table)
                .values(&NewVendorOwnerRow { id: principal_id })
                .on_conflict(vendor_owners::id)
                .do_nothing()
                .execute(conn)?;

            let inserted = diesel::insert_into(vendors::table)
                .values(&NewVendorRow {
                    id: Uuid::new_v4(),
                    owner_id: principal_id,
                    business_name: default_business_name.to_string(),
                })
                .on_conflict(vendors::owner_id)
                .do_nothing()
                .execute(conn)?;
            if inserted > 0 {
                log::info!("Created vendor business for owner {}", principal_id);
            }

            let owner = vendor_owners::table
                .find(principal_id)
                .select(VendorOwnerRow::as_select())
                .first::<VendorOwnerRow>(conn)?;
            let vendor = vendors::table
                .filter(vendors::owner_id.eq(principal_id))
                .select(VendorRow::as_select())
                .first::<VendorRow>(conn)?;

            Ok(VendorProfile {
                owner: owner.into(),
                vendor: vendor.into(),
            })
        })
    }

    fn find_vendor(&self, vendor_id: Uuid) -> Result<Option<Vendor>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = vendors::table
            .find(vendor_id)
            .select(VendorRow::as_select())
            .first::<VendorRow>(&mut conn)
            .optional()?;
        Ok(row.map(Vendor::from))
    }

    fn find_vendor_by_owner(&self, owner_id: Uuid) -> Result<Option<Vendor>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = vendors::table
            .filter(vendors::owner_id.eq(owner_id))
            .select(VendorRow::as_select())
            .first::<VendorRow>(&mut conn)
            .optional()?;
        Ok(row.map(Vendor::from))
    }

    fn update_vendor(&self, vendor_id: Uuid, update: VendorUpdate) -> Result<Vendor, DomainError> {
        let mut conn = self.pool.get()?;

        let row: Option<VendorRow> = diesel::update(vendors::table.find(vendor_id))
            .set(&VendorChangeset {
                business_name: update.business_name,
                description: update.description,
                address: update.address,
                logo_url: update.logo_url,
                is_open: update.is_open,
                updated_at: Utc::now(),
            })
            .get_result(&mut conn)
            .optional()?;
        row.map(Vendor::from).ok_or(DomainError::NotFound("Vendor"))
    }
}

#[cfg(test)]
mod tests {
    use diesel::dsl::count_star;
    use diesel::prelude::*;
    use uuid::Uuid;

    use super::DieselProfileRepository;
    use crate::domain::ports::ProfileRepository;
    use crate::domain::profile::UserProfileUpdate;
    use crate::infrastructure::test_support::setup_db;
    use crate::schema::{user_profiles, vendors};

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn user_profile_fetch_or_create_is_idempotent() {
        let (_container, pool) = setup_db().await;
        let repo = DieselProfileRepository::new(pool.clone());
        let principal = Uuid::new_v4();

        let first = repo.get_or_create_user_profile(principal).expect("first");
        let second = repo.get_or_create_user_profile(principal).expect("second");
        assert_eq!(first.id, second.id);

        let mut conn = pool.get().expect("conn");
        let rows: i64 = user_profiles::table
            .filter(user_profiles::id.eq(principal))
            .select(count_star())
            .first(&mut conn)
            .expect("count");
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn vendor_profile_creates_owner_and_business_once() {
        let (_container, pool) = setup_db().await;
        let repo = DieselProfileRepository::new(pool.clone());
        let principal = Uuid::new_v4();

        let first = repo
            .get_or_create_vendor_profile(principal, "Blue Flame")
            .expect("first");
        let second = repo
            .get_or_create_vendor_profile(principal, "Other Name")
            .expect("second");

        assert_eq!(first.vendor.id, second.vendor.id);
        assert_eq!(second.vendor.business_name, "Blue Flame");
        assert_eq!(first.owner.id, principal);

        let mut conn = pool.get().expect("conn");
        let rows: i64 = vendors::table
            .filter(vendors::owner_id.eq(principal))
            .select(count_star())
            .first(&mut conn)
            .expect("count");
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime"]
    async fn update_keeps_unspecified_fields() {
        let (_container, pool) = setup_db().await;
        let repo = DieselProfileRepository::new(pool);
        let principal = Uuid::new_v4();
        repo.get_or_create_user_profile(principal).expect("create");

        repo.update_user_profile(
            principal,
            UserProfileUpdate {
                full_name: Some("Ada".into()),
                phone: Some("+254700000000".into()),
                ..Default::default()
            },
        )
        .expect("update name");
        let updated = repo
            .update_user_profile(
                principal,
                UserProfileUpdate {
                    address: Some("12 Ngong Rd".into()),
                    ..Default::default()
                },
            )
            .expect("update address");

        assert_eq!(updated.full_name.as_deref(), Some("Ada"));
        assert_eq!(updated.address.as_deref(), Some("12 Ngong Rd"));
    }
}
