use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::offering::{OfferingInput, ServiceOffering};
use crate::domain::ports::OfferingRepository;
use crate::schema::services;

use super::models::{NewServiceRow, ServiceChangeset, ServiceRow};

pub struct DieselOfferingRepository {
    pool: DbPool,
}

impl DieselOfferingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OfferingRepository for DieselOfferingRepository {
    fn create(&self, vendor_id: Uuid, input: OfferingInput) -> Result<ServiceOffering, DomainError> {
        let mut conn = self.pool.get()?;

        let row: ServiceRow = diesel::insert_into(services::table)
            .values(&NewServiceRow {
                id: Uuid::new_v4(),
                vendor_id,
                name: input.name,
                description: input.description,
                price: input.price,
                estimated_time: input.estimated_time,
                unit: input.unit,
                discount: input.discount,
                tags: input.tags,
                payment_methods: input.payment_methods,
                max_quantity: input.max_quantity,
            })
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn update(&self, id: Uuid, input: OfferingInput) -> Result<ServiceOffering, DomainError> {
        let mut conn = self.pool.get()?;

        let row: Option<ServiceRow> = diesel::update(services::table.find(id))
            .set(&ServiceChangeset {
                name: input.name,
                description: input.description,
                price: input.price,
                estimated_time: input.estimated_time,
                unit: input.unit,
                discount: input.discount,
                tags: input.tags,
                payment_methods: input.payment_methods,
                max_quantity: input.max_quantity,
                updated_at: Utc::now(),
            })
            .get_result(&mut conn)
            .optional()?;
        row.map(ServiceOffering::from)
            .ok_or(DomainError::NotFound("Service"))
    }

    fn deactivate(&self, id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        let updated = diesel::update(services::table.find(id))
            .set((
                services::is_active.eq(false),
                services::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(DomainError::NotFound("Service"));
        }
        Ok(())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<ServiceOffering>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = services::table
            .find(id)
            .select(ServiceRow::as_select())
            .first::<ServiceRow>(&mut conn)
            .optional()?;
        Ok(row.map(ServiceOffering::from))
    }

    fn list_active_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<ServiceOffering>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = services::table
            .filter(services::vendor_id.eq(vendor_id))
            .filter(services::is_active.eq(true))
            .select(ServiceRow::as_select())
            .order(services::name.asc())
            .load::<ServiceRow>(&mut conn)?;
        Ok(rows.into_iter().map(ServiceOffering::from).collect())
    }
}
