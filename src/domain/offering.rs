use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

/// A vendor's offering, e.g. a 12.5 kg cylinder refill.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceOffering {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub estimated_time: Option<String>,
    pub unit: String,
    pub discount: BigDecimal,
    pub tags: Vec<String>,
    pub payment_methods: Vec<String>,
    pub max_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable fields of an offering, shared by create and update.
#[derive(Debug, Clone)]
pub struct OfferingInput {
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub estimated_time: Option<String>,
    pub unit: String,
    pub discount: BigDecimal,
    pub tags: Vec<String>,
    pub payment_methods: Vec<String>,
    pub max_quantity: i32,
}

impl OfferingInput {
    pub fn validate(mut self) -> Result<Self, DomainError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(DomainError::InvalidInput("name must not be empty".into()));
        }
        if self.price < BigDecimal::zero() {
            return Err(DomainError::InvalidInput("price must not be negative".into()));
        }
        if self.discount < BigDecimal::zero() || self.discount > BigDecimal::from(100) {
            return Err(DomainError::InvalidInput(
                "discount must be a percentage between 0 and 100".into(),
            ));
        }
        if self.max_quantity < 1 {
            return Err(DomainError::InvalidInput(
                "max_quantity must be at least 1".into(),
            ));
        }
        self.unit = self.unit.trim().to_string();
        if self.unit.is_empty() {
            self.unit = "unit".to_string();
        }
        self.tags.retain(|t| !t.trim().is_empty());
        self.payment_methods.retain(|m| !m.trim().is_empty());
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn input() -> OfferingInput {
        OfferingInput {
            name: " Cylinder refill ".into(),
            description: None,
            price: BigDecimal::from_str("30.00").unwrap(),
            estimated_time: Some("45 min".into()),
            unit: "".into(),
            discount: BigDecimal::zero(),
            tags: vec!["lpg".into(), " ".into()],
            payment_methods: vec!["cash".into()],
            max_quantity: 4,
        }
    }

    #[test]
    fn validate_normalizes_fields() {
        let valid = input().validate().unwrap();
        assert_eq!(valid.name, "Cylinder refill");
        assert_eq!(valid.unit, "unit");
        assert_eq!(valid.tags, vec!["lpg".to_string()]);
    }

    #[test]
    fn validate_rejects_out_of_range_discount() {
        let mut bad = input();
        bad.discount = BigDecimal::from(150);
        assert!(matches!(bad.validate(), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn validate_rejects_zero_max_quantity() {
        let mut bad = input();
        bad.max_quantity = 0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_price() {
        let mut bad = input();
        bad.price = BigDecimal::from(-1);
        assert!(bad.validate().is_err());
    }
}
