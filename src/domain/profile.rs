use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Customer-side profile. Its id is the principal id.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct UserProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub address: Option<String>,
}

/// The principal that owns a vendor business.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorOwner {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vendor {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub business_name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct VendorUpdate {
    pub business_name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub is_open: Option<bool>,
}

/// An owner together with its business record; always created as a pair.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorProfile {
    pub owner: VendorOwner,
    pub vendor: Vendor,
}

pub const DEFAULT_BUSINESS_NAME: &str = "My Gas Shop";
