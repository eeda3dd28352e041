use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub customer_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub customer_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
}

pub fn validate_rating(rating: i16) -> Result<i16, DomainError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(DomainError::InvalidInput(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )))
    }
}

/// Mean rating rounded to one decimal place, `None` when there are no ratings.
pub fn average_from_totals(rating_sum: i64, rating_count: i64) -> Option<f64> {
    if rating_count <= 0 {
        return None;
    }
    let mean = rating_sum as f64 / rating_count as f64;
    Some((mean * 10.0).round() / 10.0)
}

pub fn average_rating<I>(ratings: I) -> Option<f64>
where
    I: IntoIterator<Item = i16>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0i64, 0i64), |(s, c), r| (s + i64::from(r), c + 1));
    average_from_totals(sum, count)
}

/// Display form used by clients: one decimal, or "N/A" when unrated.
pub fn format_average(average: Option<f64>) -> String {
    match average {
        Some(avg) => format!("{avg:.1}"),
        None => "N/A".to_string(),
    }
}
