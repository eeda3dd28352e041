use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use uuid::Uuid;

use crate::domain::session::{Principal, Role};
use crate::errors::AppError;

pub const X_USER_ID: &str = "X-User-ID";
pub const X_USER_ROLE: &str = "X-User-Role";

/// The caller's identity, taken from the headers set by the authenticating
/// gateway in front of this service.
#[derive(Debug, Clone, Copy)]
pub struct CurrentPrincipal(pub Principal);

fn header<'a>(req: &'a HttpRequest, name: &str) -> Result<&'a str, AppError> {
    req.headers()
        .get(name)
        .ok_or_else(|| AppError::Unauthorized(format!("`{name}` header is missing")))?
        .to_str()
        .map_err(|_| AppError::Unauthorized(format!("`{name}` header is not valid text")))
}

fn principal_from(req: &HttpRequest) -> Result<Principal, AppError> {
    let id = Uuid::parse_str(header(req, X_USER_ID)?.trim())
        .map_err(|_| AppError::Unauthorized(format!("`{X_USER_ID}` is not a UUID")))?;
    let role = header(req, X_USER_ROLE)?
        .parse::<Role>()
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;
    Ok(Principal { id, role })
}

impl FromRequest for CurrentPrincipal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(principal_from(req).map(CurrentPrincipal).map_err(|e| {
            log::warn!("Rejected request to {}: {}", req.path(), e);
            e
        }))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn reads_id_and_role() {
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header((X_USER_ID, id.to_string()))
            .insert_header((X_USER_ROLE, "Vendor"))
            .to_http_request();
        assert_eq!(principal_from(&req).unwrap(), Principal::vendor(id));
    }

    #[test]
    fn missing_role_is_unauthorized() {
        let req = TestRequest::default()
            .insert_header((X_USER_ID, Uuid::new_v4().to_string()))
            .to_http_request();
        assert!(matches!(principal_from(&req), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn malformed_id_is_unauthorized() {
        let req = TestRequest::default()
            .insert_header((X_USER_ID, "not-a-uuid"))
            .insert_header((X_USER_ROLE, "customer"))
            .to_http_request();
        assert!(matches!(principal_from(&req), Err(AppError::Unauthorized(_))));
    }
}
