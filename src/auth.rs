/// Caller identity, forwarded by the authenticating gateway as headers.
/// Credential storage and token verification live outside this service.
// region:    --- Imports
use crate::error::{Error, Result};
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

// endregion: --- Imports

// region:    --- Auth User

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Bidder,
}

#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(Error::Forbidden("Admin role required".to_string()))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or(Error::Unauthenticated)?;

        let role = match parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            Some("admin") => Role::Admin,
            _ => Role::Bidder,
        };

        Ok(AuthUser { id, role })
    }
}

// endregion: --- Auth User

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_for(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_missing_user_header_is_unauthenticated() {
        let mut parts = parts_for(&[]);
        let res = AuthUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(res, Err(Error::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_malformed_user_id_is_unauthenticated() {
        let mut parts = parts_for(&[(USER_ID_HEADER, "not-a-number")]);
        let res = AuthUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(res, Err(Error::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_role_defaults_to_bidder() {
        let mut parts = parts_for(&[(USER_ID_HEADER, "7")]);
        let user = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.role, Role::Bidder);
        assert!(user.require_admin().is_err());
    }

    #[tokio::test]
    async fn test_admin_role_header() {
        let mut parts = parts_for(&[(USER_ID_HEADER, "1"), (USER_ROLE_HEADER, "admin")]);
        let user = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.role, Role::Admin);
        assert!(user.require_admin().is_ok());
    }
}

// endregion: --- Tests
