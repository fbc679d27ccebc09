use crate::{config::Config, error::ApiError, model::role::Role, models::Claims};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use crate::auth::jwt::verify_token;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub member_id: u64,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            user_id: claims.user_id,
            member_id: claims.member_id,
            email: claims.sub,
            role: claims.role,
        }
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already resolved by auth_middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ApiError::Unauthorized("Missing token".into()))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ApiError::Internal("Config missing".into()))),
        };

        match verify_token(token, &config.jwt_secret) {
            Ok(claims) => ready(Ok(claims.into())),
            Err(_) => ready(Err(ApiError::Unauthorized("Invalid token".into()))),
        }
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin only"))
        }
    }

    pub fn require_super(&self) -> Result<(), ApiError> {
        if self.role == Role::Super {
            Ok(())
        } else {
            Err(ApiError::forbidden("Executive only"))
        }
    }

    /// Read access to intern records and attendance reports
    pub fn require_admin_or_super(&self) -> Result<(), ApiError> {
        if matches!(self.role, Role::Admin | Role::Super) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin/Executive only"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_access_token;
    use actix_web::test::TestRequest;

    fn config() -> Config {
        Config::from_lookup(|key| match key {
            "SERVER_ADDR" => Some("127.0.0.1:0".into()),
            "DATABASE_URL" => Some("mysql://localhost/test".into()),
            "JWT_SECRET" => Some("test-secret".into()),
            _ => None,
        })
        .unwrap()
    }

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            member_id: 1,
            email: "a@example.com".into(),
            role,
        }
    }

    #[actix_web::test]
    async fn extracts_user_from_bearer_token() {
        let config = config();
        let (token, _) =
            generate_access_token(4, 2, "ana@example.com".into(), Role::Super, &config.jwt_secret, 60).unwrap();

        let req = TestRequest::default()
            .app_data(Data::new(config))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_http_request();

        let user = AuthUser::extract(&req).await.unwrap();
        assert_eq!(user.member_id, 2);
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.role, Role::Super);
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let req = TestRequest::default()
            .app_data(Data::new(config()))
            .to_http_request();

        assert!(matches!(
            AuthUser::extract(&req).await,
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[actix_web::test]
    async fn garbage_token_is_unauthorized() {
        let req = TestRequest::default()
            .app_data(Data::new(config()))
            .insert_header(("Authorization", "Bearer not.a.jwt"))
            .to_http_request();

        assert!(matches!(
            AuthUser::extract(&req).await,
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[actix_web::test]
    async fn prefers_user_resolved_by_middleware() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(user(Role::Admin));

        let extracted = AuthUser::extract(&req).await.unwrap();
        assert_eq!(extracted.role, Role::Admin);
    }

    #[test]
    fn role_guards() {
        assert!(user(Role::Admin).require_admin().is_ok());
        assert!(user(Role::Super).require_admin().is_err());
        assert!(user(Role::Member).require_admin().is_err());

        assert!(user(Role::Super).require_super().is_ok());
        assert!(user(Role::Admin).require_super().is_err());

        assert!(user(Role::Admin).require_admin_or_super().is_ok());
        assert!(user(Role::Super).require_admin_or_super().is_ok());
        assert!(user(Role::Member).require_admin_or_super().is_err());
    }
}
