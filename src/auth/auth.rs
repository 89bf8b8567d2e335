use crate::config::Config;
use crate::{
    auth::jwt::verify_token,
    model::role::Role,
    models::{Claims, TokenType},
};
use actix_web::{
    FromRequest, HttpMessage, HttpRequest,
    dev::Payload,
    error::{ErrorForbidden, ErrorInternalServerError, ErrorUnauthorized},
    web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl AuthUser {
    /// Accepts access tokens only; refresh tokens never authorize API calls.
    pub fn from_claims(claims: Claims) -> Result<Self, &'static str> {
        if claims.token_type != TokenType::Access {
            return Err("Access token required");
        }

        let role = Role::from_id(claims.role).ok_or("Invalid role")?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_id: claims.employee_id,
        })
    }

    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ErrorForbidden("Admin only"))
        }
    }

    pub fn require_payroll_manager(&self) -> actix_web::Result<()> {
        if self.role.manages_payroll() {
            Ok(())
        } else {
            Err(ErrorForbidden("HR/Admin only"))
        }
    }

    /// Payroll managers see every record, employees only their own.
    pub fn can_view_payroll_of(&self, employee_id: u64) -> bool {
        self.role.manages_payroll() || self.employee_id == Some(employee_id)
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Set by `auth_middleware` on protected scopes.
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
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ErrorInternalServerError("Config missing"))),
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        ready(AuthUser::from_claims(claims).map_err(ErrorUnauthorized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: u8, token_type: TokenType) -> Claims {
        Claims {
            user_id: 5,
            sub: "lan".into(),
            role,
            exp: 0,
            jti: "jti".into(),
            token_type,
            employee_id: Some(1001),
        }
    }

    #[test]
    fn refresh_tokens_do_not_authorize() {
        assert!(AuthUser::from_claims(claims(1, TokenType::Refresh)).is_err());
        assert!(AuthUser::from_claims(claims(1, TokenType::Access)).is_ok());
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert_eq!(
            AuthUser::from_claims(claims(42, TokenType::Access)).unwrap_err(),
            "Invalid role"
        );
    }

    #[test]
    fn employees_only_see_their_own_payroll() {
        let employee = AuthUser::from_claims(claims(3, TokenType::Access)).unwrap();
        assert!(employee.can_view_payroll_of(1001));
        assert!(!employee.can_view_payroll_of(1002));
        assert!(employee.require_payroll_manager().is_err());

        let hr = AuthUser::from_claims(claims(2, TokenType::Access)).unwrap();
        assert!(hr.can_view_payroll_of(1002));
        assert!(hr.require_payroll_manager().is_ok());
        assert!(hr.require_admin().is_err());
    }
}
