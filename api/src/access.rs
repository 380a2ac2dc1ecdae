use app::auth;
use okapi::openapi3::{Object, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request,
};
use rocket_okapi::{
    gen::OpenApiGenerator,
    request::{OpenApiFromRequest, RequestHeaderInput},
};
use thiserror::Error;

use crate::state::RocketState;

/// Request guard proving that the caller presented a live session token.
pub struct AuthGuard(auth::Grant);

impl AuthGuard {
    pub fn grant(&self) -> &auth::Grant {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("access denied")]
    AccessDenied,
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("storage failure during authentication")]
    Storage,
}

const AUTH_HEADER: &str = "Authorization";
const BEARER_PREFIX: &str = "Bearer ";

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthGuard {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let token = req
            .headers()
            .get_one(AUTH_HEADER)
            .and_then(|header| header.strip_prefix(BEARER_PREFIX));
        let token = match token {
            Some(token) => token,
            None => return Outcome::Error((Status::Unauthorized, Error::AccessDenied)),
        };

        let state = req.rocket().state::<RocketState>().unwrap();
        match auth::get_grant(&state.db, token).await {
            Ok(grant) => {
                if state.rate_limit.limit(grant.user_id) {
                    log::info!("rate limiting user {:?}", grant.user_id);
                    Outcome::Error((Status::TooManyRequests, Error::RateLimited))
                } else {
                    Outcome::Success(AuthGuard(grant))
                }
            }
            Err(auth::Error::Storage(e)) => {
                log::error!("session lookup failed: {}", e);
                Outcome::Error((Status::InternalServerError, Error::Storage))
            }
            Err(_) => Outcome::Error((Status::Unauthorized, Error::AccessDenied)),
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for AuthGuard {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(openapi_auth())
    }
}

fn openapi_auth() -> RequestHeaderInput {
    let security_scheme = SecurityScheme {
        description: Some("Requires a bearer session token obtained from /login.".to_owned()),
        data: SecuritySchemeData::Http {
            scheme: "bearer".to_owned(),
            bearer_format: Some("opaque".to_owned()),
        },
        extensions: Object::default(),
    };
    let mut security_req = SecurityRequirement::new();
    security_req.insert("bearerAuth".to_owned(), Vec::new());
    RequestHeaderInput::Security("bearerAuth".to_owned(), security_scheme, security_req)
}
