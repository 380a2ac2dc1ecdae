//! Routes for registration, login, and profile management.

use crate::{
    access,
    error::{self, JsonError, JsonResult},
    state::RocketState,
};
use app::{auth, user};
use rocket::{get, post, put, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct RegisterRequest {
    /// Login email, unique per account.
    email: String,
    first_name: String,
    last_name: String,
    /// At least 8 characters.
    password: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct RegisterResponse {
    /// The registered email; log in with it to obtain a session token.
    email: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct LoginResponse {
    /// Bearer session token. Send it in the `Authorization` header.
    token: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct UpdateProfileRequest {
    first_name: String,
    last_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct ProfileImageRequest {
    /// URL of the uploaded image; jpeg and png only.
    profile_image: String,
}

#[derive(Debug, Serialize, JsonSchema)]
struct ProfileModel {
    email: String,
    first_name: String,
    last_name: String,
    /// Profile image URL, if one has been set.
    profile_image: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct ProfileResponse {
    profile: ProfileModel,
}

impl ProfileModel {
    fn from_entity(user: &user::User) -> Self {
        Self {
            email: user.email.0.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            profile_image: user.profile_image.clone(),
        }
    }
}

/// Error during a membership operation.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// Unexpected error, please contact support.
    Unknown,
    /// A required field is missing or empty.
    MissingField,
    /// The email is not a valid address.
    InvalidEmail,
    /// The password is shorter than 8 characters.
    PasswordTooShort,
    /// The email is already registered.
    EmailTaken,
    /// Wrong email or password.
    InvalidCredentials,
    /// The authenticated user no longer exists.
    UserNotFound,
    /// The profile image URL is not a jpeg or png.
    UnsupportedFormat,
}

fn validation_error(e: user::ValidationError) -> JsonError<Error> {
    match e {
        user::ValidationError::MissingField => {
            error::bad_request(Error::MissingField, "all fields are required".to_owned())
        }
        user::ValidationError::InvalidEmail => {
            error::bad_request(Error::InvalidEmail, "email is not a valid address".to_owned())
        }
        user::ValidationError::PasswordTooShort => error::bad_request(
            Error::PasswordTooShort,
            "password must be at least 8 characters".to_owned(),
        ),
        user::ValidationError::UnsupportedImageFormat => error::bad_request(
            Error::UnsupportedFormat,
            "profile image must be a jpeg or png url".to_owned(),
        ),
    }
}

/// Register a new wallet account. The account starts with a zero balance.
#[openapi(tag = "Membership")]
#[post("/register", data = "<req>")]
pub(super) async fn register(
    state: &State<RocketState>,
    req: Json<RegisterRequest>,
) -> JsonResult<RegisterResponse, Error> {
    let new_user = user::NewUser::create(&req.email, &req.first_name, &req.last_name, &req.password)
        .map_err(validation_error)?;
    let email = new_user.email().to_owned();
    user::register(&state.db, new_user)
        .await
        .map(|()| Json(RegisterResponse { email }))
        .map_err(|e| match e {
            user::Error::EmailTaken => {
                error::bad_request(Error::EmailTaken, "email is already registered".to_owned())
            }
            e => error::storage_failure(Error::Unknown, "register", None, &e),
        })
}

/// Log in with email and password. Returns a bearer session token.
#[openapi(tag = "Membership")]
#[post("/login", data = "<req>")]
pub(super) async fn login(
    state: &State<RocketState>,
    req: Json<LoginRequest>,
) -> JsonResult<LoginResponse, Error> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(error::bad_request(
            Error::MissingField,
            "all fields are required".to_owned(),
        ));
    }
    auth::login(&state.db, &state.sessions, &req.email, &req.password)
        .await
        .map(|token| {
            Json(LoginResponse {
                token: token.into_string(),
            })
        })
        .map_err(|e| match e {
            auth::Error::InvalidCredentials | auth::Error::AccessDenied(_) => error::unauthorized(
                Error::InvalidCredentials,
                "wrong email or password".to_owned(),
            ),
            e => error::storage_failure(Error::Unknown, "login", None, &e),
        })
}

/// Get the authenticated user's profile.
#[openapi(tag = "Membership")]
#[get("/profile")]
pub(super) async fn profile(
    guard: access::AuthGuard,
    state: &State<RocketState>,
) -> JsonResult<ProfileResponse, Error> {
    match user::get(guard.grant(), &state.db).await {
        Ok(Some(user)) => Ok(Json(ProfileResponse {
            profile: ProfileModel::from_entity(&user),
        })),
        Ok(None) => Err(error::not_found(Error::UserNotFound, "user not found".to_owned())),
        Err(e) => Err(error::storage_failure(
            Error::Unknown,
            "get profile",
            Some(guard.grant().user_id),
            &e,
        )),
    }
}

/// Update the authenticated user's first and last name.
#[openapi(tag = "Membership")]
#[put("/profile/update", data = "<req>")]
pub(super) async fn update_profile(
    guard: access::AuthGuard,
    state: &State<RocketState>,
    req: Json<UpdateProfileRequest>,
) -> JsonResult<ProfileResponse, Error> {
    let update = user::ProfileUpdate::create(&req.first_name, &req.last_name)
        .map_err(validation_error)?;
    user::update_profile(guard.grant(), &state.db, &update)
        .await
        .map(|user| {
            Json(ProfileResponse {
                profile: ProfileModel::from_entity(&user),
            })
        })
        .map_err(|e| match e {
            user::Error::NotFound => {
                error::not_found(Error::UserNotFound, "user not found".to_owned())
            }
            e => error::storage_failure(
                Error::Unknown,
                "update profile",
                Some(guard.grant().user_id),
                &e,
            ),
        })
}

/// Set the authenticated user's profile image URL.
#[openapi(tag = "Membership")]
#[put("/profile/image", data = "<req>")]
pub(super) async fn profile_image(
    guard: access::AuthGuard,
    state: &State<RocketState>,
    req: Json<ProfileImageRequest>,
) -> JsonResult<ProfileResponse, Error> {
    let image = user::ImageUrl::parse(&req.profile_image).map_err(validation_error)?;
    user::set_profile_image(guard.grant(), &state.db, &image)
        .await
        .map(|user| {
            Json(ProfileResponse {
                profile: ProfileModel::from_entity(&user),
            })
        })
        .map_err(|e| match e {
            user::Error::NotFound => {
                error::not_found(Error::UserNotFound, "user not found".to_owned())
            }
            e => error::storage_failure(
                Error::Unknown,
                "set profile image",
                Some(guard.grant().user_id),
                &e,
            ),
        })
}
