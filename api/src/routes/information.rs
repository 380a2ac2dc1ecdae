//! Routes for banners and the service catalog.

use crate::{
    access,
    error::{self, JsonResult},
    state::RocketState,
};
use app::catalog;
use rocket::{get, serde::json::Json, State};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Serialize, JsonSchema)]
struct BannerModel {
    banner_name: String,
    banner_image: String,
    description: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct BannersResponse {
    banners: Vec<BannerModel>,
}

#[derive(Debug, Serialize, JsonSchema)]
struct ServiceModel {
    /// Catalog key, used to create a transaction.
    service_code: String,
    service_name: String,
    service_icon: String,
    /// Fixed price in Rupiah.
    service_tariff: i64,
}

#[derive(Debug, Serialize, JsonSchema)]
pub(super) struct ServicesResponse {
    services: Vec<ServiceModel>,
}

/// Error during an information lookup.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum Error {
    /// Unexpected error, please contact support.
    Unknown,
}

impl BannerModel {
    fn from_entity(banner: &catalog::Banner) -> Self {
        Self {
            banner_name: banner.name.clone(),
            banner_image: banner.image.clone(),
            description: banner.description.clone(),
        }
    }
}

impl ServiceModel {
    fn from_entity(service: &catalog::Service) -> Self {
        Self {
            service_code: service.code.0.clone(),
            service_name: service.name.clone(),
            service_icon: service.icon.clone(),
            service_tariff: service.tariff.0,
        }
    }
}

/// List promotional banners. Public.
#[openapi(tag = "Information")]
#[get("/banner")]
pub(super) async fn banners(state: &State<RocketState>) -> JsonResult<BannersResponse, Error> {
    catalog::banners(&state.db)
        .await
        .map(|banners| {
            Json(BannersResponse {
                banners: banners.iter().map(BannerModel::from_entity).collect(),
            })
        })
        .map_err(|e| error::storage_failure(Error::Unknown, "list banners", None, &e))
}

/// List all purchasable services and their tariffs.
#[openapi(tag = "Information")]
#[get("/services")]
pub(super) async fn services(
    guard: access::AuthGuard,
    state: &State<RocketState>,
) -> JsonResult<ServicesResponse, Error> {
    catalog::services(guard.grant(), &state.db)
        .await
        .map(|services| {
            Json(ServicesResponse {
                services: services.iter().map(ServiceModel::from_entity).collect(),
            })
        })
        .map_err(|e| {
            error::storage_failure(
                Error::Unknown,
                "list services",
                Some(guard.grant().user_id),
                &e,
            )
        })
}
