//! Add top-level routes as submodules here.

use crate::state::RocketState;
use app::QueryRange;
use rocket::{Build, FromForm, Rocket};
use rocket_okapi::{
    openapi_get_routes,
    swagger_ui::{make_swagger_ui, DefaultModelRendering, SwaggerUIConfig},
};
use schemars::JsonSchema;

mod information;
mod membership;
mod transaction;

const DEFAULT_LIMIT: i64 = 3;
const MAX_LIMIT: i64 = 100;

/// History pagination parameters. Unlike most validation in this API these
/// never reject: bad values fall back to the documented defaults, and the
/// limit is capped at [`MAX_LIMIT`] to bound response size.
#[derive(FromForm, JsonSchema)]
struct Range {
    limit: Option<String>,
    offset: Option<String>,
}

impl Range {
    fn query_range(&self) -> QueryRange {
        QueryRange {
            limit: Self::clamp_limit(self.limit.as_deref()),
            offset: Self::clamp_offset(self.offset.as_deref()),
        }
    }

    fn clamp_limit(s: Option<&str>) -> i64 {
        match s.and_then(|s| s.parse::<i64>().ok()) {
            Some(limit) if limit > 0 => limit.min(MAX_LIMIT),
            _ => DEFAULT_LIMIT,
        }
    }

    fn clamp_offset(s: Option<&str>) -> i64 {
        s.and_then(|s| s.parse::<i64>().ok())
            .filter(|offset| *offset >= 0)
            .unwrap_or(0)
    }
}

const VERSION: &str = "/v1";

pub fn register(rocket: Rocket<Build>, state: RocketState) -> Rocket<Build> {
    let rocket = rocket.manage(state);
    let rocket = rocket.mount(
        VERSION,
        openapi_get_routes![
            membership::register,
            membership::login,
            membership::profile,
            membership::update_profile,
            membership::profile_image,
            information::banners,
            information::services,
            transaction::balance,
            transaction::top_up,
            transaction::pay,
            transaction::history,
        ],
    );
    mount_swagger(rocket)
}

pub fn mount_swagger(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount(
        format!("{}/swagger", VERSION),
        make_swagger_ui(&SwaggerUIConfig {
            url: "../openapi.json".to_owned(),
            default_model_rendering: DefaultModelRendering::Model,
            show_extensions: true,
            ..Default::default()
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::Range;

    fn range(limit: Option<&str>, offset: Option<&str>) -> Range {
        Range {
            limit: limit.map(str::to_owned),
            offset: offset.map(str::to_owned),
        }
    }

    #[test]
    fn missing_parameters_use_the_defaults() {
        let range = range(None, None).query_range();
        assert_eq!(range.limit, 3);
        assert_eq!(range.offset, 0);
    }

    #[test]
    fn non_numeric_parameters_use_the_defaults() {
        let range = range(Some("abc"), Some("-")).query_range();
        assert_eq!(range.limit, 3);
        assert_eq!(range.offset, 0);
    }

    #[test]
    fn non_positive_limit_and_negative_offset_are_clamped() {
        let range = range(Some("0"), Some("-5")).query_range();
        assert_eq!(range.limit, 3);
        assert_eq!(range.offset, 0);
    }

    #[test]
    fn valid_parameters_pass_through() {
        let range = range(Some("10"), Some("20")).query_range();
        assert_eq!(range.limit, 10);
        assert_eq!(range.offset, 20);
    }

    #[test]
    fn limit_is_capped() {
        let range = range(Some("100000"), None).query_range();
        assert_eq!(range.limit, 100);
    }
}
