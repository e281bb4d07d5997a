use actix_web::{web, HttpResponse, Responder, ResponseError};
use std::sync::Arc;

use crate::core::Recommender;
use crate::models::{ErrorResponse, HealthResponse, RecommendQuery};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
}

/// Configure recommendation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/recommend", web::get().to(recommend))
        .route("/catalog/recipes", web::get().to(list_recipes));
}

/// Health check endpoint
///
/// Reports `degraded` until the store directory has loaded at least once.
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let snapshot = state.recommender.locator().directory().snapshot();
    let status = if snapshot.refreshed_at().is_some() { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        recipes: state.recommender.catalog().recipes().len(),
        stores: snapshot.stores().len(),
        stores_refreshed_at: snapshot.refreshed_at(),
    })
}

/// Recommend endpoint
///
/// GET /recommend?ingredients=tomato,rice&location=Tempe,AZ
///
/// `location` is either `lat,lon` or a free-text address.
async fn recommend(
    state: web::Data<AppState>,
    query: web::Query<RecommendQuery>,
) -> impl Responder {
    let request = match query.into_inner().into_request() {
        Ok(request) => request,
        Err(errors) => {
            tracing::info!("Validation failed for recommend request: {}", errors);
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Validation failed".to_string(),
                message: errors.to_string(),
                status_code: 400,
                unresolved: Vec::new(),
            });
        }
    };

    match state.recommender.recommend(&request).await {
        Ok(response) => {
            tracing::info!(
                request_id = %response.request_id,
                "Returning {} recipes and {} stores",
                response.recipes.len(),
                response.stores.as_ref().map_or(0, Vec::len)
            );
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            tracing::info!("Rejected recommend request: {}", e);
            e.error_response()
        }
    }
}

/// Loaded recipe catalog
async fn list_recipes(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.recommender.catalog().recipes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AggregationLimits, LocatorSettings, Matcher, NormalizationMode, StoreLocator};
    use crate::models::{Coordinates, RecommendationResponse, Store};
    use crate::services::{DirectoryError, FileCatalog, GeocodeError, Geocoder, StoreDirectory, StoreSource};
    use actix_web::{http::StatusCode, test, App};
    use async_trait::async_trait;
    use std::time::Duration;

    struct FixedSource;

    #[async_trait]
    impl StoreSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch_stores(&self) -> Result<Vec<Store>, DirectoryError> {
            Ok(vec![Store {
                id: "frys-1".to_string(),
                name: "Fry's Food & Drug".to_string(),
                address: "123 Main St".to_string(),
                latitude: Some(33.4260),
                longitude: Some(-111.9400),
                stock: None,
            }])
        }
    }

    struct NowhereGeocoder;

    #[async_trait]
    impl Geocoder for NowhereGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Option<Coordinates>, GeocodeError> {
            Ok(None)
        }
    }

    async fn state(mode: NormalizationMode) -> AppState {
        let catalog = FileCatalog::parse(
            r#"
            [[ingredients]]
            id = "tomato"
            synonyms = ["tomatoes"]

            [[recipes]]
            name = "Tomato Rice"
            ingredients = [{ ingredient = "tomato" }, { ingredient = "rice" }, { ingredient = "onion" }]
            "#,
        )
        .unwrap();

        let directory = Arc::new(StoreDirectory::new(Arc::new(FixedSource), Duration::from_millis(1)));
        directory.refresh().await.unwrap();
        let locator = StoreLocator::new(directory, Arc::new(NowhereGeocoder), LocatorSettings::default());

        AppState {
            recommender: Arc::new(Recommender::new(
                Arc::new(catalog),
                mode,
                Matcher::default(),
                locator,
                AggregationLimits::default(),
            )),
        }
    }

    #[actix_web::test]
    async fn test_recommend_ok() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(NormalizationMode::Lenient).await))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/recommend?ingredients=tomatoes,%20rice&location=33.4255,-111.94")
            .to_request();
        let body: RecommendationResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.recipes.len(), 1);
        assert_eq!(body.recipes[0].name, "Tomato Rice");
        assert_eq!(body.stores.as_ref().unwrap()[0].name, "Fry's Food & Drug");
        assert!(body.error.is_none());
    }

    #[actix_web::test]
    async fn test_versioned_prefix() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(NormalizationMode::Lenient).await))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["recipes"], 1);
        assert_eq!(body["stores"], 1);

        let req = test::TestRequest::get().uri("/api/v1/catalog/recipes").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["name"], "Tomato Rice");
    }

    #[actix_web::test]
    async fn test_missing_parameters_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(NormalizationMode::Lenient).await))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/recommend?location=Tempe").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_strict_mode_unresolved_is_422() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(NormalizationMode::Strict).await))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/recommend?ingredients=tomato,unobtainium&location=33.4255,-111.94")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "UnresolvedIngredientError");
        assert_eq!(body.unresolved, vec!["unobtainium".to_string()]);
    }

    #[actix_web::test]
    async fn test_unknown_location_keeps_recipes() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(NormalizationMode::Lenient).await))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/recommend?ingredients=tomato&location=Atlantis")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["recipes"][0]["name"], "Tomato Rice");
        assert!(body.get("stores").is_none());
        assert_eq!(body["error"], "LocationResolutionError");
    }
}
