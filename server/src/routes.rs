use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use mop_data_management::TripStoreError;
use mop_lib::{kpi::TripSummary, region::Region, trip::NewTrip};

use crate::server_state::ServerState;

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/regions", get(get_regions))
        .route("/map", get(get_world_map))
        .route("/map/{region}", get(get_map))
        .route("/summary", get(get_summary))
        .route("/trip", post(post_trip))
        .with_state(state)
}

pub async fn get_regions() -> Json<Vec<String>> {
    Json(Region::ALL.iter().map(Region::to_string).collect())
}

pub async fn get_world_map(State(state): State<Arc<ServerState>>) -> Response {
    render_map(&state, Region::World).await
}

pub async fn get_map(State(state): State<Arc<ServerState>>, Path(region): Path<String>) -> Response {
    match region.parse::<Region>() {
        Ok(region) => render_map(&state, region).await,
        Err(err) => {
            tracing::warn!("{}", err);
            (StatusCode::BAD_REQUEST, err).into_response()
        }
    }
}

pub async fn get_summary(State(state): State<Arc<ServerState>>) -> Response {
    let trips = state.with_store(|store| store.load()).await;

    match trips {
        Ok(trips) => Json(TripSummary::from_trips(&trips)).into_response(),
        Err(err) => {
            tracing::error!("Failed to load trips for summary: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn post_trip(State(state): State<Arc<ServerState>>, Json(new_trip): Json<NewTrip>) -> Response {
    let result = state.with_store(move |store| store.append(new_trip)).await;

    match result {
        Ok(trip) => (StatusCode::CREATED, Json(trip)).into_response(),
        Err(TripStoreError::InvalidTrip(reason)) => {
            tracing::debug!("Rejected trip: {}", reason);
            (StatusCode::UNPROCESSABLE_ENTITY, reason).into_response()
        },
        Err(err) => {
            tracing::error!("Failed to add trip: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn render_map(state: &Arc<ServerState>, region: Region) -> Response {
    let trips = state.with_store(|store| store.load()).await;

    match trips {
        Ok(trips) => {
            tracing::debug!("Rendering {} trips for {}", trips.len(), region);
            Json(state.renderer.render_region(&trips, region)).into_response()
        },
        Err(err) => {
            tracing::error!("Failed to load trips for map: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
fn test_state(dir: &tempfile::TempDir) -> Arc<ServerState> {
    use mop_data_management::TripStore;
    use mop_lib::map_renderer::MapRenderer;

    Arc::new(ServerState::new(TripStore::new(dir.path().join("trips.csv")), MapRenderer::default()))
}

#[cfg(test)]
async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[cfg(test)]
fn paris() -> NewTrip {
    NewTrip {
        country: "France".into(),
        iso_alpha3: Some("FRA".into()),
        city: "Paris".into(),
        latitude: 48.85,
        longitude: 2.35,
        date: Some("2024-01-01".into()),
        continent: None,
    }
}

#[tokio::test]
async fn empty_store_serves_bare_map() {
    let dir = tempfile::tempdir().unwrap();
    let response = get_world_map(State(test_state(&dir))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(0));
    assert_eq!(json["layout"]["height"], 490);
}

#[tokio::test]
async fn added_trip_shows_up_on_map_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let response = post_trip(State(state.clone()), Json(paris())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["id"], "1");

    let json = body_json(get_map(State(state.clone()), Path("Europe".into())).await).await;
    assert_eq!(json["data"][0]["locations"][0], "FRA");
    assert_eq!(json["data"][1]["text"][0], "Paris, France");
    assert_eq!(json["layout"]["geo"]["scope"], "europe");

    let summary = body_json(get_summary(State(state)).await).await;
    assert_eq!(summary["trips"], 1);
    assert_eq!(summary["countries"], 1);
}

#[tokio::test]
async fn unknown_region_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let response = get_map(State(test_state(&dir)), Path("Atlantis".into())).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_trip_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut trip = paris();
    trip.longitude = 200.;

    let response = post_trip(State(test_state(&dir)), Json(trip)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn regions_are_listed_in_order() {
    let Json(regions) = get_regions().await;
    assert_eq!(regions, vec!["World", "Americas", "Europe", "Asia", "Africa", "Oceania"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_posts_get_distinct_ids() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir);

    let handles: Vec<_> = (0..8)
        .map(|_| tokio::spawn(post_trip(State(state.clone()), Json(paris()))))
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        let response = handle.await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        ids.push(body_json(response).await["id"].as_str().unwrap().parse::<i64>().unwrap());
    }
    ids.sort();
    assert_eq!(ids, (1..=8).collect::<Vec<i64>>());

    let summary = body_json(get_summary(State(state)).await).await;
    assert_eq!(summary["trips"], 8);
}
