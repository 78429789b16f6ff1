//! End-to-end pipeline tests with wiremock standing in for the geocoding
//! service and the query backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use impact_core::{AdminLabel, Endpoint, LocationSpec, NetworkData, QueryFailure, QueryResult};
use impact_geocode::GeocoderClient;
use impact_pipeline::{Orchestrator, Phase, Presenter};
use impact_query::{PollConfig, QueryClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingPresenter(Mutex<Vec<QueryResult>>);

impl Presenter for RecordingPresenter {
    fn present(&self, result: &QueryResult) {
        self.0.lock().unwrap().push(result.clone());
    }
}

impl RecordingPresenter {
    fn presented(&self) -> Vec<QueryResult> {
        self.0.lock().unwrap().clone()
    }
}

fn fast_poll() -> PollConfig {
    PollConfig {
        initial_wait_ms: 1,
        max_attempts: 10,
        transport_retries: 1,
        transport_backoff_ms: 0,
    }
}

fn orchestrator(
    geo: &MockServer,
    backend: &MockServer,
) -> (Orchestrator, Arc<RecordingPresenter>) {
    let presenter = Arc::new(RecordingPresenter::default());
    let geocoder = GeocoderClient::with_base_url(30, "impact-tests/0.1", None, &geo.uri())
        .expect("geocoder construction should not fail");
    let backend = QueryClient::new(&backend.uri(), 30, "impact-tests/0.1")
        .expect("query client construction should not fail");
    let orchestrator = Orchestrator::new(
        geocoder,
        backend,
        fast_poll(),
        Arc::clone(&presenter) as Arc<dyn Presenter>,
    );
    (orchestrator, presenter)
}

fn city_spec(city: &str, country: &str) -> LocationSpec {
    LocationSpec::CityRegionCountry {
        city: city.to_owned(),
        region: String::new(),
        country: country.to_owned(),
    }
}

fn geocode_body(city: &str, country: &str, lat: f64, lng: f64) -> serde_json::Value {
    serde_json::json!({
        "status": "OK",
        "results": [
            {
                "address_components": [
                    { "long_name": city, "types": ["locality"] },
                    { "long_name": country, "types": ["country"] }
                ],
                "geometry": { "location": { "lat": lat, "lng": lng } }
            }
        ]
    })
}

fn complete_stats() -> serde_json::Value {
    serde_json::json!({
        "complete": true,
        "sample size": 256,
        "SampleRTT": { "average": 41.0, "stdev": 2.5 }
    })
}

#[tokio::test]
async fn completed_query_flows_straight_to_the_presenter() {
    let geo = MockServer::start().await;
    let backend = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("address", "New York, United States"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(geocode_body("New York", "United States", 40.7, -74.0)),
        )
        .mount(&geo)
        .await;

    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("cCity", "New York"))
        .and(query_param("sType", "global"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "network data": complete_stats() })),
        )
        .expect(1)
        .mount(&backend)
        .await;

    let (orchestrator, presenter) = orchestrator(&geo, &backend);
    let ticket = orchestrator.submit(
        city_spec("New York", "United States"),
        LocationSpec::Global,
    );
    let result = ticket.wait().await.expect("generation survives");

    assert!(result.error.is_none(), "unexpected error: {result:?}");
    let client = result.client.as_ref().expect("client resolved");
    assert_eq!(
        client.labels().and_then(|l| l.get(AdminLabel::City)),
        Some("New York")
    );
    let NetworkData::Complete(stats) = &result.network_data else {
        panic!("expected completed network data, got {result:?}");
    };
    assert_eq!(stats.sample_size(), Some(256));

    assert_eq!(presenter.presented(), vec![result]);
    let (phase, _) = orchestrator.snapshot();
    assert_eq!(phase, Phase::Idle);
}

#[tokio::test]
async fn incomplete_query_polls_until_the_job_completes() {
    let geo = MockServer::start().await;
    let backend = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({ "network data": { "complete": false, "jobID": "7" } }),
        ))
        .expect(1)
        .mount(&backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/bq_job"))
        .and(query_param("jobID", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(complete_stats()))
        .expect(1)
        .mount(&backend)
        .await;

    let (orchestrator, presenter) = orchestrator(&geo, &backend);
    let ticket = orchestrator.submit(LocationSpec::Global, LocationSpec::Global);
    let result = ticket.wait().await.expect("generation survives");

    assert!(result.error.is_none(), "unexpected error: {result:?}");
    assert!(
        matches!(result.network_data, NetworkData::Complete(_)),
        "expected completed network data, got {result:?}"
    );
    assert_eq!(presenter.presented().len(), 1);
}

#[tokio::test]
async fn geocode_failure_is_presented_without_network_data() {
    let geo = MockServer::start().await;
    let backend = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "status": "ZERO_RESULTS", "results": [] })),
        )
        .mount(&geo)
        .await;
    // The pipeline must short-circuit before the backend.
    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend)
        .await;

    let (orchestrator, presenter) = orchestrator(&geo, &backend);
    let ticket = orchestrator.submit(city_spec("Nowhere", ""), LocationSpec::Global);
    let result = ticket.wait().await.expect("generation survives");

    assert_eq!(
        result.error,
        Some(QueryFailure::Geocode {
            endpoint: Endpoint::Client,
            status: "ZERO_RESULTS".to_owned(),
        })
    );
    assert_eq!(result.network_data, NetworkData::Absent);
    assert_eq!(presenter.presented().len(), 1);
}

#[tokio::test]
async fn a_new_submission_supersedes_a_pending_generation() {
    let geo = MockServer::start().await;
    let backend = MockServer::start().await;

    // Generation 1's geocode answers long after generation 2 has finished.
    Mock::given(method("GET"))
        .and(query_param("address", "Old Town, "))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(geocode_body("Old Town", "Oldland", 1.0, 1.0))
                .set_delay(Duration::from_millis(400)),
        )
        .expect(1)
        .mount(&geo)
        .await;
    Mock::given(method("GET"))
        .and(query_param("address", "New Town, "))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(geocode_body("New Town", "Newland", 2.0, 2.0)),
        )
        .expect(1)
        .mount(&geo)
        .await;

    // Only generation 2 may ever reach the backend.
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("cCity", "Old Town"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("cCity", "New Town"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "network data": complete_stats() })),
        )
        .expect(1)
        .mount(&backend)
        .await;

    let (orchestrator, presenter) = orchestrator(&geo, &backend);
    let first = orchestrator.submit(city_spec("Old Town", ""), LocationSpec::Global);
    let second = orchestrator.submit(city_spec("New Town", ""), LocationSpec::Global);

    let second_result = second.wait().await.expect("newest generation survives");
    assert!(
        matches!(second_result.network_data, NetworkData::Complete(_)),
        "expected completed network data, got {second_result:?}"
    );

    // The superseded generation ends without a result, a presentation, or
    // any write to the state now owned by generation 2.
    assert!(first.wait().await.is_none());
    assert_eq!(presenter.presented(), vec![second_result.clone()]);

    let (_, current) = orchestrator.snapshot();
    assert_eq!(current, second_result);
    assert_eq!(
        current
            .client
            .as_ref()
            .and_then(|c| c.labels())
            .and_then(|l| l.get(AdminLabel::City)),
        Some("New Town")
    );
}
