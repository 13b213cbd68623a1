//! Tests for entity assembly

use super::*;
use crate::config::EndpointConfig;
use crate::record::{EntityDetail, PlaceExtras};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_config(server: &MockServer) -> ScrapeConfig {
    let mut config = ScrapeConfig {
        api_key: Some("test-key".into()),
        page_delay_ms: 0,
        ..ScrapeConfig::default()
    };
    config.endpoints = EndpointConfig::all_at(&server.uri());
    config.http.max_retries = 0;
    config.http.requests_per_second = 0;
    config
}

fn graphql_reviews(dates: &[&str]) -> Value {
    let reviews: Vec<Value> = dates
        .iter()
        .enumerate()
        .map(|(i, d)| {
            json!({
                "title": format!("Review {i}"),
                "text": "Lovely stay",
                "rating": 5,
                "publishedDate": d,
                "language": "en",
                "userProfile": {"username": format!("guest{i}")}
            })
        })
        .collect();

    json!([{"data": {"locations": [{"reviewList": {
        "totalCount": reviews.len(),
        "reviews": reviews
    }}]}}])
}

async fn mount_detail(server: &MockServer, id: u64, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/internal/1.14/location/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_keywords(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/internal/1\.14/location/\d+/keywords$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"text": "pool", "review_count": 8}],
            "paging": {"total_results": 1, "next": null}
        })))
        .mount(server)
        .await;
}

async fn mount_graphql(server: &MockServer, response: Value) {
    Mock::given(method("POST"))
        .and(path("/data/graphql/batched"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(server)
        .await;
}

fn seed(content_type: ContentType, id: u64) -> SeedRow {
    SeedRow {
        row_id: Some("7".into()),
        id_datatourisme: Some("dt-1".into()),
        ..SeedRow::from_location(content_type, id)
    }
}

// ============================================================================
// Places
// ============================================================================

#[tokio::test]
async fn test_assemble_hotel() {
    let mock_server = MockServer::start().await;
    mount_detail(
        &mock_server,
        42,
        json!({
            "location_id": "42",
            "name": "Hotel du Parc",
            "hotel_class": "4.0",
            "amenities": [{"name": "Pool"}],
            "rating_histogram": {"count_1": 1, "count_5": "30"}
        }),
    )
    .await;
    mount_graphql(&mock_server, graphql_reviews(&["2023-07-01", "2023-06-02"])).await;
    mount_keywords(&mock_server).await;

    let config = Arc::new(mock_config(&mock_server));
    let session = Session::new("t", &config).unwrap();
    let assembler = EntityAssembler::new(config);

    let record = assembler
        .assemble(&seed(ContentType::Hotel, 42), &session)
        .await
        .unwrap();

    assert_eq!(record.id_tripadvisor, 42);
    assert_eq!(record.row_id.as_deref(), Some("7"));
    assert_eq!(record.reviews.len(), 2);
    assert_eq!(record.tags_array, vec!["pool".to_string()]);
    assert_eq!(record.tags_object.get("pool"), Some(&8));
    assert_eq!(record.rating_histogram.count(5), 30);

    let EntityDetail::Place(ref place) = record.detail else {
        panic!("expected place detail");
    };
    let PlaceExtras::Lodging(ref lodging) = place.extras else {
        panic!("expected lodging extras");
    };
    assert_eq!(lodging.amenities, vec!["Pool".to_string()]);

    let out = serde_json::to_value(&record).unwrap();
    assert_eq!(out["type"], "hotel");
    assert_eq!(out["id_tripadvisor"], 42);
    assert_eq!(out["id_datatourisme"], "dt-1");
    assert_eq!(out["name"], "Hotel du Parc");
    assert_eq!(out["ratingHistogram"]["1"], 1);
}

#[tokio::test]
async fn test_hotel_rating_notes_from_site_page() {
    let mock_server = MockServer::start().await;
    let page_url = format!("{}/Hotel_Review-g1-d42-Inn.html", mock_server.uri());
    mount_detail(
        &mock_server,
        42,
        json!({"location_id": 42, "name": "Inn", "web_url": page_url}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/Hotel_Review-g1-d42-Inn.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><div class="_1krg1t5y"><span class="ui_bubble_rating bubble_35"></span><div class="_1h7NKZWM">Rooms</div></div></body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_graphql(&mock_server, graphql_reviews(&[])).await;
    mount_keywords(&mock_server).await;

    let config = Arc::new(mock_config(&mock_server));
    let session = Session::new("t", &config).unwrap();

    let record = EntityAssembler::new(config)
        .assemble(&seed(ContentType::Hotel, 42), &session)
        .await
        .unwrap();

    let out = serde_json::to_value(&record).unwrap();
    assert_eq!(out["aboutRatingNotes"], json!({"Rooms": 3.5}));
}

#[tokio::test]
async fn test_unreadable_rating_notes_page_degrades() {
    let mock_server = MockServer::start().await;
    let page_url = format!("{}/Restaurant_Review-d8.html", mock_server.uri());
    mount_detail(
        &mock_server,
        8,
        json!({"location_id": 8, "name": "Chez Paul", "web_url": page_url}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/Restaurant_Review-d8.html"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    mount_keywords(&mock_server).await;

    let mut config = mock_config(&mock_server);
    config.include_reviews = false;
    let config = Arc::new(config);
    let session = Session::new("t", &config).unwrap();

    let record = EntityAssembler::new(config)
        .assemble(&seed(ContentType::Restaurant, 8), &session)
        .await
        .unwrap();

    let EntityDetail::Place(ref place) = record.detail else {
        panic!("expected place detail");
    };
    assert!(place.about_rating_notes.is_empty());
    assert_eq!(place.name.as_deref(), Some("Chez Paul"));
}

#[tokio::test]
async fn test_reviews_are_repeatable_without_cutoff() {
    let mock_server = MockServer::start().await;
    mount_detail(&mock_server, 42, json!({"location_id": 42, "name": "Inn"})).await;
    mount_graphql(
        &mock_server,
        graphql_reviews(&["2023-07-01", "2023-06-02", "2021-01-01"]),
    )
    .await;
    mount_keywords(&mock_server).await;

    let config = Arc::new(mock_config(&mock_server));
    let assembler = EntityAssembler::new(config.clone());
    let hotel = seed(ContentType::Hotel, 42);

    let first = assembler
        .assemble(&hotel, &Session::new("a", &config).unwrap())
        .await
        .unwrap();
    let second = assembler
        .assemble(&hotel, &Session::new("b", &config).unwrap())
        .await
        .unwrap();

    assert_eq!(first.reviews.len(), 3);
    assert_eq!(
        serde_json::to_string(&first.reviews).unwrap(),
        serde_json::to_string(&second.reviews).unwrap()
    );
}

#[tokio::test]
async fn test_reviews_stop_at_cutoff() {
    let mock_server = MockServer::start().await;
    mount_detail(&mock_server, 42, json!({"location_id": 42, "name": "Inn"})).await;
    mount_graphql(
        &mock_server,
        graphql_reviews(&["2023-07-01", "2023-06-02", "2023-05-01", "2023-04-01"]),
    )
    .await;
    mount_keywords(&mock_server).await;

    let mut config = mock_config(&mock_server);
    config.last_review_date = NaiveDate::from_ymd_opt(2023, 6, 1);
    let config = Arc::new(config);
    let session = Session::new("t", &config).unwrap();

    let record = EntityAssembler::new(config)
        .assemble(&seed(ContentType::Hotel, 42), &session)
        .await
        .unwrap();

    assert_eq!(record.reviews.len(), 2);
    assert_eq!(record.reviews[1].title, "Review 1");
}

#[tokio::test]
async fn test_restaurant_without_reviews() {
    let mock_server = MockServer::start().await;
    mount_detail(
        &mock_server,
        8,
        json!({"location_id": 8, "name": "Chez Paul", "cuisine": [{"name": "French"}]}),
    )
    .await;
    mount_keywords(&mock_server).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(graphql_reviews(&["2023-07-01"])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = mock_config(&mock_server);
    config.include_reviews = false;
    let config = Arc::new(config);
    let session = Session::new("t", &config).unwrap();

    let record = EntityAssembler::new(config)
        .assemble(&seed(ContentType::Restaurant, 8), &session)
        .await
        .unwrap();

    assert!(record.reviews.is_empty());
    let out = serde_json::to_value(&record).unwrap();
    assert_eq!(out["type"], "restaurant");
    assert_eq!(out["cuisine"], json!(["French"]));
}

#[tokio::test]
async fn test_review_and_tag_failures_degrade() {
    let mock_server = MockServer::start().await;
    mount_detail(&mock_server, 42, json!({"location_id": 42, "name": "Inn"})).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/internal/1.14/location/42/keywords"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let config = Arc::new(mock_config(&mock_server));
    let session = Session::new("t", &config).unwrap();

    let record = EntityAssembler::new(config)
        .assemble(&seed(ContentType::Hotel, 42), &session)
        .await
        .unwrap();

    assert!(record.reviews.is_empty());
    assert!(record.tags_array.is_empty());
    assert!(record.tags_object.is_empty());
}

#[tokio::test]
async fn test_attraction_uses_rest_reviews() {
    let mock_server = MockServer::start().await;
    mount_detail(&mock_server, 5, json!({"location_id": 5, "name": "Louvre"})).await;
    mount_keywords(&mock_server).await;
    Mock::given(method("GET"))
        .and(path("/api/internal/1.14/location/5/reviews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "title": "Huge",
                "published_date": "2023-08-01T12:00:00-04:00",
                "lang": "en",
                "user": {"username": "alice", "user_location": {"name": "Lyon"}}
            }],
            "paging": {"total_results": 1, "next": null}
        })))
        .mount(&mock_server)
        .await;

    let config = Arc::new(mock_config(&mock_server));
    let session = Session::new("t", &config).unwrap();

    let record = EntityAssembler::new(config)
        .assemble(&seed(ContentType::Attraction, 5), &session)
        .await
        .unwrap();

    assert_eq!(record.reviews.len(), 1);
    let author = record.reviews[0].author.as_ref().unwrap();
    assert_eq!(author.username, "alice");
    assert_eq!(author.location.as_deref(), Some("Lyon"));
}

#[tokio::test]
async fn test_place_failures() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/internal/1.14/location/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = Arc::new(mock_config(&mock_server));
    let session = Session::new("t", &config).unwrap();
    let assembler = EntityAssembler::new(config);

    let err = assembler
        .assemble(&seed(ContentType::Hotel, 404), &session)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Lookup { .. }));

    let no_id = SeedRow {
        external_id: None,
        ..seed(ContentType::Restaurant, 1)
    };
    let err = assembler.assemble(&no_id, &session).await.unwrap_err();
    assert!(matches!(err, Error::Lookup { .. }));
}

// ============================================================================
// Vacation Rentals
// ============================================================================

const RENTAL_PAGE: &str = r#"<html><head>
<script type="application/ld+json">{"name": "Sea View Flat", "description": "Two rooms",
  "areaServed": {"name": "Nice"}, "aggregateRating": {"ratingValue": 4.8, "reviewCount": 12}}</script>
</head><body>
<a href="https://maps.google.com/maps?ll=43.69,7.26&amp;z=14">map</a>
<div class="ppr_priv_vr_traveler_inputs_and_rap">From $140</div>
<div class="_2bZ4gZhI">Appartement · 2 chambres · 4 personnes</div>
</body></html>"#;

#[tokio::test]
async fn test_assemble_rental() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/VacationRentalReview-g187234-d555-Sea_View_Flat.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RENTAL_PAGE))
        .mount(&mock_server)
        .await;
    mount_graphql(&mock_server, graphql_reviews(&["2023-07-01"])).await;

    let config = Arc::new(mock_config(&mock_server));
    let session = Session::new("t", &config).unwrap();
    let url = format!(
        "{}/VacationRentalReview-g187234-d555-Sea_View_Flat.html",
        mock_server.uri()
    );
    let seed = SeedRow {
        row_id: Some("3".into()),
        ..SeedRow::from_url(ContentType::VacationRental, url.clone())
    };

    let record = EntityAssembler::new(config)
        .assemble(&seed, &session)
        .await
        .unwrap();

    assert_eq!(record.id_tripadvisor, 555);
    assert_eq!(record.reviews.len(), 1);
    assert!(record.tags_array.is_empty());

    let EntityDetail::Rental(ref rental) = record.detail else {
        panic!("expected rental detail");
    };
    assert_eq!(rental.name.as_deref(), Some("Sea View Flat"));
    assert_eq!(rental.latitude.as_deref(), Some("43.69"));
    assert_eq!(rental.longitude.as_deref(), Some("7.26"));
    assert_eq!(rental.web_url, url);

    let out = serde_json::to_value(&record).unwrap();
    assert_eq!(out["type"], "vacation_rental");
    assert_eq!(out["rowId"], "3");
    assert_eq!(out["pricePerNight"], " $140");
    assert_eq!(out["chambres"], "2");
    assert_eq!(out["personnes"], "4");
    assert_eq!(out["salles_de_bains"], Value::Null);
}

#[tokio::test]
async fn test_rental_without_url() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(mock_config(&mock_server));
    let session = Session::new("t", &config).unwrap();

    let seed = SeedRow::from_location(ContentType::VacationRental, 9);
    let err = EntityAssembler::new(config)
        .assemble(&seed, &session)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Lookup { .. }));
}
