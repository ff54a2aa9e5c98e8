// Integration tests for Pairing Algo

use actix_web::{test as atest, web, App};
use async_trait::async_trait;
use pairing_algo::core::{
    intersect, FixedSimilarity, PairingEngine, SimilarityError, SimilarityMatrix, SimilarityProvider,
};
use pairing_algo::models::{Gender, PairingResponse, PairingRun, UserRecord};
use pairing_algo::routes::{self, AppState};
use pairing_algo::services::{MemoryPairStore, PairStore};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

/// Small deterministic generator so fixtures are reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }

    fn unit(&mut self) -> f64 {
        (self.next() % 10_000) as f64 / 10_000.0
    }
}

fn generate_population(seed: u64, n: usize) -> (Vec<UserRecord>, SimilarityMatrix) {
    let mut rng = Lcg(seed);

    let users: Vec<UserRecord> = (0..n)
        .map(|i| {
            let gender = if rng.below(2) == 0 { Gender::Male } else { Gender::Female };
            let mentions: Vec<String> = (0..rng.below(3))
                .map(|_| format!("@user{}", rng.below(n as u64)))
                .collect();
            let availability: String = (0..6)
                .map(|_| if rng.below(3) == 0 { '1' } else { '0' })
                .collect();

            UserRecord {
                handle: format!("user{}", i),
                gender,
                about: format!("likes things {}", mentions.join(" ")),
                availability: availability.parse().unwrap(),
            }
        })
        .collect();

    let mut rows = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            // Coarse values so ties actually happen
            let score = (rng.unit() * 10.0).round() / 10.0;
            rows[i][j] = score;
            rows[j][i] = score;
        }
    }

    (users, SimilarityMatrix::from_rows(rows).unwrap())
}

fn mentions(user: &UserRecord, handle: &str) -> bool {
    user.about
        .split_whitespace()
        .any(|word| word.strip_prefix('@') == Some(handle))
}

#[test]
fn test_invariants_hold_on_generated_populations() {
    let engine = PairingEngine::default();

    for seed in 0..50 {
        let (users, sim) = generate_population(seed, 24);
        let outcome = engine.pair(&users, &sim).unwrap();

        // Every user appears at most once
        let mut seen = HashSet::new();
        for (a, b) in outcome
            .pairs
            .iter()
            .map(|p| (p.a, p.b))
            .chain(outcome.full_matches.iter().map(|m| (m.a, m.b)))
        {
            assert!(a < b, "seed {}: indices out of order", seed);
            assert!(seen.insert(a) && seen.insert(b), "seed {}: user reused", seed);
            assert_ne!(users[a].gender, users[b].gender, "seed {}: same gender pair", seed);
        }

        for p in &outcome.pairs {
            let overlap = intersect(&users[p.a].availability, &users[p.b].availability).unwrap();
            assert!(overlap.has_overlap());
            assert_eq!(overlap, p.overlap);
        }

        for m in &outcome.full_matches {
            let overlap = intersect(&users[m.a].availability, &users[m.b].availability).unwrap();
            assert!(!overlap.has_overlap());
            assert!(mentions(&users[m.a], &users[m.b].handle));
            assert!(mentions(&users[m.b], &users[m.a].handle));
        }

        // A mutually mentioning cross-gender couple never leaves both sides unmatched
        for i in 0..users.len() {
            for j in (i + 1)..users.len() {
                let mutual = users[i].gender != users[j].gender
                    && mentions(&users[i], &users[j].handle)
                    && mentions(&users[j], &users[i].handle);
                if mutual {
                    assert!(
                        seen.contains(&i) || seen.contains(&j),
                        "seed {}: mutual couple {} and {} both unmatched",
                        seed,
                        i,
                        j
                    );
                }
            }
        }

        assert_eq!(engine.pair(&users, &sim).unwrap(), outcome, "seed {}: not deterministic", seed);
    }
}

#[test]
fn test_single_gender_population_yields_nothing() {
    let (mut users, sim) = generate_population(7, 12);
    for user in &mut users {
        user.gender = Gender::Female;
    }

    let outcome = PairingEngine::default().pair(&users, &sim).unwrap();

    assert!(outcome.pairs.is_empty());
    assert!(outcome.full_matches.is_empty());
    assert_eq!(outcome.unmatched(12).len(), 12);
}

struct FailingProvider;

#[async_trait]
impl SimilarityProvider for FailingProvider {
    async fn score(&self, _texts: &[String]) -> Result<SimilarityMatrix, SimilarityError> {
        Err(SimilarityError::Api {
            status: 503,
            body: "unavailable".to_string(),
        })
    }
}

fn app_state(provider: Arc<dyn SimilarityProvider>, store: Arc<MemoryPairStore>) -> AppState {
    AppState {
        provider,
        store,
        engine: PairingEngine::default(),
        slot_labels: Arc::new((0..6).map(|k| format!("slot{}", k)).collect()),
    }
}

fn two_users() -> serde_json::Value {
    json!({
        "users": [
            {"handle": "alex", "gender": "male", "about": "jazz", "availability": "101000"},
            {"handle": "bella", "gender": "female", "about": "jazz too", "availability": "100010"}
        ]
    })
}

fn similarity_08() -> Arc<dyn SimilarityProvider> {
    let matrix = SimilarityMatrix::from_rows(vec![vec![1.0, 0.8], vec![0.8, 1.0]]).unwrap();
    Arc::new(FixedSimilarity::new(matrix))
}

#[actix_web::test]
async fn test_preview_endpoint() {
    let store = Arc::new(MemoryPairStore::new());
    let app = atest::init_service(
        App::new()
            .app_data(web::Data::new(app_state(similarity_08(), store.clone())))
            .app_data(routes::json_config())
            .configure(routes::configure_routes),
    )
    .await;

    let req = atest::TestRequest::post()
        .uri("/api/v1/pairs/preview")
        .set_json(two_users())
        .to_request();
    let resp: PairingResponse = atest::call_and_read_body_json(&app, req).await;

    assert_eq!(resp.pairs.len(), 1);
    assert_eq!(resp.pairs[0].a, "alex");
    assert_eq!(resp.pairs[0].b, "bella");
    assert_eq!(resp.pairs[0].score, 0.8);
    assert_eq!(resp.pairs[0].overlap, "100000");
    assert_eq!(resp.pairs[0].overlap_slots, vec!["slot0"]);
    assert!(resp.full_matches.is_empty());
    assert!(resp.unmatched.is_empty());

    // Preview never persists
    assert!(store.load_latest().await.unwrap().is_none());
}

#[actix_web::test]
async fn test_run_endpoint_persists_latest() {
    let store = Arc::new(MemoryPairStore::new());
    let app = atest::init_service(
        App::new()
            .app_data(web::Data::new(app_state(similarity_08(), store.clone())))
            .app_data(routes::json_config())
            .configure(routes::configure_routes),
    )
    .await;

    let req = atest::TestRequest::post()
        .uri("/api/v1/pairs/run")
        .set_json(two_users())
        .to_request();
    let resp: serde_json::Value = atest::call_and_read_body_json(&app, req).await;
    assert!(resp.get("run_id").is_some());
    assert_eq!(resp["pairs"][0]["a"], "alex");

    let req = atest::TestRequest::get().uri("/api/v1/pairs/latest").to_request();
    let latest: PairingRun = atest::call_and_read_body_json(&app, req).await;

    assert_eq!(latest.run_id.to_string(), resp["run_id"].as_str().unwrap());
    assert_eq!(latest.pairs.len(), 1);
    assert_eq!(latest.pairs[0].handle_b, "bella");
    assert!(!latest.pairs[0].is_full_match);
}

#[actix_web::test]
async fn test_full_match_is_stored_with_flag() {
    let store = Arc::new(MemoryPairStore::new());
    let app = atest::init_service(
        App::new()
            .app_data(web::Data::new(app_state(similarity_08(), store.clone())))
            .app_data(routes::json_config())
            .configure(routes::configure_routes),
    )
    .await;

    let body = json!({
        "users": [
            {"handle": "alex", "gender": "male", "about": "@bella", "availability": "010000"},
            {"handle": "bella", "gender": "female", "about": "@alex", "availability": "001000"}
        ]
    });
    let req = atest::TestRequest::post().uri("/api/v1/pairs/run").set_json(body).to_request();
    let resp = atest::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let latest = store.load_latest().await.unwrap().unwrap();
    assert_eq!(latest.pairs.len(), 1);
    assert!(latest.pairs[0].is_full_match);
    assert_eq!(latest.pairs[0].overlap, "");
}

#[actix_web::test]
async fn test_latest_without_run_is_not_found() {
    let app = atest::init_service(
        App::new()
            .app_data(web::Data::new(app_state(similarity_08(), Arc::new(MemoryPairStore::new()))))
            .configure(routes::configure_routes),
    )
    .await;

    let req = atest::TestRequest::get().uri("/api/v1/pairs/latest").to_request();
    let resp = atest::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 404);
}

#[actix_web::test]
async fn test_duplicate_handles_rejected() {
    let app = atest::init_service(
        App::new()
            .app_data(web::Data::new(app_state(similarity_08(), Arc::new(MemoryPairStore::new()))))
            .configure(routes::configure_routes),
    )
    .await;

    let body = json!({
        "users": [
            {"handle": "alex", "gender": "male", "availability": "101000"},
            {"handle": "alex", "gender": "female", "availability": "100010"}
        ]
    });
    let req = atest::TestRequest::post().uri("/api/v1/pairs/preview").set_json(body).to_request();
    let resp = atest::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_web::test]
async fn test_malformed_json_rejected() {
    let app = atest::init_service(
        App::new()
            .app_data(web::Data::new(app_state(similarity_08(), Arc::new(MemoryPairStore::new()))))
            .app_data(routes::json_config())
            .configure(routes::configure_routes),
    )
    .await;

    let req = atest::TestRequest::post()
        .uri("/api/v1/pairs/preview")
        .insert_header(("content-type", "application/json"))
        .set_payload(r#"{"users": [{"handle": "alex", "gender": "robot"}]}"#)
        .to_request();
    let resp = atest::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = atest::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
}

#[actix_web::test]
async fn test_provider_failure_keeps_previous_run() {
    let store = Arc::new(MemoryPairStore::new());
    let previous = PairingRun::from_outcome(&[], &Default::default());
    store.replace_all(&previous).await.unwrap();

    let app = atest::init_service(
        App::new()
            .app_data(web::Data::new(app_state(Arc::new(FailingProvider), store.clone())))
            .configure(routes::configure_routes),
    )
    .await;

    let req = atest::TestRequest::post()
        .uri("/api/v1/pairs/run")
        .set_json(two_users())
        .to_request();
    let resp = atest::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 502);
    assert_eq!(store.load_latest().await.unwrap().unwrap().run_id, previous.run_id);
}

#[actix_web::test]
async fn test_health_endpoint() {
    let app = atest::init_service(
        App::new()
            .app_data(web::Data::new(app_state(similarity_08(), Arc::new(MemoryPairStore::new()))))
            .configure(routes::configure_routes),
    )
    .await;

    let req = atest::TestRequest::get().uri("/api/v1/health").to_request();
    let body: serde_json::Value = atest::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}
