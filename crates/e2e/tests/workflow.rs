//! Purchase journeys against the simulated site

use std::time::Duration;

use flightpath_common::{ErrorKind, FlowConfig, Randomizer, RouteCatalog, RunOutcome, RunState, TripRequest};
use flightpath_e2e::stages::selectors;
use flightpath_e2e::{E2eError, E2eResult, SimConfig, SimLog, SimulatedSite, Stages, Workflow};
use test_case::test_case;

struct Journey {
    result: E2eResult<RunOutcome>,
    history: Vec<RunState>,
    log: SimLog,
}

async fn run_journey(sim: SimConfig, request: &TripRequest, seed: u64) -> Journey {
    let config = FlowConfig::default();
    let catalog = RouteCatalog::builtin().unwrap();
    let stages = Stages::from_config(&config);
    let mut site = SimulatedSite::new(sim);

    let mut workflow = Workflow::new(&catalog, &stages, Randomizer::seeded(seed));
    let result = workflow.run(&mut site, request).await;

    Journey {
        result,
        history: workflow.history().to_vec(),
        log: site.log(),
    }
}

fn request(origin: Option<&str>, destination: Option<&str>, flight: Option<usize>) -> TripRequest {
    TripRequest::new(origin, destination, flight)
}

#[tokio::test]
async fn boston_to_berlin_first_flight() {
    let journey = run_journey(SimConfig::default(), &request(Some("Boston"), Some("Berlin"), Some(1)), 1).await;

    let outcome = journey.result.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.trip.origin, "Boston");
    assert_eq!(outcome.trip.destination, "Berlin");
    assert_eq!(outcome.flight_index, 1);
    assert_eq!(outcome.flight_count, 5);
    assert_eq!(outcome.status_label, "PendingCapture");
    assert_eq!(outcome.price, 472.56);
    assert!(outcome.price > 100.0);

    assert_eq!(
        journey.history,
        vec![
            RunState::Idle,
            RunState::Validated,
            RunState::Navigated,
            RunState::Listed,
            RunState::FormFilled,
            RunState::Confirmed,
        ]
    );
    assert_eq!(journey.log.navigations, 1);
}

#[test_case(Some("Paris"), Some("Paris"), ErrorKind::SameCity ; "same city")]
#[test_case(Some("London"), Some("Berlin"), ErrorKind::InvalidOrigin ; "origin not in catalog")]
#[test_case(Some("Boston"), Some("Tokyo"), ErrorKind::InvalidDestination ; "destination not served")]
#[test_case(Some("London"), Some("Tokyo"), ErrorKind::InvalidOrigin ; "origin checked before destination")]
#[tokio::test]
async fn rejected_before_navigation(origin: Option<&str>, destination: Option<&str>, kind: ErrorKind) {
    let journey = run_journey(SimConfig::default(), &request(origin, destination, None), 3).await;

    let err = journey.result.unwrap_err();
    assert_eq!(err.kind(), kind);
    assert!(err.rule().is_some());
    assert_eq!(journey.log.navigations, 0);
    assert!(journey.log.actions.is_empty());
    assert!(matches!(journey.history.last(), Some(RunState::Failed(_))));
}

#[tokio::test]
async fn fully_random_runs_stay_on_catalog_routes() {
    let catalog = RouteCatalog::builtin().unwrap();

    for seed in 0..25 {
        let journey = run_journey(SimConfig::default(), &TripRequest::default(), seed).await;
        let outcome = journey.result.unwrap();

        assert_ne!(outcome.trip.origin, outcome.trip.destination);
        assert!(catalog.is_valid_pair(&outcome.trip.origin, &outcome.trip.destination));
        assert!((1..=5).contains(&outcome.flight_index));
    }
}

#[tokio::test]
async fn destination_only_draws_a_serving_origin() {
    let catalog = RouteCatalog::builtin().unwrap();
    let journey = run_journey(SimConfig::default(), &request(None, Some("Berlin"), None), 11).await;

    let outcome = journey.result.unwrap();
    assert_eq!(outcome.trip.destination, "Berlin");
    assert!(catalog.is_valid_pair(&outcome.trip.origin, "Berlin"));
}

#[tokio::test]
async fn same_seed_same_journey() {
    let first = run_journey(SimConfig::default(), &TripRequest::default(), 99).await;
    let second = run_journey(SimConfig::default(), &TripRequest::default(), 99).await;

    assert_eq!(first.result.unwrap(), second.result.unwrap());
    assert_eq!(first.log.submitted_forms, second.log.submitted_forms);
}

#[tokio::test]
async fn last_listed_flight_can_be_booked() {
    let journey = run_journey(SimConfig::default(), &request(Some("Paris"), Some("Rome"), Some(5)), 0).await;

    let outcome = journey.result.unwrap();
    assert_eq!(outcome.flight_index, 5);
    assert_eq!(outcome.price, 233.98);
}

#[test_case(6 ; "one past the end")]
#[test_case(0 ; "zero")]
#[tokio::test]
async fn flight_index_out_of_range(index: usize) {
    let journey = run_journey(SimConfig::default(), &request(Some("Paris"), Some("Rome"), Some(index)), 0).await;

    match journey.result.unwrap_err() {
        E2eError::Rule(flightpath_common::Error::InvalidFlightIndex { index: got, total }) => {
            assert_eq!(got, index);
            assert_eq!(total, 5);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(journey.log.navigations, 1);
    assert!(journey.log.submitted_forms.is_empty());
}

#[tokio::test]
async fn empty_listing_means_no_flights() {
    let sim = SimConfig {
        fares: vec![],
        ..SimConfig::default()
    };
    let journey = run_journey(sim, &request(Some("Boston"), Some("Rome"), None), 0).await;

    assert_eq!(journey.result.unwrap_err().kind(), ErrorKind::NoFlightsAvailable);
    let reached: Vec<_> = journey.history.iter().take(3).cloned().collect();
    assert_eq!(reached, vec![RunState::Idle, RunState::Validated, RunState::Navigated]);
    assert!(matches!(journey.history.last(), Some(RunState::Failed(_))));
}

#[test_case(99.5 ; "below minimum")]
#[test_case(100.0 ; "equal to minimum")]
#[tokio::test]
async fn price_must_exceed_minimum(fare: f64) {
    let sim = SimConfig {
        fares: vec![fare],
        ..SimConfig::default()
    };
    let journey = run_journey(sim, &request(Some("Boston"), Some("Berlin"), Some(1)), 0).await;

    assert_eq!(journey.result.unwrap_err().kind(), ErrorKind::PriceOutOfRange);
    assert!(journey.history.contains(&RunState::FormFilled));
    assert!(!journey.history.contains(&RunState::Confirmed));
}

#[tokio::test]
async fn unreadable_price() {
    let sim = SimConfig {
        amount_text: Some("TBD".to_string()),
        ..SimConfig::default()
    };
    let journey = run_journey(sim, &request(Some("Boston"), Some("Berlin"), Some(1)), 0).await;

    assert_eq!(journey.result.unwrap_err().kind(), ErrorKind::PriceParse);
}

#[tokio::test]
async fn price_with_currency_text() {
    let sim = SimConfig {
        amount_text: Some("USD 555".to_string()),
        ..SimConfig::default()
    };
    let journey = run_journey(sim, &request(Some("Boston"), Some("Berlin"), Some(2)), 0).await;

    assert_eq!(journey.result.unwrap().price, 555.0);
}

#[tokio::test]
async fn wrong_status_is_reported() {
    let sim = SimConfig {
        status_label: "Declined".to_string(),
        ..SimConfig::default()
    };
    let journey = run_journey(sim, &request(Some("Boston"), Some("Berlin"), Some(1)), 0).await;

    let err = journey.result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StatusMismatch);
    assert!(matches!(err, E2eError::StatusMismatch { ref expected, .. } if expected == "PendingCapture"));
}

#[tokio::test]
async fn purchase_form_is_complete() {
    let journey = run_journey(SimConfig::default(), &request(Some("Boston"), Some("Berlin"), Some(1)), 5).await;
    assert!(journey.result.is_ok());

    let form = &journey.log.submitted_forms[0];
    for input in selectors::FORM_INPUTS {
        assert!(!form[input].is_empty(), "{} left empty", input);
    }
    let card = &form[selectors::CARD_NUMBER];
    assert_eq!(card.len(), 15);
    assert!(card.starts_with('3'));
    assert_eq!(form[selectors::ZIP_CODE].len(), 5);
}

#[tokio::test]
async fn workflow_is_single_use() {
    let config = FlowConfig::default();
    let catalog = RouteCatalog::builtin().unwrap();
    let stages = Stages::from_config(&config);
    let mut site = SimulatedSite::new(SimConfig::default());
    let mut workflow = Workflow::new(&catalog, &stages, Randomizer::seeded(8));

    let trip = request(Some("Boston"), Some("Berlin"), Some(1));
    workflow.run(&mut site, &trip).await.unwrap();
    assert!(workflow.run(&mut site, &trip).await.is_err());
    assert_eq!(workflow.state(), &RunState::Confirmed);
    assert_eq!(site.log().navigations, 1);
}

#[tokio::test]
async fn concurrent_runs_are_isolated() {
    let slow = SimConfig {
        latency: Duration::from_millis(2),
        ..SimConfig::default()
    };
    let first = request(Some("Boston"), Some("Berlin"), Some(1));
    let second = request(Some("Mexico City"), Some("Rome"), Some(3));

    let (a, b) = tokio::join!(
        run_journey(slow.clone(), &first, 1),
        run_journey(slow.clone(), &second, 2)
    );

    let a = a.result.unwrap();
    let b = b.result.unwrap();
    assert_eq!((a.trip.origin.as_str(), a.flight_index), ("Boston", 1));
    assert_eq!((b.trip.origin.as_str(), b.flight_index), ("Mexico City", 3));
    assert_eq!(b.price, 200.98);
}
