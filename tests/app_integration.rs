use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use quotewatch::core::cache::DEFAULT_TTL;
use quotewatch::core::{KeyValueStorage, QuoteCache, SystemClock};
use quotewatch::providers::AwesomeApiSource;
use quotewatch::scheduler::{FETCH_ERROR_MESSAGE, FirstTick, QuoteScheduler, SchedulerPhase};
use quotewatch::store::DiskStorage;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const QUOTES_PATH: &str = "/json/last/CAD-BRL,ARS-BRL,GBP-BRL";

    pub const MOCK_RESPONSE: &str = r#"{
        "CADBRL": {
            "code": "CAD",
            "codein": "BRL",
            "name": "Dólar Canadense/Real Brasileiro",
            "bid": "3.85",
            "pctChange": "1.2",
            "create_date": "2026-01-27 10:30:00"
        },
        "ARSBRL": {
            "code": "ARS",
            "codein": "BRL",
            "name": "Peso Argentino/Real Brasileiro",
            "bid": "0.0058",
            "pctChange": "-1.69",
            "create_date": "2026-01-27 10:30:00"
        },
        "GBPBRL": {
            "code": "GBP",
            "codein": "BRL",
            "name": "Libra Esterlina/Real Brasileiro",
            "pctChange": "1.42",
            "create_date": "2026-01-27 10:30:00"
        }
    }"#;

    /// Mock server answering the quotes endpoint exactly `times` times.
    pub async fn create_mock_server(status: u16, body: &str, times: u64) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(QUOTES_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .expect(times)
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn pairs() -> Vec<String> {
        vec![
            "CAD-BRL".to_string(),
            "ARS-BRL".to_string(),
            "GBP-BRL".to_string(),
        ]
    }
}

fn write_config(dir: &std::path::Path, base_url: &str) -> std::path::PathBuf {
    let config_path = dir.join("config.yaml");
    let config_content = format!(
        r#"
        cache_ttl_secs: 180
        data_path: "{}"
        provider:
          base_url: "{}"
    "#,
        dir.join("data").display(),
        base_url
    );
    fs::write(&config_path, config_content).expect("Failed to write config file");
    config_path
}

fn new_scheduler(base_url: &str, storage: Arc<DiskStorage>) -> QuoteScheduler {
    let source = AwesomeApiSource::new(base_url, test_utils::pairs(), None)
        .expect("Failed to create source");
    let cache = QuoteCache::new(storage, Arc::new(SystemClock), DEFAULT_TTL);
    let initial = ["Dólar Canadense", "Peso Argentino", "Libra Esterlina"]
        .into_iter()
        .map(quotewatch::core::Quote::placeholder)
        .collect();
    QuoteScheduler::new(Arc::new(source), cache, initial)
}

#[test_log::test(tokio::test)]
async fn test_fetched_quotes_are_reused_by_next_session() {
    let mock_server = test_utils::create_mock_server(200, test_utils::MOCK_RESPONSE, 1).await;
    let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let storage = Arc::new(DiskStorage::open(data_dir.path()).expect("Failed to open storage"));

    // First session fetches and persists
    let first = new_scheduler(&mock_server.uri(), storage.clone());
    let mut quotes_rx = first.subscribe_quotes();
    assert_eq!(first.start(), FirstTick::Immediate);
    tokio::time::timeout(Duration::from_secs(5), quotes_rx.changed())
        .await
        .expect("Timed out waiting for quotes")
        .expect("Scheduler dropped");
    first.stop();

    let fetched = first.quotes();
    info!(?fetched, "First session quotes");
    assert_eq!(fetched.len(), 3);
    assert_eq!(fetched[0].code.as_deref(), Some("CAD"));
    assert_eq!(fetched[0].title, "Dólar Canadense");
    assert_eq!(fetched[0].current_value, Some(3.85));
    assert_eq!(fetched[0].variation.as_deref(), Some("1.2"));
    assert_eq!(fetched[0].updated.as_deref(), Some("10:30:00"));
    assert_eq!(fetched[1].current_value, Some(0.0058));
    assert!(fetched[2].current_value.is_none());
    drop(first);

    // Second session is served from the cache without touching the network
    let second = new_scheduler(&mock_server.uri(), storage.clone());
    match second.start() {
        FirstTick::Deferred(remaining) => {
            assert!(remaining > Duration::ZERO && remaining <= DEFAULT_TTL)
        }
        FirstTick::Immediate => panic!("Expected the cached quotes to be reused"),
    }
    assert_eq!(second.quotes(), fetched);
    assert!(!second.loading());
    second.stop();

    assert!(
        storage
            .get_item(quotewatch::core::cache::CACHE_KEY)
            .expect("Storage read failed")
            .is_some()
    );
}

#[test_log::test(tokio::test)]
async fn test_failed_fetch_is_reported_and_halts() {
    let mock_server = test_utils::create_mock_server(503, "unavailable", 1).await;
    let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let storage = Arc::new(DiskStorage::open(data_dir.path()).expect("Failed to open storage"));

    let scheduler = new_scheduler(&mock_server.uri(), storage);
    let mut phase_rx = scheduler.subscribe_phase();
    scheduler.start();
    tokio::time::timeout(
        Duration::from_secs(5),
        phase_rx.wait_for(|phase| *phase == SchedulerPhase::Errored),
    )
    .await
    .expect("Timed out waiting for the failure")
    .expect("Scheduler dropped");

    assert_eq!(scheduler.error().as_deref(), Some(FETCH_ERROR_MESSAGE));
    assert!(!scheduler.loading());
    assert_eq!(scheduler.quotes()[0].title, "Dólar Canadense");
    assert!(scheduler.quotes()[0].current_value.is_none());
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let mock_server = test_utils::create_mock_server(200, test_utils::MOCK_RESPONSE, 1).await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), &mock_server.uri());

    let result = quotewatch::run_command(
        quotewatch::AppCommand::Show,
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Show command failed with: {:?}",
        result.err()
    );

    let result = quotewatch::run_command(
        quotewatch::AppCommand::Clear,
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Clear command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_refresh_fails_when_api_errors() {
    let mock_server = test_utils::create_mock_server(500, "oops", 1).await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), &mock_server.uri());

    let result = quotewatch::run_command(
        quotewatch::AppCommand::Refresh,
        Some(config_path.to_str().unwrap()),
    )
    .await;

    let err = result.expect_err("Refresh should fail when the API errors");
    assert!(format!("{err:#}").contains(FETCH_ERROR_MESSAGE));
}

#[test_log::test(tokio::test)]
async fn test_invalid_config_is_rejected() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, "pairs: []\n").expect("Failed to write config file");

    let result = quotewatch::run_command(
        quotewatch::AppCommand::Show,
        Some(config_path.to_str().unwrap()),
    )
    .await;

    assert!(result.is_err());
}
