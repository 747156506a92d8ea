// Shared test helpers for integration tests.
//
// Provides database setup, input files and a mock lookup service whose
// answers are derived from the queried address.

use std::io::Write;
use std::path::PathBuf;

use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use ip_warehouse::{run_migrations, Address, Config, GeoRecord, LogFormat, LogLevel};

/// Path the mock lookup service answers on.
pub const LOOKUP_PATH: &str = "/service/getIpInfo.php";

/// Creates a test database pool with migrations applied.
/// Uses an in-memory database limited to one connection.
#[allow(dead_code)] // Used by other test files
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Writes lines to a temporary input file.
#[allow(dead_code)]
pub fn write_segments_to_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    for line in lines {
        writeln!(file, "{}", line).expect("Failed to write segment");
    }
    file.flush().expect("Failed to flush file");
    file
}

/// A config pointing at the mock service, with quiet logging.
#[allow(dead_code)]
pub fn create_test_config(ip_file: PathBuf, db_path: PathBuf, server: &MockServer) -> Config {
    Config {
        ip_file,
        url_base: format!("{}{}?ip=", server.uri(), LOOKUP_PATH),
        workers: 3,
        db_path,
        timeout_seconds: 5,
        log_level: LogLevel::Error,
        log_format: LogFormat::Plain,
        ..Default::default()
    }
}

/// A record the way the lookup client decodes one with the given ids.
#[allow(dead_code)]
pub fn record(country_id: &str, region_id: i64) -> GeoRecord {
    GeoRecord {
        country: format!("country-{}", country_id),
        country_id: country_id.to_string(),
        area: "-".to_string(),
        area_id: 0,
        region: format!("region-{}", region_id),
        region_id,
        city: "-".to_string(),
        city_id: 0,
        isp: "isp".to_string(),
        isp_id: 100017,
    }
}

/// Mock lookup service: the region changes every `block` addresses and the
/// addresses in `failing` answer with HTTP 500.
pub struct RegionService {
    pub block: u32,
    pub failing: Vec<Address>,
}

impl Respond for RegionService {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let address = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "ip")
            .and_then(|(_, value)| value.parse::<Address>().ok());
        let Some(address) = address else {
            return ResponseTemplate::new(400);
        };
        if self.failing.contains(&address) {
            return ResponseTemplate::new(500);
        }

        let region = address.value() / self.block;
        ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {
                "country": "country-CN",
                "country_id": "CN",
                "area": "",
                "area_id": "",
                "region": format!("region-{}", region),
                "region_id": region.to_string(),
                "city": "",
                "city_id": "",
                "isp": "isp",
                "isp_id": "100017"
            }
        }))
    }
}

/// Starts a mock lookup service.
#[allow(dead_code)]
pub async fn start_region_service(block: u32, failing: Vec<Address>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LOOKUP_PATH))
        .respond_with(RegionService { block, failing })
        .mount(&server)
        .await;
    server
}
