//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and exercise the
//! real HTTP fetcher, robots.txt oracle, HTML extractor and file store,
//! up to a full organization crawl.

use orgcrawl::checkpoint;
use orgcrawl::config::{parse_config, Config, RateLimitConfig, UserAgentConfig};
use orgcrawl::crawler::{
    crawl, crawl_organization, ContentExtractor, CrawlOptions, FetchErrorKind, Fetcher, HtmlExtractor,
    HttpFetcher, LinkKind, PermissionOracle,
};
use orgcrawl::output::{organization_log_layer, OrganizationLog};
use orgcrawl::robots::RobotsOracle;
use orgcrawl::CrawlState;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tracing_subscriber::prelude::*;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

fn create_fetcher(max_retries: u32) -> HttpFetcher {
    let rate_limiting = RateLimitConfig {
        delay_between_requests: 0,
        delay_on_error: 0,
        timeout: 5,
        max_retries,
        retry_backoff: 10,
    };
    HttpFetcher::from_config(&create_user_agent(), &rate_limiting).unwrap()
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

/// Creates a test configuration crawling `seed` with output under `dir`
fn create_test_config(seed: &str, dir: &Path) -> Config {
    parse_config(&format!(
        r#"
[crawler]
max-depth = 2
max-pages = 20

[rate-limiting]
delay-between-requests = 0
delay-on-error = 0
timeout = 5
max-retries = 0

[session]
checkpoint-dir = "{checkpoints}"
checkpoint-interval = 2

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
data-dir = "{data}"

[filters]
exclusions = ["/logout"]

[[organization]]
name = "Mock Org"
seeds = ["{seed}"]
"#,
        checkpoints = dir.join("checkpoints").display(),
        data = dir.join("data").display(),
        seed = seed,
    ))
    .unwrap()
}

/// The single session directory the file store created
fn session_dir(dir: &Path) -> PathBuf {
    let org_dir = dir.join("data").join("raw").join("Mock_Org");
    let mut sessions: Vec<PathBuf> = fs::read_dir(&org_dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(sessions.len(), 1, "expected one session in {}", org_dir.display());
    sessions.remove(0)
}

async fn mount_site(server: &MockServer) {
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /admin"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="{base}/page1">Page 1</a>
            <a href="/page2/">Page 2</a>
            <a href="/admin">Admin</a>
            <a href="/logout">Log out</a>
            <a href="/files/annual-report.pdf">Annual report</a>
            <a href="https://elsewhere.example/">Partner</a>
            </body></html>"#
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(
            r#"<html><head><title>Page 1</title></head><body><a href="/">Home</a></body></html>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html(
            r#"<html><head><title>Page 2</title></head><body>Content 2</body></html>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/annual-report.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4 report".to_vec(), "application/pdf"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_http_fetcher_returns_body_and_charset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(vec![b'c', 0xe9], "text/html; charset=ISO-8859-1"),
        )
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/latin", server.uri())).unwrap();
    let content = create_fetcher(0).fetch(&url).await.unwrap();

    assert_eq!(content.status, 200);
    assert!(content.is_html());
    assert_eq!(content.encoding, "iso-8859-1");
    assert_eq!(content.text(), "cé");
}

#[tokio::test]
async fn test_http_fetcher_detects_undeclared_encoding() {
    let text = "<p>Les élèves ont été très contents de la fête à l'école. \
                Où êtes-vous allés après le déjeuner? Ça a été une journée très réussie, \
                déjà préparée par les bénévoles de l'association.</p>";
    let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(text);

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/legacy"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(bytes.into_owned(), "text/html"))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/legacy", server.uri())).unwrap();
    let content = create_fetcher(0).fetch(&url).await.unwrap();

    assert_ne!(content.encoding, "utf-8");
    assert_eq!(content.text(), text);
}

#[tokio::test]
async fn test_http_fetcher_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(html("<p>finally</p>"))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/flaky", server.uri())).unwrap();
    let content = create_fetcher(2).fetch(&url).await.unwrap();
    assert_eq!(content.text(), "<p>finally</p>");
}

#[tokio::test]
async fn test_http_fetcher_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/down", server.uri())).unwrap();
    let err = create_fetcher(1).fetch(&url).await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Status(500));
    assert!(err.retryable);
}

#[tokio::test]
async fn test_http_fetcher_does_not_retry_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
    let err = create_fetcher(3).fetch(&url).await.unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Status(404));
    assert!(!err.retryable);
}

#[tokio::test]
async fn test_robots_oracle_caches_and_reports_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /admin\nCrawl-delay: 2"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = create_fetcher(0);
    let mut oracle = RobotsOracle::new(fetcher.client().clone(), "TestBot");
    let page = Url::parse(&format!("{}/page", server.uri())).unwrap();
    let admin = Url::parse(&format!("{}/admin/users", server.uri())).unwrap();

    assert!(oracle.can_fetch(&page).await);
    assert!(!oracle.can_fetch(&admin).await);
    assert_eq!(oracle.crawl_delay(&page), Some(Duration::from_secs(2)));
}

#[tokio::test]
async fn test_robots_oracle_allows_all_when_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut oracle = RobotsOracle::new(create_fetcher(0).client().clone(), "TestBot");
    let admin = Url::parse(&format!("{}/admin", server.uri())).unwrap();

    assert!(oracle.can_fetch(&admin).await);
    assert_eq!(oracle.crawl_delay(&admin), None);
}

#[tokio::test]
async fn test_html_extractor_on_fetched_page() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let url = Url::parse(&format!("{}/", server.uri())).unwrap();
    let content = create_fetcher(0).fetch(&url).await.unwrap();
    let host = url.host_str().unwrap().to_string();
    let extractor = HtmlExtractor::new(host);
    let html = content.text();

    let links = extractor.extract_links(&html, &content.url);
    assert_eq!(links.len(), 6);
    assert_eq!(
        links.iter().filter(|l| l.kind == LinkKind::External).count(),
        1
    );

    let documents =
        extractor.extract_document_links(&html, &content.url, &[".pdf".to_string()]);
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].doc_type, "pdf");

    assert_eq!(extractor.extract_metadata(&html).title.as_deref(), Some("Home"));
}

#[tokio::test]
async fn test_full_crawl_single_organization() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", server.uri()), dir.path());
    let report = crawl_organization(
        &config,
        &config.organizations[0],
        &CrawlOptions::default(),
        Arc::new(AtomicBool::new(false)),
    )
    .await
    .unwrap();

    assert_eq!(report.state, CrawlState::Completed);
    assert_eq!(report.error, None);
    assert_eq!(report.stats.pages_saved, 3);
    assert_eq!(report.stats.documents_saved, 1);
    assert_eq!(report.stats.robots_denied, 1);
    assert_eq!(report.stats.requests_failed, 0);
    assert_eq!(report.pending, 0);

    let session = session_dir(dir.path());
    assert_eq!(fs::read_dir(session.join("pages")).unwrap().count(), 3);
    assert_eq!(fs::read_dir(session.join("documents")).unwrap().count(), 1);
    assert!(session.join("index.sqlite").exists());

    let links: serde_json::Value =
        serde_json::from_slice(&fs::read(session.join("links.json")).unwrap()).unwrap();
    assert!(links.as_array().unwrap().len() >= 6);

    let metadata: serde_json::Value =
        serde_json::from_slice(&fs::read(session.join("metadata.json")).unwrap()).unwrap();
    assert_eq!(metadata["report"]["state"], "completed");

    let saved = checkpoint::load(&dir.path().join("checkpoints/Mock_Org.checkpoint.json")).unwrap();
    assert!(saved.frontier.pending.is_empty());
    // /, /page1, /page2, /admin (denied) and the report
    assert_eq!(saved.frontier.visited.len(), 5);
    assert!(saved
        .frontier
        .visited
        .iter()
        .all(|url| !url.as_str().contains("logout")));
}

#[tokio::test]
async fn test_corrupt_checkpoint_fails_unless_fresh() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/", server.uri()), dir.path());
    let checkpoint_file = dir.path().join("checkpoints/Mock_Org.checkpoint.json");
    fs::create_dir_all(checkpoint_file.parent().unwrap()).unwrap();
    fs::write(&checkpoint_file, "garbage").unwrap();

    let resume = CrawlOptions {
        resume: true,
        ..Default::default()
    };
    let report = crawl_organization(
        &config,
        &config.organizations[0],
        &resume,
        Arc::new(AtomicBool::new(false)),
    )
    .await
    .unwrap();
    assert_eq!(report.state, CrawlState::Failed);
    assert_eq!(report.stats.requests_attempted, 0);

    let fresh = CrawlOptions {
        fresh: true,
        ..Default::default()
    };
    let report = crawl_organization(
        &config,
        &config.organizations[0],
        &fresh,
        Arc::new(AtomicBool::new(false)),
    )
    .await
    .unwrap();
    assert_eq!(report.state, CrawlState::Completed);
    assert!(checkpoint::load(&checkpoint_file).is_ok());
}

#[tokio::test]
async fn test_crawl_writes_organization_log_file() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&format!("{}/", server.uri()), dir.path());
    config.logging.file_output = true;
    config.logging.log_dir = dir.path().join("logs").display().to_string();

    let log = OrganizationLog::new();
    let subscriber = tracing_subscriber::registry().with(organization_log_layer(log.clone()));
    let _guard = tracing::subscriber::set_default(subscriber);

    let options = CrawlOptions {
        log_file: Some(log.clone()),
        ..Default::default()
    };
    let reports = crawl(&config, &options, Arc::new(AtomicBool::new(false))).await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].state, CrawlState::Completed);
    assert!(!log.is_active());

    let files: Vec<PathBuf> = fs::read_dir(dir.path().join("logs"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("Mock_Org_"));

    let contents = fs::read_to_string(&files[0]).unwrap();
    assert!(contents.contains("DEBUG"));
    assert!(contents.contains("/page1"));
    assert!(contents.contains("Blocked by robots.txt"));
}
