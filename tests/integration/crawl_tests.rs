//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and test
//! complete harvest runs end-to-end against a temporary output directory.

use doc_harvest::config::Config;
use doc_harvest::{HarvestError, Harvester};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with short timeouts
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.http.connect_timeout_secs = 2;
    config.http.read_timeout_secs = 5;
    config.http.write_timeout_secs = 5;
    config
}

async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_bytes(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body.to_vec())
                .insert_header("content-type", "application/octet-stream"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_document_harvest_mirrors_url_paths() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    mount_html(
        &server,
        "/docs/",
        r##"<html><body><nav>
            <a href="setup">Setup</a>
            <a href="editor/intro">Intro</a>
            <a href="/docs/setup#install">Setup again</a>
            <a href="#top">Top</a>
            <a href="https://elsewhere.example/docs/x">External</a>
            <a href="/docs/api/reference">API</a>
        </nav></body></html>"##,
    )
    .await;
    mount_html(
        &server,
        "/docs/setup",
        r#"<html><head><title>Setup | Docs</title></head><body>
            <article><h1>Setup</h1><p>Install   the tool.</p><ul><li>step one</li></ul>
            <pre>run --now</pre></article>
        </body></html>"#,
    )
    .await;
    mount_html(
        &server,
        "/docs/editor/intro",
        r#"<html><body><main><h2>Basics</h2><p>Text</p></main></body></html>"#,
    )
    .await;

    let seed = format!("{}/docs/", base);
    let mut harvester = Harvester::new(create_test_config(), &seed, out.path()).unwrap();
    let report = harvester.run_documents().await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed(), 0);
    assert!(report.bytes_written > 0);

    let setup = std::fs::read_to_string(out.path().join("docs/setup.txt")).unwrap();
    assert!(setup.starts_with("Setup\n=====\n"));
    assert!(setup.contains("Install the tool."));
    assert!(setup.contains("• step one"));
    assert!(setup.contains("[code]\nrun --now\n[/code]"));

    let intro = std::fs::read_to_string(out.path().join("docs/editor/intro.txt")).unwrap();
    assert!(intro.contains("Basics\n------"));

    // seed + two admitted links
    assert_eq!(harvester.visited().len(), 3);
}

#[tokio::test]
async fn test_same_title_documents_get_numbered() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    mount_html(
        &server,
        "/",
        r#"<a href="/docs?lang=en">English</a><a href="/docs?lang=fr">French</a>"#,
    )
    .await;
    mount_html(
        &server,
        "/docs",
        "<html><body><h1>Introduction</h1><p>Welcome</p></body></html>",
    )
    .await;

    let mut harvester = Harvester::new(create_test_config(), &base, out.path()).unwrap();
    let report = harvester.run_documents().await.unwrap();

    assert_eq!(report.succeeded, 2);
    assert!(out.path().join("Introduction.txt").exists());
    assert!(out.path().join("Introduction_1.txt").exists());
}

#[tokio::test]
async fn test_existing_files_are_never_overwritten() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    std::fs::create_dir_all(out.path().join("guide")).unwrap();
    std::fs::write(out.path().join("guide/start.txt"), "old").unwrap();

    mount_html(&server, "/guide/", r#"<a href="start">Start</a>"#).await;
    mount_html(&server, "/guide/start", "<article><p>new</p></article>").await;

    let seed = format!("{}/guide/", base);
    let mut harvester = Harvester::new(create_test_config(), &seed, out.path()).unwrap();
    harvester.run_documents().await.unwrap();

    assert_eq!(std::fs::read_to_string(out.path().join("guide/start.txt")).unwrap(), "old");
    assert_eq!(std::fs::read_to_string(out.path().join("guide/start_1.txt")).unwrap(), "new");
}

#[tokio::test]
async fn test_failed_items_are_recorded_and_run_continues() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    mount_html(
        &server,
        "/docs/",
        r#"<a href="missing">Missing</a><a href="broken">Broken</a><a href="ok">Ok</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_html(&server, "/docs/ok", "<article><p>fine</p></article>").await;

    let seed = format!("{}/docs/", base);
    let mut harvester = Harvester::new(create_test_config(), &seed, out.path()).unwrap();
    let report = harvester.run_documents().await.unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed(), 2);

    let failed: Vec<_> = report.failures.iter().map(|f| f.identifier.as_str()).collect();
    assert!(failed.contains(&format!("{}/docs/missing", base).as_str()));
    assert!(failed.contains(&format!("{}/docs/broken", base).as_str()));
    assert!(report.failures.iter().any(|f| f.reason.contains("404")));
    assert!(out.path().join("docs/ok.txt").exists());
}

#[tokio::test]
async fn test_unreachable_seed_is_fatal() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/docs/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let seed = format!("{}/docs/", server.uri());
    let mut harvester = Harvester::new(create_test_config(), &seed, out.path()).unwrap();
    let result = harvester.run_documents().await;

    assert!(matches!(result, Err(HarvestError::SeedUnreachable { .. })));
}

#[tokio::test]
async fn test_media_harvest_scans_then_downloads() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    mount_html(
        &server,
        "/talks/",
        &format!(
            r#"<html><body>
                <audio src="/assets/a.mp3"></audio>
                <script>var playlist = ["{base}/assets/a.mp3"];</script>
                <a href="more">More talks</a>
            </body></html>"#
        ),
    )
    .await;
    mount_html(
        &server,
        "/talks/more",
        r#"<html><body>
            <video><source src="clip.webm"></video>
            <div data-src="/assets/a.mp3"></div>
        </body></html>"#,
    )
    .await;
    mount_bytes(&server, "/assets/a.mp3", b"ID3-audio-bytes").await;
    mount_bytes(&server, "/talks/clip.webm", b"webm-video").await;

    let seed = format!("{}/talks/", base);
    let mut harvester = Harvester::new(create_test_config(), &seed, out.path()).unwrap();
    let report = harvester.run_media().await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.bytes_written, 15 + 10);

    // first source page wins the directory
    assert_eq!(
        std::fs::read(out.path().join("talks/a.mp4")).unwrap(),
        b"ID3-audio-bytes"
    );
    assert_eq!(
        std::fs::read(out.path().join("talks/more/clip.mp4")).unwrap(),
        b"webm-video"
    );
}

#[tokio::test]
async fn test_failed_download_leaves_no_file() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    mount_html(&server, "/", r#"<video src="/gone.mp4"></video>"#).await;

    let mut harvester = Harvester::new(create_test_config(), &base, out.path()).unwrap();
    let report = harvester.run_media().await.unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.failed(), 1);
    assert!(!out.path().join("videos/gone.mp4").exists());
}

#[tokio::test]
async fn test_concurrent_document_harvest() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    let links: String = (0..6)
        .map(|i| format!(r#"<a href="/pages/p{i}">Page {i}</a>"#))
        .collect();
    mount_html(&server, "/", &links).await;
    for i in 0..6 {
        mount_html(
            &server,
            &format!("/pages/p{i}"),
            &format!("<article><p>page {i}</p></article>"),
        )
        .await;
    }

    let mut config = create_test_config();
    config.pipeline.max_concurrent_items = 4;
    let mut harvester = Harvester::new(config, &base, out.path()).unwrap();
    let report = harvester.run_documents().await.unwrap();

    assert_eq!(report.succeeded, 6);
    for i in 0..6 {
        let text = std::fs::read_to_string(out.path().join(format!("pages/p{i}.txt"))).unwrap();
        assert_eq!(text, format!("page {i}"));
    }
}

#[tokio::test]
async fn test_timed_out_page_is_recorded_and_run_continues() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    mount_html(
        &server,
        "/docs/",
        r#"<a href="slow">Slow</a><a href="fast">Fast</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<article><p>late</p></article>")
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&server)
        .await;
    mount_html(&server, "/docs/fast", "<article><p>quick</p></article>").await;

    let mut config = Config::default();
    config.http.connect_timeout_secs = 1;
    config.http.read_timeout_secs = 1;
    config.http.write_timeout_secs = 1;

    let seed = format!("{}/docs/", base);
    let mut harvester = Harvester::new(config, &seed, out.path()).unwrap();
    let report = harvester.run_documents().await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.failures[0].identifier, format!("{}/docs/slow", base));
    assert!(report.failures[0].reason.to_lowercase().contains("timeout"));
    assert!(!out.path().join("docs/slow.txt").exists());
    assert_eq!(
        std::fs::read_to_string(out.path().join("docs/fast.txt")).unwrap(),
        "quick"
    );
}

#[tokio::test]
async fn test_links_resolve_against_redirected_seed() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/docs/"))
        .mount(&server)
        .await;
    mount_html(&server, "/docs/", r#"<a href="setup">Setup</a>"#).await;
    mount_html(&server, "/docs/setup", "<article><p>steps</p></article>").await;

    let seed = format!("{}/docs", base);
    let mut harvester = Harvester::new(create_test_config(), &seed, out.path()).unwrap();
    let report = harvester.run_documents().await.unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.succeeded, 1);
    assert!(out.path().join("docs/setup.txt").exists());
}
