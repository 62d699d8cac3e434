use indirect_image::config::{parse_config, Config};
use indirect_image::extract::{find, parse_document, ContextDocument, RuleSet, SelectorRule};
use indirect_image::url::SchemePolicy;
use indirect_image::{
    ExtractionResult, Extractor, LookupFlags, PipelineCoordinator, RequestEpoch, ReqwestTransport,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Coordinator = PipelineCoordinator<ReqwestTransport, SchemePolicy>;
type Outcome = oneshot::Receiver<Option<ExtractionResult>>;

fn context() -> ContextDocument {
    ContextDocument::new(Url::parse("http://example.com/gallery").unwrap())
}

fn coordinator() -> Coordinator {
    PipelineCoordinator::from_config(&Config::default()).expect("Failed to build coordinator")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

/// Starts a lookup and returns the channel its completion arrives on
fn lookup(
    coordinator: &Coordinator,
    url: &str,
    epoch: &RequestEpoch,
    extractor: Arc<dyn Extractor>,
) -> Outcome {
    let (tx, rx) = oneshot::channel();
    let accepted = coordinator.start(
        context(),
        url,
        LookupFlags::NONE,
        epoch.advance(),
        move |result| {
            let _ = tx.send(result);
        },
        extractor,
    );
    assert!(accepted.is_some(), "lookup of {} was rejected", url);
    rx
}

async fn outcome(rx: Outcome) -> Result<Option<ExtractionResult>, oneshot::error::RecvError> {
    tokio::time::timeout(Duration::from_secs(10), rx)
        .await
        .expect("lookup did not finish in time")
}

#[tokio::test]
async fn test_og_image_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/post/1"))
        .and(header("accept", "text/html"))
        .respond_with(html(
            r#"<html><head><title>Post</title>
            <meta property="og:image" content="http://img/1.jpg">
            </head><body><img class="main" src="/other.jpg"></body></html>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let rule = SelectorRule::new(["meta[property='og:image']", "img.main"]);
    let rx = lookup(
        &coordinator(),
        &format!("{}/post/1", mock_server.uri()),
        &RequestEpoch::new(),
        Arc::new(rule),
    );

    assert_eq!(
        outcome(rx).await.unwrap(),
        Some(ExtractionResult::Single("http://img/1.jpg".to_string()))
    );
}

#[tokio::test]
async fn test_extractor_result_is_delivered() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html("<html><body><p>anything</p></body></html>"))
        .mount(&mock_server)
        .await;

    let page = format!("{}/page", mock_server.uri());
    let expected_page = page.clone();
    let extractor = move |_: &ContextDocument, url: &Url, _: LookupFlags, text: &str| {
        assert_eq!(url.as_str(), expected_page);
        assert!(text.contains("anything"));
        Some(ExtractionResult::Single("X".to_string()))
    };

    let rx = lookup(&coordinator(), &page, &RequestEpoch::new(), Arc::new(extractor));

    assert_eq!(
        outcome(rx).await.unwrap(),
        Some(ExtractionResult::Single("X".to_string()))
    );
}

#[tokio::test]
async fn test_not_found_yields_none_without_extraction() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_raw("<p>missing</p>", "text/html"))
        .mount(&mock_server)
        .await;

    let extractor =
        |_: &ContextDocument, _: &Url, _: LookupFlags, _: &str| -> Option<ExtractionResult> {
            panic!("extractor must not run for a 404");
        };

    let rx = lookup(
        &coordinator(),
        &format!("{}/gone", mock_server.uri()),
        &RequestEpoch::new(),
        Arc::new(extractor),
    );

    assert_eq!(outcome(rx).await.unwrap(), None);
}

#[tokio::test]
async fn test_image_response_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/photo.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(vec![0x89u8, b'P', b'N', b'G', 0x0d, 0x0a], "image/png"),
        )
        .mount(&mock_server)
        .await;

    let rx = lookup(
        &coordinator(),
        &format!("{}/photo.png", mock_server.uri()),
        &RequestEpoch::new(),
        Arc::new(SelectorRule::new(["img"])),
    );

    assert_eq!(outcome(rx).await.unwrap(), None);
}

#[tokio::test]
async fn test_json_response_reaches_extractor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/item"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                r#"{"gifItem":{"mp4Url":"https://cdn.example/v.mp4"}}"#,
                "application/json",
            ),
        )
        .mount(&mock_server)
        .await;

    let extractor =
        |_: &ContextDocument, _: &Url, _: LookupFlags, text: &str| -> Option<ExtractionResult> {
            let start = text.find("https://")?;
            let end = start + text[start..].find('"')?;
            Some(ExtractionResult::Single(text[start..end].to_string()))
        };

    let rx = lookup(
        &coordinator(),
        &format!("{}/api/item", mock_server.uri()),
        &RequestEpoch::new(),
        Arc::new(extractor),
    );

    assert_eq!(
        outcome(rx).await.unwrap(),
        Some(ExtractionResult::Single("https://cdn.example/v.mp4".to_string()))
    );
}

#[tokio::test]
async fn test_empty_body_yields_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&mock_server)
        .await;

    let rx = lookup(
        &coordinator(),
        &format!("{}/empty", mock_server.uri()),
        &RequestEpoch::new(),
        Arc::new(SelectorRule::new(["img"])),
    );

    assert_eq!(outcome(rx).await.unwrap(), None);
}

#[tokio::test]
async fn test_noscript_image_is_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/lazy"))
        .respond_with(html(
            r#"<html><body><div><noscript><img src="https://cdn.example/y.jpg"/></noscript></div></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let rx = lookup(
        &coordinator(),
        &format!("{}/lazy", mock_server.uri()),
        &RequestEpoch::new(),
        Arc::new(SelectorRule::new(["img"])),
    );

    assert_eq!(
        outcome(rx).await.unwrap(),
        Some(ExtractionResult::Single("https://cdn.example/y.jpg".to_string()))
    );
}

#[tokio::test]
async fn test_latin1_page_is_decoded_by_charset() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/latin1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"<html><body><img src=\"/caf\xE9.jpg\"></body></html>".to_vec(),
            "text/html; charset=ISO-8859-1",
        ))
        .mount(&mock_server)
        .await;

    let extractor =
        |doc: &ContextDocument, url: &Url, _: LookupFlags, text: &str| -> Option<ExtractionResult> {
            let parsed = parse_document(doc, url, text);
            find(parsed.body(), &["img"]).map(ExtractionResult::Single)
        };

    let rx = lookup(
        &coordinator(),
        &format!("{}/latin1", mock_server.uri()),
        &RequestEpoch::new(),
        Arc::new(extractor),
    );

    assert_eq!(
        outcome(rx).await.unwrap(),
        Some(ExtractionResult::Single("/caf\u{e9}.jpg".to_string()))
    );
}

#[tokio::test]
async fn test_superseded_lookup_never_completes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            html("<html><body><img src=\"/slow.jpg\"></body></html>")
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(html("<html><body><img src=\"/fast.jpg\"></body></html>"))
        .mount(&mock_server)
        .await;

    let coordinator = coordinator();
    let epoch = RequestEpoch::new();
    let rule: Arc<dyn Extractor> = Arc::new(SelectorRule::new(["img"]));

    let slow = lookup(
        &coordinator,
        &format!("{}/slow", mock_server.uri()),
        &epoch,
        rule.clone(),
    );
    let fast = lookup(
        &coordinator,
        &format!("{}/fast", mock_server.uri()),
        &epoch,
        rule,
    );

    assert_eq!(
        outcome(fast).await.unwrap(),
        Some(ExtractionResult::Single(format!("{}/fast.jpg", mock_server.uri())))
    );
    // Dropped uncalled once the slow response arrives and finds itself stale
    assert!(outcome(slow).await.is_err());
}

#[tokio::test]
async fn test_connection_failure_yields_none() {
    // Grab a free port, then close the listener so nothing is there
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let rx = lookup(
        &coordinator(),
        &format!("http://127.0.0.1:{}/post/1", port),
        &RequestEpoch::new(),
        Arc::new(SelectorRule::new(["img"])),
    );

    assert_eq!(outcome(rx).await.unwrap(), None);
}

#[tokio::test]
async fn test_disallowed_protocol_is_rejected() {
    let coordinator = coordinator();
    let epoch = RequestEpoch::new();

    let accepted = coordinator.start(
        context(),
        "ftp://example.com/pic.jpg",
        LookupFlags::NONE,
        epoch.token(),
        |_| panic!("must not be called"),
        Arc::new(SelectorRule::new(["img"])),
    );

    assert!(accepted.is_none());
}

#[tokio::test]
async fn test_config_rules_end_to_end() {
    let mock_server = MockServer::start().await;
    let host = Url::parse(&mock_server.uri())
        .unwrap()
        .host_str()
        .unwrap()
        .to_string();

    Mock::given(method("GET"))
        .and(path("/photo/7"))
        .respond_with(html(
            r#"<html><head><meta property="og:image" content="/thumb.jpg"></head>
            <body><a class="download" href="/full/7.jpg">full size</a></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let config = parse_config(&format!(
        r#"
[[rule]]
domain = "{}"
selectors = ["a.download", "meta[property='og:image']"]
"#,
        host
    ))
    .unwrap();

    let coordinator = PipelineCoordinator::from_config(&config).unwrap();
    let epoch = RequestEpoch::new();
    let (tx, rx) = oneshot::channel();

    let _ = coordinator.start(
        context(),
        &format!("{}/photo/7", mock_server.uri()),
        LookupFlags::ALL_CANDIDATES,
        epoch.token(),
        move |result| {
            let _ = tx.send(result);
        },
        Arc::new(RuleSet::from_config(&config.rules)),
    );

    assert_eq!(
        outcome(rx).await.unwrap(),
        Some(ExtractionResult::Multiple(vec![
            format!("{}/full/7.jpg", mock_server.uri()),
            format!("{}/thumb.jpg", mock_server.uri()),
        ]))
    );
}
