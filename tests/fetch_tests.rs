use httpmock::prelude::*;
use link_summary::{
    FetchTarget, Fetcher, FetcherConfig, SummaryError, SummaryService, OEMBED_BODY_LIMIT,
};
use url::Url;

fn permissive_fetcher() -> Fetcher {
    Fetcher::with_config(FetcherConfig {
        allow_private: true,
        ..Default::default()
    })
}

#[tokio::test]
async fn test_loopback_blocked_by_default() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET).path("/page");
        then.status(200)
            .header("content-type", "text/html")
            .body("<title>never fetched</title>");
    });

    let result = SummaryService::new().summarize(&server.url("/page")).await;

    assert!(matches!(result, Err(SummaryError::AddressBlocked(_))));
    page.assert_hits(0);
}

#[tokio::test]
async fn test_private_range_blocked_without_dns() {
    let fetcher = Fetcher::new();
    for addr in ["http://10.0.0.1/", "http://192.168.1.1/", "http://[::1]/"] {
        let url = Url::parse(addr).unwrap();
        let result = fetcher.fetch(&FetchTarget::page(&url)).await;
        assert!(
            matches!(result, Err(SummaryError::AddressBlocked(_))),
            "expected {addr} to be blocked"
        );
    }
}

#[tokio::test]
async fn test_unsupported_page_content_type_rejected() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/file.pdf");
        then.status(200)
            .header("content-type", "application/pdf")
            .body("%PDF-1.4");
    });

    let url = Url::parse(&server.url("/file.pdf")).unwrap();
    let result = permissive_fetcher().fetch(&FetchTarget::page(&url)).await;

    match result {
        Err(SummaryError::InvalidContentType(t)) => assert_eq!(t, "application/pdf"),
        other => panic!("expected content type rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_oembed_target_rejects_html() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/oembed");
        then.status(200)
            .header("content-type", "text/html")
            .body("<html></html>");
    });

    let url = Url::parse(&server.url("/oembed")).unwrap();
    let result = permissive_fetcher().fetch(&FetchTarget::oembed(&url)).await;
    assert!(matches!(result, Err(SummaryError::InvalidContentType(_))));
}

#[tokio::test]
async fn test_content_type_parameters_ignored() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/page");
        then.status(200)
            .header("content-type", "Text/HTML; charset=UTF-8")
            .body("<title>ok</title>");
    });

    let url = Url::parse(&server.url("/page")).unwrap();
    let result = permissive_fetcher()
        .fetch(&FetchTarget::page(&url))
        .await
        .unwrap();
    assert_eq!(result.media_type, "text/html");
}

#[tokio::test]
async fn test_custom_user_agent_sent() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.method(GET)
            .path("/page")
            .header("user-agent", "CustomBot/9.9");
        then.status(200)
            .header("content-type", "text/html")
            .body("<title>ok</title>");
    });

    let url = Url::parse(&server.url("/page")).unwrap();
    let target = FetchTarget::page(&url).with_user_agent(Some("CustomBot/9.9"));
    permissive_fetcher().fetch(&target).await.unwrap();
    page.assert();
}

#[tokio::test]
async fn test_fetch_json_deserializes() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/data.json");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"version":"1.0","type":"rich","html":""}"#);
    });

    let url = Url::parse(&server.url("/data.json")).unwrap();
    let doc: link_summary::OembedDocument = permissive_fetcher()
        .fetch_json(&url, None)
        .await
        .unwrap();
    assert_eq!(doc.version, "1.0");
    assert_eq!(doc.kind, "rich");
}

#[tokio::test]
async fn test_redirects_followed_per_hop() {
    let server = MockServer::start();
    let first = server.mock(|when, then| {
        when.method(GET).path("/old");
        then.status(302).header("location", "/new");
    });
    server.mock(|when, then| {
        when.method(GET).path("/new");
        then.status(200)
            .header("content-type", "text/html")
            .body("<title>moved</title>");
    });

    let url = Url::parse(&server.url("/old")).unwrap();
    let result = permissive_fetcher()
        .fetch(&FetchTarget::page(&url))
        .await
        .unwrap();

    first.assert();
    assert!(String::from_utf8_lossy(&result.body).contains("moved"));
}

#[tokio::test]
async fn test_redirect_loop_capped() {
    let server = MockServer::start();
    let hop = server.mock(|when, then| {
        when.method(GET).path("/loop");
        then.status(302).header("location", "/loop");
    });

    let url = Url::parse(&server.url("/loop")).unwrap();
    let result = permissive_fetcher().fetch(&FetchTarget::page(&url)).await;

    assert!(matches!(result, Err(SummaryError::FetchError(_))));
    hop.assert_hits(10);
}

#[tokio::test]
async fn test_body_truncated_at_ceiling_not_error() {
    let server = MockServer::start();
    let oversized = "x".repeat(OEMBED_BODY_LIMIT + 4096);
    server.mock(|when, then| {
        when.method(GET).path("/big.json");
        then.status(200)
            .header("content-type", "application/json")
            .body(oversized);
    });

    let url = Url::parse(&server.url("/big.json")).unwrap();
    let result = permissive_fetcher()
        .fetch(&FetchTarget::oembed(&url))
        .await
        .unwrap();

    assert_eq!(result.body.len(), OEMBED_BODY_LIMIT);
}

#[tokio::test]
async fn test_malformed_url_is_a_parse_error() {
    let result = SummaryService::new().summarize("not a url").await;
    assert!(matches!(result, Err(SummaryError::UrlParseError(_))));
}
