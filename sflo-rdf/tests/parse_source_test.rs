//! Integration tests for resolving and parsing file, URL and inline sources

use pretty_assertions::assert_eq;
use serde_json::json;
use sflo_rdf::parse::parse_resolved;
use sflo_rdf::{
    debase_iri, detect_syntax, normalize_base, parse_rdf_source, parse_rdf_source_with, ParseFailure,
    ResolvedSource, ResolverConfig, SourceContent, SourceDescriptor, SourceFailure, Syntax, Term,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Syntax detection
// =============================================================================

#[test]
fn test_detection_table() {
    assert_eq!(detect_syntax(None, Some("data.ttl"), None), Syntax::Turtle);
    assert_eq!(detect_syntax(None, Some("data.unknown"), Some("text/turtle")), Syntax::Turtle);
    assert_eq!(detect_syntax(None, Some("data.unknown"), None), Syntax::Jsonld);
}

// =============================================================================
// Relative resolution vs. debasing
// =============================================================================

#[test]
fn test_stream_relative_reference_uses_rfc3986() {
    let graph = parse_resolved(ResolvedSource {
        content: SourceContent::Text("<http://example.org/s> <http://example.org/p> <rel> .".to_string()),
        base_iri: "http://example.org/doc".to_string(),
        syntax: Syntax::Turtle,
    })
    .unwrap();

    assert_eq!(graph.quads[0].object, Term::iri("http://example.org/rel"));

    // A prefix strip of the same base never yields the relative form back.
    let base = normalize_base("http://example.org/doc");
    assert_eq!(debase_iri("http://example.org/rel", &base), "http://example.org/rel");
}

// =============================================================================
// Inline sources
// =============================================================================

#[tokio::test]
async fn test_inline_sources_get_distinct_bases() {
    let doc = json!({"@id": "#a", "http://ex.org/p": "v"});
    let first = parse_rdf_source(SourceDescriptor::inline(doc.clone())).await.unwrap();
    let second = parse_rdf_source(SourceDescriptor::inline(doc)).await.unwrap();

    assert_ne!(first.base_iri, second.base_iri);
    assert_eq!(first.quads[0].subject, Term::iri(format!("{}#a", first.base_iri)));
    assert_eq!(second.quads[0].subject, Term::iri(format!("{}#a", second.base_iri)));
}

#[tokio::test]
async fn test_inline_json_string() {
    let source: SourceDescriptor = serde_json::from_value(json!({
        "kind": "inline",
        "syntax": "jsonld",
        "jsonld": "{\"@id\": \"http://ex.org/a\", \"http://ex.org/p\": 1}"
    }))
    .unwrap();

    let graph = parse_rdf_source(source).await.unwrap();
    assert_eq!(graph.syntax, Syntax::Jsonld);
    assert_eq!(graph.len(), 1);
}

#[tokio::test]
async fn test_inline_invalid_json_is_parse_error() {
    let err = parse_rdf_source(SourceDescriptor::inline(json!("{not json")))
        .await
        .unwrap_err();
    assert!(matches!(err, ParseFailure::Parse(e) if e.syntax == Syntax::Jsonld));
}

// =============================================================================
// File sources
// =============================================================================

#[tokio::test]
async fn test_file_base_is_file_url_of_absolute_path() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("node_ref.ttl");
    std::fs::write(
        &file,
        "@prefix dc: <http://purl.org/dc/terms/> .\n<> dc:hasPart <#section1>, <../sibling/x> .\n",
    )
    .unwrap();

    let graph = parse_rdf_source(SourceDescriptor::file(&file)).await.unwrap();
    let expected_base = Url::from_file_path(&file).unwrap().to_string();
    let parent = Url::from_file_path(dir.path().parent().unwrap()).unwrap().to_string();

    assert_eq!(graph.syntax, Syntax::Turtle);
    assert_eq!(graph.base_iri, expected_base);
    assert_eq!(graph.quads[0].subject, Term::iri(&expected_base));
    assert_eq!(graph.quads[0].object, Term::iri(format!("{expected_base}#section1")));
    assert_eq!(
        graph.quads[1].object,
        Term::iri(format!("{}/sibling/x", parent.trim_end_matches('/')))
    );
}

#[tokio::test]
async fn test_file_with_unknown_extension_defaults_to_jsonld() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("doc.data");
    std::fs::write(&file, r##"{"@id": "#me", "http://xmlns.com/foaf/0.1/name": "Me"}"##).unwrap();

    let graph = parse_rdf_source(SourceDescriptor::file(&file)).await.unwrap();
    assert_eq!(graph.syntax, Syntax::Jsonld);
    assert_eq!(graph.quads[0].object, Term::string("Me"));
}

#[tokio::test]
async fn test_file_syntax_hint_wins() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("doc.ttl");
    std::fs::write(&file, "<http://ex.org/s> <http://ex.org/p> <http://ex.org/o> <http://ex.org/g> .\n").unwrap();

    let graph = parse_rdf_source(SourceDescriptor::file(&file).with_syntax(Syntax::Nquads))
        .await
        .unwrap();
    assert_eq!(graph.syntax, Syntax::Nquads);
    assert_eq!(graph.len(), 1);
}

#[tokio::test]
async fn test_missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("missing.ttl");

    let err = parse_rdf_source(SourceDescriptor::file(&file)).await.unwrap_err();
    match err {
        ParseFailure::Source(SourceFailure::Read { path, source }) => {
            assert_eq!(path, file);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected read error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_file_parse_error_carries_position() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("bad.ttl");
    std::fs::write(&file, "<http://ex.org/s> <http://ex.org/p> <http://ex.org/o> .\n<http://ex.org/s> <http://ex.org/p> \n").unwrap();

    let err = parse_rdf_source(SourceDescriptor::file(&file)).await.unwrap_err();
    match err {
        ParseFailure::Parse(e) => {
            assert_eq!(e.syntax, Syntax::Turtle);
            assert!(e.position.is_some());
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

// =============================================================================
// URL sources
// =============================================================================

#[tokio::test]
async fn test_url_base_is_url_as_given() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mesh/doc"))
        .and(header_exists("accept"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<> <http://ex.org/p> <part> .", "text/turtle"))
        .mount(&server)
        .await;

    let url = format!("{}/mesh/doc", server.uri());
    let graph = parse_rdf_source(SourceDescriptor::url(&url)).await.unwrap();

    assert_eq!(graph.syntax, Syntax::Turtle);
    assert_eq!(graph.base_iri, url);
    assert_eq!(graph.quads[0].subject, Term::iri(&url));
    assert_eq!(graph.quads[0].object, Term::iri(format!("{}/mesh/part", server.uri())));
}

#[tokio::test]
async fn test_url_base_survives_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mesh/doc"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/moved/elsewhere/doc"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/moved/elsewhere/doc"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<> <http://ex.org/p> <rel> .", "text/turtle"))
        .mount(&server)
        .await;

    let url = format!("{}/mesh/doc", server.uri());
    let graph = parse_rdf_source(SourceDescriptor::url(&url)).await.unwrap();

    assert_eq!(graph.syntax, Syntax::Turtle);
    assert_eq!(graph.base_iri, url);
    assert_eq!(graph.quads[0].subject, Term::iri(&url));
    assert_eq!(graph.quads[0].object, Term::iri(format!("{}/mesh/rel", server.uri())));
}

#[tokio::test]
async fn test_url_extension_wins_over_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc.nt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<http://ex.org/s> <http://ex.org/p> \"v\" .\n", "text/plain"),
        )
        .mount(&server)
        .await;

    let graph = parse_rdf_source(SourceDescriptor::url(format!("{}/doc.nt", server.uri())))
        .await
        .unwrap();
    assert_eq!(graph.syntax, Syntax::Ntriples);
}

#[tokio::test]
async fn test_url_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing.ttl", server.uri());
    let err = parse_rdf_source(SourceDescriptor::url(&url)).await.unwrap_err();
    match err {
        ParseFailure::Source(SourceFailure::Fetch {
            url: failed,
            status,
            reason,
        }) => {
            assert_eq!(failed, url);
            assert_eq!(status, Some(404));
            assert!(reason.contains("Not Found"), "{reason}");
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_url_timeout_has_no_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let config = ResolverConfig::default().with_fetch_timeout(Duration::from_millis(100));
    let err = parse_rdf_source_with(SourceDescriptor::url(server.uri()), &config, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ParseFailure::Source(SourceFailure::Fetch { status: None, .. })
    ));
}

#[tokio::test]
async fn test_url_fetch_is_cancellable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = parse_rdf_source_with(SourceDescriptor::url(server.uri()), &ResolverConfig::default(), Some(token))
        .await
        .unwrap_err();
    match err {
        ParseFailure::Source(SourceFailure::Fetch { status, reason, .. }) => {
            assert_eq!(status, None);
            assert_eq!(reason, "request cancelled");
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
}
