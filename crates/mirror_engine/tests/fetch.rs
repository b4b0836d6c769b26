use std::time::Duration;

use mirror_core::{InlineRun, ParagraphStyle};
use mirror_engine::{
    Converter, DocumentFetcher, FailureKind, FetchSettings, ImageStore, MarkupConverter,
    ReqwestDocumentFetcher,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCUMENT_JSON: &str = r#"{
  "documentId": "doc-1",
  "title": "Notes",
  "body": {
    "content": [
      {"sectionBreak": {"sectionStyle": {}}},
      {"paragraph": {
        "paragraphStyle": {"namedStyleType": "HEADING_2"},
        "elements": [{"textRun": {"content": "Title\n"}}]
      }},
      {"paragraph": {
        "paragraphStyle": {"namedStyleType": "NORMAL_TEXT"},
        "elements": [
          {"textRun": {"content": "See "}},
          {"textRun": {"content": " docs ", "textStyle": {"link": {"url": "https://x"}}}},
          {"inlineObjectElement": {"inlineObjectId": "kix.1"}},
          {"textRun": {"content": "\n"}}
        ]
      }}
    ]
  },
  "inlineObjects": {
    "kix.1": {"inlineObjectProperties": {"embeddedObject": {
      "imageProperties": {"contentUri": "https://lh3.example/img1"}
    }}}
  }
}"#;

fn fetcher_for(server: &MockServer, settings: FetchSettings) -> ReqwestDocumentFetcher {
    ReqwestDocumentFetcher::new(FetchSettings {
        api_base: server.uri(),
        ..settings
    })
    .expect("client builds")
}

#[tokio::test]
async fn fetches_and_maps_document_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/doc-1"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(DOCUMENT_JSON, "application/json"))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(
        &server,
        FetchSettings {
            access_token: Some("secret-token".to_string()),
            ..FetchSettings::default()
        },
    );
    let doc = fetcher.fetch_document("doc-1").await.expect("fetch ok");

    assert_eq!(doc.blocks.len(), 2);
    let mirror_core::Block::Paragraph(title) = &doc.blocks[0];
    assert_eq!(title.style, ParagraphStyle::Heading2);
    let mirror_core::Block::Paragraph(body) = &doc.blocks[1];
    assert_eq!(
        body.runs[1],
        InlineRun::Text {
            text: " docs ".to_string(),
            link_url: Some("https://x".to_string())
        }
    );

    let temp = tempfile::TempDir::new().unwrap();
    let markup = MarkupConverter::new(ImageStore::new(temp.path())).to_markup(&doc);
    assert_eq!(
        markup,
        "## Title\n\nSee [docs](https://x)\n![image](https://lh3.example/img1)\n\n\n"
    );
}

#[tokio::test]
async fn status_codes_map_to_failure_kinds() {
    let server = MockServer::start().await;
    for (doc, status) in [("gone", 404u16), ("secret", 403), ("broken", 500)] {
        Mock::given(method("GET"))
            .and(path(format!("/v1/documents/{doc}")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
    }
    let fetcher = fetcher_for(&server, FetchSettings::default());

    let err = fetcher.fetch_document("gone").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::NotFound);
    assert!(err.to_string().contains("404"));

    let err = fetcher.fetch_document("secret").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Unauthorized);

    let err = fetcher.fetch_document("broken").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
}

#[tokio::test]
async fn garbage_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/doc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = fetcher_for(&server, FetchSettings::default())
        .fetch_document("doc-1")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Malformed);
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/doc-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("{}"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let err = fetcher_for(&server, settings)
        .fetch_document("doc-1")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn oversized_response_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/documents/doc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DOCUMENT_JSON))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 16,
        ..FetchSettings::default()
    };
    let err = fetcher_for(&server, settings)
        .fetch_document("doc-1")
        .await
        .unwrap_err();
    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 16, .. }));
}
