use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use variance_wizard::error::SubmitError;
use variance_wizard::model::{AnalysisRequest, WizardConfig};
use variance_wizard::submission::client::{AnalysisService, HttpAnalysisService};

/// Serve one canned HTTP/1.1 response and hand back the request body.
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let body_start = loop {
            let n = sock.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let headers = String::from_utf8_lossy(&buf[..body_start]).to_ascii_lowercase();
        let len: usize = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .map(|v| v.trim().parse().unwrap())
            .unwrap_or(0);
        while buf.len() < body_start + len {
            let n = sock.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
        }
        let _ = tx.send(String::from_utf8_lossy(&buf[body_start..body_start + len]).into_owned());

        let reply = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        sock.write_all(reply.as_bytes()).await.unwrap();
        sock.shutdown().await.ok();
    });
    (format!("http://{addr}/api/analyze"), rx)
}

fn service(endpoint: String) -> HttpAnalysisService {
    HttpAnalysisService::new(&WizardConfig {
        endpoint,
        request_timeout: Duration::from_secs(5),
        chart_deferral: Duration::from_millis(1),
        export_dir: std::env::temp_dir(),
        user_agent: "variance-wizard-test".into(),
    })
    .unwrap()
}

fn request() -> AnalysisRequest {
    AnalysisRequest {
        segment: Some("Retail".into()),
        kpis: vec!["LLP".into(), "NPL".into()],
        comments: "Q3 focus".into(),
        primary_file_names: vec!["fds.xlsb".into()],
        supplementary_file_names: vec![],
    }
}

#[tokio::test]
async fn success_response_is_parsed_and_body_uses_wire_names() {
    let (url, body_rx) = serve_once(
        "200 OK",
        r#"{"success":true,"result":{"varianceAnalysis":{"title":"Abweichung","content":"**ok**"}}}"#,
    )
    .await;

    let resp = service(url).analyze(&request()).await.unwrap();
    assert!(resp.success);
    assert!(resp.result.is_some());

    let sent: serde_json::Value = serde_json::from_str(&body_rx.await.unwrap()).unwrap();
    assert_eq!(sent["segment"], "Retail");
    assert_eq!(sent["mainDocuments"], serde_json::json!(["fds.xlsb"]));
    assert_eq!(sent["additionalDocuments"], serde_json::json!([]));
    assert_eq!(sent["comments"], "Q3 focus");
}

#[tokio::test]
async fn server_error_maps_to_status() {
    let (url, _rx) = serve_once("500 Internal Server Error", "{}").await;
    match service(url).analyze(&request()).await {
        Err(SubmitError::Status { status, reason }) => {
            assert_eq!(status, 500);
            assert_eq!(reason, "Internal Server Error");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn application_failure_is_returned_as_response() {
    let (url, _rx) = serve_once("200 OK", r#"{"success":false,"message":"bad input"}"#).await;
    let resp = service(url).analyze(&request()).await.unwrap();
    assert!(!resp.success);
    assert_eq!(resp.message.as_deref(), Some("bad input"));
}

#[tokio::test]
async fn invalid_json_is_a_transport_error() {
    let (url, _rx) = serve_once("200 OK", "<html>").await;
    let err = service(url).analyze(&request()).await.unwrap_err();
    assert!(matches!(err, SubmitError::Transport(_)));
    assert!(err.alert_text().starts_with("Fehler: "));
}

#[test]
fn invalid_endpoint_is_rejected() {
    let cfg = WizardConfig {
        endpoint: "not a url".into(),
        request_timeout: Duration::from_secs(1),
        chart_deferral: Duration::from_millis(1),
        export_dir: std::env::temp_dir(),
        user_agent: "t".into(),
    };
    assert!(HttpAnalysisService::new(&cfg).is_err());
}
