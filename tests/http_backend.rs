use base64::Engine;
use image::{Rgba, RgbaImage};
use inpaintfe::io::{EncodeFormat, encode_to_vec};
use inpaintfe::prelude::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

#[derive(Default)]
struct RecordingDisplay {
    presented: usize,
    statuses: Vec<StatusMessage>,
}

impl DisplaySurface for RecordingDisplay {
    fn present(&mut self, _image: &RgbaImage) {
        self.presented += 1;
    }

    fn set_status(&mut self, status: &StatusMessage) {
        self.statuses.push(status.clone());
    }
}

/// Accept one connection, answer it with `status` and a JSON `body`, and hand
/// back the raw request bytes.
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/v1/edit", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = stream.shutdown().await;
        request
    });
    (url, handle)
}

async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
        let body = &buf[head_end + 4..];
        let content_length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());
        let complete = match content_length {
            Some(len) => body.len() >= len,
            None => body.ends_with(b"0\r\n\r\n"),
        };
        if complete {
            break;
        }
    }
    buf
}

fn loaded_session() -> EditSession {
    let mut session = EditSession::new(800, 600);
    session.load_image(RgbaImage::from_fn(64, 48, |x, y| Rgba([x as u8 * 3, y as u8 * 5, 40, 255])));
    session.fill_rect(0, 0, 32, 48);
    session
}

#[tokio::test]
async fn server_error_reaches_the_cycle_as_network_error() {
    let (url, server) =
        serve_once("500 Internal Server Error", r#"{"error":{"message":"model overloaded"}}"#.into()).await;
    let backend = HttpBackend::new(url, "sk-test", "acme/inpaint");
    let mut session = loaded_session();
    let mut display = RecordingDisplay::default();

    let err = run_edit_cycle(&mut session, &backend, &mut display, "a red kite", &CycleOptions::default())
        .await
        .unwrap_err();

    match &err {
        EditError::Network { status, message } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "model overloaded");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    let last = display.statuses.last().unwrap();
    assert_eq!(last.kind, StatusKind::Error);
    assert!(last.text.contains("500"), "status text: {}", last.text);
    assert_eq!(display.presented, 0);
    assert!(session.is_mask_painted());

    let request = server.await.unwrap();
    let text = String::from_utf8_lossy(&request);
    let lower = text.to_ascii_lowercase();
    assert!(lower.starts_with("post /v1/edit "), "request line: {}", lower.lines().next().unwrap_or(""));
    assert!(lower.contains("authorization: bearer sk-test"));
    assert!(lower.contains("content-type: multipart/form-data; boundary="));

    assert!(text.contains(r#"name="prompt""#));
    assert!(text.contains("a red kite"));
    assert!(text.contains(r#"name="model""#));
    assert!(text.contains("acme/inpaint"));
    assert!(text.contains(r#"name="image"; filename="original_image.jpeg""#));
    assert!(lower.contains("content-type: image/jpeg"));
    assert!(text.contains(r#"name="mask"; filename="mask.png""#));
    assert!(lower.contains("content-type: image/png"));
}

#[tokio::test]
async fn keyless_request_omits_authorization_and_applies_inline_image() {
    let edited = encode_to_vec(&RgbaImage::from_pixel(64, 48, GREEN), EncodeFormat::Png).unwrap();
    let b64 = base64::engine::general_purpose::STANDARD.encode(edited);
    let (url, server) = serve_once("200 OK", format!(r#"{{"data":[{{"b64_json":"{}"}}]}}"#, b64)).await;
    let backend = HttpBackend::new(url, "", "acme/inpaint");
    let mut session = loaded_session();
    let source = session.working_image().unwrap().clone();
    let mut display = RecordingDisplay::default();

    run_edit_cycle(&mut session, &backend, &mut display, "grass", &CycleOptions::default())
        .await
        .unwrap();

    let result = session.working_image().unwrap();
    assert_eq!(result.dimensions(), (64, 48));
    assert_eq!(*result.get_pixel(5, 20), GREEN);
    assert_eq!(result.get_pixel(60, 20), source.get_pixel(60, 20));
    assert_eq!(display.presented, 1);

    let request = server.await.unwrap();
    let lower = String::from_utf8_lossy(&request).to_ascii_lowercase();
    assert!(!lower.contains("authorization:"));
}
