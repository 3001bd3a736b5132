#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use scan_relay::common::config::ServerInfo;
use scan_relay::processing::frame::encode_data_url;
use scan_relay::processing::FrameDecoder;
use scan_relay::server::error::CompletionError;
use scan_relay::server::{CompletionClient, RelayServer, ScanController, SessionRegistry};

/// Decodes the red channel of pixel (0, 0) into a fixed barcode.
#[derive(Default)]
pub struct PixelDecoder {
    pub calls: AtomicUsize,
}

impl FrameDecoder for PixelDecoder {
    fn decode(&self, image: &DynamicImage) -> anyhow::Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(match image.get_pixel(0, 0)[0] {
            1 => vec!["ABC123".to_string()],
            2 => vec!["XYZ999".to_string()],
            _ => Vec::new(),
        })
    }
}

/// PNG frame whose barcode [`PixelDecoder`] reads as `code`.
pub fn frame(code: u8) -> String {
    let img = RgbImage::from_pixel(2, 2, Rgb([code, 0, 0]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    encode_data_url("image/png", &bytes)
}

pub fn send_items(code: u8) -> String {
    serde_json::json!({
        "event": "send_items",
        "data": { "frame": frame(code) }
    })
    .to_string()
}

/// Completion client that records prompts and answers from a script.
pub struct ScriptedCompletion {
    pub prompts: Mutex<Vec<String>>,
    pub reply: Result<String, &'static str>,
}

impl ScriptedCompletion {
    pub fn answering(reply: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            reply: Ok(reply.to_string()),
        }
    }

    pub fn failing_with(kind: &'static str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            reply: Err(kind),
        }
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.reply {
            Ok(ref text) => Ok(text.clone()),
            Err("invalid") => Err(CompletionError::InvalidResponse("bad json".into())),
            Err(_) => Err(CompletionError::Timeout),
        }
    }
}

pub struct TestRelay {
    pub addr: SocketAddr,
    pub registry: Arc<SessionRegistry>,
    pub decoder: Arc<PixelDecoder>,
    pub controller: Arc<ScanController>,
}

pub fn relay_parts(
    cooldown: Duration,
    completion: Arc<dyn CompletionClient>,
) -> (RelayServer, Arc<SessionRegistry>, Arc<PixelDecoder>, Arc<ScanController>) {
    relay_parts_for_origin(cooldown, completion, "*")
}

pub fn relay_parts_for_origin(
    cooldown: Duration,
    completion: Arc<dyn CompletionClient>,
    allowed_origin: &str,
) -> (RelayServer, Arc<SessionRegistry>, Arc<PixelDecoder>, Arc<ScanController>) {
    let registry = Arc::new(SessionRegistry::new());
    let decoder = Arc::new(PixelDecoder::default());
    let controller = Arc::new(ScanController::new(
        registry.clone(),
        decoder.clone(),
        cooldown,
    ));
    let server = RelayServer::new(
        ServerInfo {
            address: "127.0.0.1:0".to_string(),
            allowed_origin: allowed_origin.to_string(),
        },
        controller.clone(),
        completion,
    );
    (server, registry, decoder, controller)
}

/// Start a relay on an ephemeral port that accepts any origin.
pub async fn start_relay(cooldown: Duration) -> TestRelay {
    start_relay_for_origin(cooldown, "*").await
}

/// Start a relay whose scanning channel only accepts `allowed_origin`.
pub async fn start_relay_for_origin(cooldown: Duration, allowed_origin: &str) -> TestRelay {
    let (server, registry, decoder, controller) = relay_parts_for_origin(
        cooldown,
        Arc::new(ScriptedCompletion::answering("ok")),
        allowed_origin,
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener));

    TestRelay {
        addr,
        registry,
        decoder,
        controller,
    }
}
