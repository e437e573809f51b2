//! HTTP dashboard output
//!
//! Serves the most recent frame and a bounded history as JSON. The
//! listener runs on its own thread and only sees snapshots handed over
//! through `ArcSwap` and the history lock, never the plugin registry.
//!
//! Routes:
//! - `/` station title, description and the latest frame
//! - `/data.json` the latest frame (`null` before the first cycle)
//! - `/history.json` up to `historysize` past frames, oldest first

use crate::calibration;
use airpi_core::template;
use airpi_core::{Calibration, Frame, Output, PluginContext, PluginDescriptor, PluginInstance, PluginParams};
use anyhow::{Context, Result};
use arc_swap::ArcSwapOption;
use crossbeam::channel::{bounded, Sender, TryRecvError};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tiny_http::{Header, Method, Request, Response, Server};

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor::new("dashboard", "HTTP dashboard")
    .description("Serve the latest readings and recent history as JSON over HTTP")
    .optional(&["port", "bind", "historysize", "title", "about", "calibration"]);

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BIND: &str = "0.0.0.0";
/// One day at the default 30 s history interval
const DEFAULT_HISTORY_SIZE: usize = 2880;
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// State shared with the listener thread
struct Shared {
    title: String,
    about: String,
    latest: ArcSwapOption<Frame>,
    history: Mutex<VecDeque<Arc<Frame>>>,
    history_size: usize,
}

impl Shared {
    fn record(&self, frame: Frame) {
        let frame = Arc::new(frame);
        self.latest.store(Some(frame.clone()));

        let mut history = self.history.lock().unwrap_or_else(|p| p.into_inner());
        history.push_back(frame);
        while history.len() > self.history_size {
            history.pop_front();
        }
    }

    fn respond(&self, path: &str) -> (u16, String) {
        let latest = self.latest.load_full();
        let body = match path {
            "/" | "/index.html" => json!({
                "title": self.title,
                "about": self.about,
                "frame": latest.as_deref(),
            }),
            "/data.json" => json!(latest.as_deref()),
            "/history.json" => {
                let history = self.history.lock().unwrap_or_else(|p| p.into_inner());
                json!(history.iter().map(|f| f.as_ref()).collect::<Vec<_>>())
            }
            _ => return (404, json!({ "error": "not found" }).to_string()),
        };
        (200, body.to_string())
    }
}

fn handle_request(request: Request, shared: &Shared, content_type: &Header) -> std::io::Result<()> {
    let (status, body) = if *request.method() == Method::Get {
        let url = request.url();
        let path = url.split('?').next().unwrap_or(url);
        shared.respond(path)
    } else {
        (405, json!({ "error": "method not allowed" }).to_string())
    };
    let response = Response::from_string(body)
        .with_status_code(status)
        .with_header(content_type.clone());
    request.respond(response)
}

pub struct DashboardOutput {
    shared: Arc<Shared>,
    calibration: Option<Arc<Calibration>>,
    local_addr: SocketAddr,
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl DashboardOutput {
    pub fn start(
        address: &str,
        title: String,
        about: String,
        history_size: usize,
        calibration: Option<Arc<Calibration>>,
    ) -> Result<Self> {
        let server = Server::http(address)
            .map_err(|e| anyhow::anyhow!("Failed to bind dashboard to {}: {}", address, e))?;
        let local_addr = server
            .server_addr()
            .to_ip()
            .with_context(|| format!("Dashboard address {} is not an IP socket", address))?;
        let content_type = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
            .map_err(|_| anyhow::anyhow!("Invalid dashboard content type header"))?;

        let shared = Arc::new(Shared {
            title,
            about,
            latest: ArcSwapOption::empty(),
            history: Mutex::new(VecDeque::with_capacity(history_size.min(1024))),
            history_size,
        });

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let thread_shared = shared.clone();
        let handle = std::thread::Builder::new()
            .name("dashboard".to_string())
            .spawn(move || loop {
                match stop_rx.try_recv() {
                    Err(TryRecvError::Empty) => {}
                    _ => break,
                }
                match server.recv_timeout(ACCEPT_POLL) {
                    Ok(Some(request)) => {
                        let peer = request.remote_addr().copied();
                        if let Err(e) = handle_request(request, &thread_shared, &content_type) {
                            log::debug!("Dashboard client {:?} failed: {}", peer, e);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => log::warn!("Dashboard receive failed: {}", e),
                }
            })?;
        log::info!("Dashboard listening on http://{}", local_addr);

        Ok(Self {
            shared,
            calibration,
            local_addr,
            stop_tx,
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Output for DashboardOutput {
    fn output_data(&mut self, frame: &Frame) -> Result<bool> {
        let frame = match &self.calibration {
            Some(cal) => cal.calibrate(frame),
            None => frame.clone(),
        };
        self.shared.record(frame);
        Ok(true)
    }
}

impl Drop for DashboardOutput {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.stop_tx.try_send(());
            let _ = handle.join();
        }
    }
}

pub fn create(params: &PluginParams, context: &mut PluginContext) -> Result<PluginInstance> {
    let port: u16 = params.parse_or("port", DEFAULT_PORT)?;
    let bind = params.get("bind").unwrap_or(DEFAULT_BIND);
    let history_size: usize = params.parse_or("historysize", DEFAULT_HISTORY_SIZE)?;

    let mut values = HashMap::new();
    values.insert("hostname", context.metadata().pi_name.clone());
    let title = template::expand(params.get("title").unwrap_or("AirPi"), &values);
    let about = template::expand(params.get("about").unwrap_or("An AirPi weather station."), &values);

    let output = DashboardOutput::start(
        &format!("{}:{}", bind, port),
        title,
        about,
        history_size,
        calibration::requested(params, context),
    )?;
    Ok(PluginInstance::Output(Box::new(output)))
}
