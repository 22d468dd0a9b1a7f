// src/serve/bridge.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use futures::{SinkExt, StreamExt};
use axum::body::Body;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::model::ServerSection;

/// Live-update messages pushed to connected browsers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BridgeMessage {
    /// Swap the given stylesheet hrefs in place, no page reload.
    InjectCss { hrefs: Vec<String> },
    /// Full page reload.
    Reload,
    /// Informational banner text (task completion and the like).
    Notify { message: String },
}

struct AppState {
    proxy: String,
    client: reqwest::Client,
    updates: broadcast::Sender<BridgeMessage>,
    notify: bool,
}

/// Handle to a running bridge. Cloneable; updates are fire-and-forget.
#[derive(Clone)]
pub struct DevServerBridge {
    events_tx: mpsc::UnboundedSender<BridgeMessage>,
    updates: broadcast::Sender<BridgeMessage>,
}

impl DevServerBridge {
    /// Bind the bridge server and start serving. Fails only on startup
    /// (address in use and the like); everything after that is logged.
    pub async fn spawn(cfg: &ServerSection) -> Result<Self> {
        let (updates, _) = broadcast::channel::<BridgeMessage>(32);
        let (events_tx, events_rx) = mpsc::unbounded_channel::<BridgeMessage>();

        let state = Arc::new(AppState {
            proxy: cfg.proxy.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            updates: updates.clone(),
            notify: cfg.notify,
        });

        let app = Router::new()
            .route("/__themesmith/ws", get(ws_handler))
            .route("/__themesmith/client.js", get(client_js))
            .fallback(proxy_handler)
            .with_state(state);

        let addr = SocketAddr::from(([127, 0, 0, 1], cfg.port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding dev server on {addr}"))?;
        // report the real port when the config asked for an ephemeral one
        let addr = listener.local_addr().context("reading dev server address")?;

        info!("dev server bridge on http://{addr} (proxying {})", cfg.proxy);

        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                warn!("dev server stopped: {err}");
            }
        });

        spawn_debouncer(
            events_rx,
            updates.clone(),
            Duration::from_millis(cfg.reload_delay_ms),
        );

        if cfg.open {
            open_browser(&cfg.browser, &format!("http://{addr}/"));
        }

        Ok(Self { events_tx, updates })
    }

    /// Subscribe to the debounced update stream the connected browsers see.
    pub fn subscribe(&self) -> broadcast::Receiver<BridgeMessage> {
        self.updates.subscribe()
    }

    pub fn inject_css(&self, hrefs: Vec<String>) {
        let _ = self.events_tx.send(BridgeMessage::InjectCss { hrefs });
    }

    pub fn reload(&self) {
        let _ = self.events_tx.send(BridgeMessage::Reload);
    }

    pub fn notify(&self, message: impl Into<String>) {
        let _ = self.events_tx.send(BridgeMessage::Notify {
            message: message.into(),
        });
    }
}

/// Coalesce bursts of updates into one broadcast per debounce window. A
/// reload subsumes any pending CSS injections; notifications pass through
/// untouched.
fn spawn_debouncer(
    mut events_rx: mpsc::UnboundedReceiver<BridgeMessage>,
    updates: broadcast::Sender<BridgeMessage>,
    delay: Duration,
) {
    tokio::spawn(async move {
        while let Some(first) = events_rx.recv().await {
            if let BridgeMessage::Notify { .. } = first {
                let _ = updates.send(first);
                continue;
            }

            let mut reload = matches!(first, BridgeMessage::Reload);
            let mut hrefs: Vec<String> = match first {
                BridgeMessage::InjectCss { hrefs } => hrefs,
                _ => Vec::new(),
            };

            let window = sleep(delay);
            tokio::pin!(window);

            loop {
                tokio::select! {
                    _ = &mut window => break,
                    next = events_rx.recv() => match next {
                        Some(BridgeMessage::Reload) => reload = true,
                        Some(BridgeMessage::InjectCss { hrefs: more }) => {
                            for href in more {
                                if !hrefs.contains(&href) {
                                    hrefs.push(href);
                                }
                            }
                        }
                        Some(msg @ BridgeMessage::Notify { .. }) => {
                            let _ = updates.send(msg);
                        }
                        None => break,
                    },
                }
            }

            let message = if reload {
                BridgeMessage::Reload
            } else {
                BridgeMessage::InjectCss { hrefs }
            };
            debug!(?message, "broadcasting live update");
            let _ = updates.send(message);
        }
    });
}

/// WebSocket upgrade for `/__themesmith/ws`.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Forward broadcast updates to one connected browser until it goes away.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut updates = state.updates.subscribe();

    loop {
        tokio::select! {
            update = updates.recv() => {
                let update = match update {
                    Ok(u) => u,
                    // Lagged receivers just miss a burst; keep going.
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let text = match serde_json::to_string(&update) {
                    Ok(t) => t,
                    Err(_) => continue,
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(_)) => break,
            },
        }
    }
}

/// The injected browser client.
async fn client_js(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let script = format!(
        r#"(function () {{
  var notify = {notify};
  var ws = new WebSocket((location.protocol === 'https:' ? 'wss://' : 'ws://') + location.host + '/__themesmith/ws');
  ws.onmessage = function (ev) {{
    var msg = JSON.parse(ev.data);
    if (msg.type === 'reload') {{
      location.reload();
    }} else if (msg.type === 'inject-css') {{
      var links = document.querySelectorAll('link[rel="stylesheet"]');
      links.forEach(function (link) {{
        var href = link.getAttribute('href') || '';
        var base = href.split('?')[0];
        msg.hrefs.forEach(function (changed) {{
          if (base.indexOf(changed) !== -1 || changed.indexOf(base.replace(/^.*\//, '')) !== -1) {{
            link.setAttribute('href', base + '?ts=' + Date.now());
          }}
        }});
      }});
    }} else if (msg.type === 'notify' && notify) {{
      console.info('[themesmith] ' + msg.message);
    }}
  }};
}})();
"#,
        notify = state.notify
    );

    ([(header::CONTENT_TYPE, "application/javascript")], script)
}

/// Everything else is proxied to the configured target. HTML responses get
/// the client script injected before `</body>`.
async fn proxy_handler(State(state): State<Arc<AppState>>, req: Request) -> Response {
    match proxy_inner(&state, req).await {
        Ok(resp) => resp,
        Err(err) => {
            warn!("proxy error: {err}");
            (
                StatusCode::BAD_GATEWAY,
                format!("themesmith proxy error: {err}"),
            )
                .into_response()
        }
    }
}

async fn proxy_inner(state: &AppState, req: Request) -> Result<Response> {
    let (parts, body) = req.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{}{}", state.proxy, path_and_query);

    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .context("reading request body")?;

    let mut upstream = state
        .client
        .request(parts.method.clone(), &url)
        .body(body_bytes.to_vec());
    for (name, value) in parts.headers.iter() {
        if name != header::HOST && name != header::ACCEPT_ENCODING {
            upstream = upstream.header(name, value);
        }
    }

    let response = upstream.send().await.context("forwarding to proxy target")?;

    let status = response.status();
    let headers = response.headers().clone();
    let is_html = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false);

    let bytes = response.bytes().await.context("reading proxy response")?;

    let body = if is_html {
        Body::from(inject_client_tag(&bytes))
    } else {
        Body::from(bytes)
    };

    let mut builder = Response::builder().status(status);
    if let Some(out_headers) = builder.headers_mut() {
        copy_response_headers(&headers, out_headers);
    }
    Ok(builder.body(body).context("building proxy response")?)
}

fn copy_response_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from.iter() {
        // Length and framing are recomputed after injection.
        if name == header::CONTENT_LENGTH
            || name == header::TRANSFER_ENCODING
            || name == header::CONNECTION
            || name == header::CONTENT_ENCODING
        {
            continue;
        }
        to.insert(name.clone(), value.clone());
    }
}

/// Insert the client script tag before `</body>`, or append when the page
/// has none.
fn inject_client_tag(html_bytes: &[u8]) -> Vec<u8> {
    const TAG: &str = "<script src=\"/__themesmith/client.js\"></script>";
    let html = String::from_utf8_lossy(html_bytes);

    let injected = match html.rfind("</body>") {
        Some(idx) => {
            let mut out = String::with_capacity(html.len() + TAG.len());
            out.push_str(&html[..idx]);
            out.push_str(TAG);
            out.push_str(&html[idx..]);
            out
        }
        None => {
            let mut out = html.into_owned();
            out.push_str(TAG);
            out
        }
    };

    injected.into_bytes()
}

/// Fire-and-forget browser launch.
fn open_browser(browser: &str, url: &str) {
    let mut cmd = if browser.is_empty() {
        if cfg!(target_os = "macos") {
            let mut c = tokio::process::Command::new("open");
            c.arg(url);
            c
        } else if cfg!(windows) {
            let mut c = tokio::process::Command::new("cmd");
            c.arg("/C").arg("start").arg(url);
            c
        } else {
            let mut c = tokio::process::Command::new("xdg-open");
            c.arg(url);
            c
        }
    } else {
        let mut c = tokio::process::Command::new(browser);
        c.arg(url);
        c
    };

    match cmd.spawn() {
        Ok(_) => debug!("opened browser at {url}"),
        Err(err) => warn!("could not open browser: {err}"),
    }
}
