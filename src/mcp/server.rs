//! MCP server setup and lifecycle.
//!
//! Implements a JSON-RPC based MCP server over stdio or HTTP transport.
//! Stdio is line-delimited: one request per line in, one response per line
//! out, with all diagnostics kept off stdout.

use crate::mcp::ToolRegistry;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info_span;

/// Default maximum requests per rate limit window.
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: usize = 1000;

/// Default rate limit window duration (1 minute).
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Maximum request body size (1MB) to prevent `DoS` via large payloads.
const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024;

/// MCP protocol version.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name.
const SERVER_NAME: &str = "seqthink";

/// MCP rate limit configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: usize,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            window: Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECS),
        }
    }
}

impl RateLimitConfig {
    /// Creates config from environment variables.
    ///
    /// Reads `SEQTHINK_MCP_RATE_LIMIT_MAX_REQUESTS` and
    /// `SEQTHINK_MCP_RATE_LIMIT_WINDOW_SECS` from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let max_requests = std::env::var("SEQTHINK_MCP_RATE_LIMIT_MAX_REQUESTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_MAX_REQUESTS);

        let window_secs = std::env::var("SEQTHINK_MCP_RATE_LIMIT_WINDOW_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS);

        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Sets maximum requests per window.
    #[must_use]
    pub const fn with_max_requests(mut self, max: usize) -> Self {
        self.max_requests = max;
        self
    }

    /// Sets window duration in seconds.
    #[must_use]
    pub const fn with_window_secs(mut self, secs: u64) -> Self {
        self.window = Duration::from_secs(secs);
        self
    }
}

/// Transport type for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Standard input/output (default for Claude Desktop).
    #[default]
    Stdio,
    /// HTTP transport.
    Http,
}

/// MCP server for seqthink.
pub struct McpServer {
    /// Tool registry.
    tools: Arc<ToolRegistry>,
    /// Transport type.
    transport: Transport,
    /// HTTP port (if using HTTP transport).
    port: u16,
    /// Rate limit configuration.
    rate_limit: RateLimitConfig,
}

impl McpServer {
    /// Creates a new MCP server around a tool registry.
    #[must_use]
    pub fn new(tools: ToolRegistry) -> Self {
        Self {
            tools: Arc::new(tools),
            transport: Transport::Stdio,
            port: 3000,
            rate_limit: RateLimitConfig::from_env(),
        }
    }

    /// Sets the transport type.
    #[must_use]
    pub const fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Sets the HTTP port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the rate limit configuration.
    #[must_use]
    pub const fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Starts the MCP server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to start.
    pub fn start(&mut self) -> Result<()> {
        match self.transport {
            Transport::Stdio => self.run_stdio(),
            Transport::Http => self.run_http(),
        }
    }

    /// Runs the server over stdio with rate limiting.
    fn run_stdio(&mut self) -> Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let reader = BufReader::new(stdin.lock());

        // Rate limiting state
        let mut request_count: usize = 0;
        let mut window_start = Instant::now();

        for line in reader.lines() {
            let line = line.map_err(|e| Error::OperationFailed {
                operation: "read_stdin".to_string(),
                cause: e.to_string(),
            })?;

            if line.is_empty() {
                continue;
            }

            // Rate limiting: reset window if expired
            if window_start.elapsed() > self.rate_limit.window {
                request_count = 0;
                window_start = Instant::now();
            }

            if request_count >= self.rate_limit.max_requests {
                let max_requests = self.rate_limit.max_requests;
                let window = self.rate_limit.window;
                tracing::warn!("Rate limit exceeded: {request_count} requests in {window:?}");
                metrics::counter!("mcp_rate_limit_exceeded_total").increment(1);

                let error_response = format_error(
                    None,
                    -32000,
                    &format!("Rate limit exceeded: max {max_requests} requests per {window:?}"),
                );
                write_line(&mut stdout, &error_response)?;
                continue;
            }

            request_count += 1;
            let response = self.handle_request(&line);
            write_line(&mut stdout, &response)?;
        }

        Ok(())
    }

    /// Runs the server over HTTP.
    #[cfg(feature = "http")]
    fn run_http(&mut self) -> Result<()> {
        use axum::http::header;
        use axum::{Router, routing::post};
        use tower_http::set_header::SetResponseHeaderLayer;
        use tower_http::trace::TraceLayer;

        let state = Arc::new(http_transport::McpHttpState::new(
            Arc::clone(&self.tools),
            self.rate_limit.clone(),
        ));

        let app = Router::new()
            .route("/mcp", post(http_transport::handle_http_request))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                header::HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                header::HeaderValue::from_static("no-store"),
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let rt = tokio::runtime::Runtime::new().map_err(|e| Error::OperationFailed {
            operation: "create_runtime".to_string(),
            cause: e.to_string(),
        })?;

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.port));
        tracing::info!(port = self.port, "Starting MCP HTTP server");

        rt.block_on(async {
            let listener =
                tokio::net::TcpListener::bind(addr)
                    .await
                    .map_err(|e| Error::OperationFailed {
                        operation: "bind".to_string(),
                        cause: e.to_string(),
                    })?;

            axum::serve(listener, app)
                .await
                .map_err(|e| Error::OperationFailed {
                    operation: "serve".to_string(),
                    cause: e.to_string(),
                })
        })
    }

    /// Runs the server over HTTP (feature not enabled).
    #[cfg(not(feature = "http"))]
    fn run_http(&self) -> Result<()> {
        Err(Error::OperationFailed {
            operation: "run_http".to_string(),
            cause: "seqthink was built without the 'http' feature".to_string(),
        })
    }

    /// Handles a JSON-RPC request.
    fn handle_request(&self, request: &str) -> String {
        // Check request size before processing to prevent DoS
        if request.len() > MAX_REQUEST_BODY_SIZE {
            tracing::warn!(
                request_size = request.len(),
                max_size = MAX_REQUEST_BODY_SIZE,
                "Request exceeds maximum size limit"
            );
            return format_error(
                None,
                -32600,
                &format!(
                    "Request too large: {} bytes (max: {} bytes)",
                    request.len(),
                    MAX_REQUEST_BODY_SIZE
                ),
            );
        }

        let start = Instant::now();
        let transport_label = match self.transport {
            Transport::Stdio => "stdio",
            Transport::Http => "http",
        };

        let span = info_span!(
            "mcp.request",
            transport = transport_label,
            rpc.method = tracing::field::Empty,
            rpc.id = tracing::field::Empty,
            status = tracing::field::Empty
        );
        let _guard = span.enter();

        let parsed: std::result::Result<JsonRpcRequest, _> = serde_json::from_str(request);
        let mut method_label = "parse_error".to_string();
        let mut status_label = "error";

        let response = match parsed {
            Ok(req) => {
                method_label.clone_from(&req.method);
                span.record("rpc.method", method_label.as_str());
                if let Some(id) = &req.id {
                    let id_str = id.to_string();
                    span.record("rpc.id", id_str.as_str());
                }

                tracing::debug!(method = %method_label, transport = transport_label, "Processing MCP request");

                let result = self.dispatch_method(&req.method, req.params);
                status_label = if result.is_ok() { "success" } else { "error" };
                span.record("status", status_label);
                format_response(req.id, result)
            },
            Err(e) => {
                span.record("status", "parse_error");
                format_error(None, -32700, &format!("Parse error: {e}"))
            },
        };

        metrics::counter!(
            "mcp_requests_total",
            "method" => method_label.clone(),
            "transport" => transport_label,
            "status" => status_label
        )
        .increment(1);
        metrics::histogram!(
            "mcp_request_duration_ms",
            "method" => method_label,
            "transport" => transport_label
        )
        .record(start.elapsed().as_secs_f64() * 1000.0);

        response
    }

    /// Dispatches a method call using the command pattern.
    fn dispatch_method(&self, method: &str, params: Option<Value>) -> DispatchResult {
        use super::dispatch::McpMethod;

        match McpMethod::from(method) {
            McpMethod::Initialize => handle_initialize(),
            McpMethod::ListTools => Ok(list_tools_response(&self.tools)),
            McpMethod::CallTool => handle_call_tool(&self.tools, params),
            McpMethod::Ping => Ok(serde_json::json!({})),
            McpMethod::Unknown(name) => Err((-32601, format!("Method not found: {name}"))),
        }
    }
}

/// Handles the initialize method.
fn handle_initialize() -> DispatchResult {
    Ok(serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

/// Builds the tools/list response payload.
fn list_tools_response(tools: &ToolRegistry) -> Value {
    let tools: Vec<Value> = tools
        .list_tools()
        .iter()
        .map(|t| {
            let mut entry = serde_json::json!({
                "name": t.name,
                "description": t.description,
                "inputSchema": t.input_schema
            });
            if let (Some(obj), Some(schema)) = (entry.as_object_mut(), &t.output_schema) {
                obj.insert("outputSchema".to_string(), schema.clone());
            }
            entry
        })
        .collect();

    serde_json::json!({ "tools": tools })
}

/// Handles tools/call.
fn handle_call_tool(tools: &ToolRegistry, params: Option<Value>) -> DispatchResult {
    let params = params.ok_or((-32602, "Missing params".to_string()))?;

    let name = params
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or((-32602, "Missing tool name".to_string()))?;
    let tool_name = name.to_string();
    let span = info_span!("mcp.tool.call", tool.name = tool_name.as_str());
    let _guard = span.enter();
    let start = Instant::now();

    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or(serde_json::json!({}));

    let (result, status_label) = match tools.execute(name, arguments) {
        Ok(result) => {
            let status_label = if result.is_error { "error" } else { "success" };
            (
                Ok(serde_json::json!({
                    "content": result.content,
                    "isError": result.is_error
                })),
                status_label,
            )
        },
        Err(e) => (
            Ok(serde_json::json!({
                "content": [{ "type": "text", "text": e.to_string() }],
                "isError": true
            })),
            "error",
        ),
    };

    metrics::counter!(
        "mcp_tool_calls_total",
        "tool" => tool_name.clone(),
        "status" => status_label
    )
    .increment(1);
    if status_label == "error" {
        metrics::counter!(
            "mcp_tool_errors_total",
            "tool" => tool_name.clone()
        )
        .increment(1);
    }
    metrics::histogram!(
        "mcp_tool_duration_ms",
        "tool" => tool_name,
        "status" => status_label
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);

    result
}

/// Writes one response line to stdout and flushes it.
fn write_line(stdout: &mut std::io::Stdout, response: &str) -> Result<()> {
    writeln!(stdout, "{response}").map_err(|e| Error::OperationFailed {
        operation: "write_stdout".to_string(),
        cause: e.to_string(),
    })?;
    stdout.flush().map_err(|e| Error::OperationFailed {
        operation: "flush_stdout".to_string(),
        cause: e.to_string(),
    })
}

/// Formats a successful response.
fn format_response(id: Option<Value>, result: DispatchResult) -> String {
    match result {
        Ok(value) => {
            let response = JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: Some(value),
                error: None,
            };
            serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
        },
        Err((code, message)) => format_error(id, code, &message),
    }
}

/// Formats an error response.
fn format_error(id: Option<Value>, code: i32, message: &str) -> String {
    let response = JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_string(),
            data: None,
        }),
    };
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}

/// Result type for method dispatch.
type DispatchResult = std::result::Result<Value, (i32, String)>;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC version (required by protocol but not used in code).
    #[serde(rename = "jsonrpc")]
    _jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

// HTTP transport implementation
#[cfg(feature = "http")]
mod http_transport {
    use super::{
        JsonRpcRequest, MAX_REQUEST_BODY_SIZE, RateLimitConfig, ToolRegistry, Value,
        handle_call_tool, handle_initialize, list_tools_response,
    };
    use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::Instant;

    /// Rate limit window state.
    struct RateWindow {
        request_count: usize,
        window_start: Instant,
    }

    /// Shared state for HTTP transport.
    pub struct McpHttpState {
        tools: Arc<ToolRegistry>,
        rate_limit_config: RateLimitConfig,
        // Only the rate window needs a lock; tool execution synchronizes on
        // the tracker itself.
        rate_window: Mutex<RateWindow>,
    }

    impl McpHttpState {
        /// Creates HTTP state around the shared registry.
        pub fn new(tools: Arc<ToolRegistry>, rate_limit_config: RateLimitConfig) -> Self {
            Self {
                tools,
                rate_limit_config,
                rate_window: Mutex::new(RateWindow {
                    request_count: 0,
                    window_start: Instant::now(),
                }),
            }
        }

        /// Returns true when this request fits in the current window.
        fn admit(&self) -> bool {
            let mut window = self
                .rate_window
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            if window.window_start.elapsed() > self.rate_limit_config.window {
                window.request_count = 0;
                window.window_start = Instant::now();
            }
            if window.request_count >= self.rate_limit_config.max_requests {
                return false;
            }
            window.request_count += 1;
            true
        }
    }

    /// HTTP request handler.
    pub async fn handle_http_request(
        State(state): State<Arc<McpHttpState>>,
        body: String,
    ) -> impl IntoResponse {
        // Check request body size before processing to prevent DoS
        if body.len() > MAX_REQUEST_BODY_SIZE {
            tracing::warn!(
                body_size = body.len(),
                max_size = MAX_REQUEST_BODY_SIZE,
                "Request body exceeds maximum size limit"
            );
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(serde_json::json!({
                    "jsonrpc": "2.0",
                    "error": {
                        "code": -32600,
                        "message": format!(
                            "Request body too large: {} bytes (max: {} bytes)",
                            body.len(),
                            MAX_REQUEST_BODY_SIZE
                        )
                    }
                })),
            );
        }

        if !state.admit() {
            let max_requests = state.rate_limit_config.max_requests;
            let window = state.rate_limit_config.window;
            tracing::warn!("Rate limit exceeded on HTTP transport");
            metrics::counter!("mcp_rate_limit_exceeded_total", "transport" => "http")
                .increment(1);
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "jsonrpc": "2.0",
                    "error": {
                        "code": -32000,
                        "message": format!(
                            "Rate limit exceeded: max {max_requests} requests per {window:?}"
                        )
                    }
                })),
            );
        }

        let parsed: std::result::Result<JsonRpcRequest, _> = serde_json::from_str(&body);

        match parsed {
            Ok(req) => {
                let result = match req.method.as_str() {
                    "initialize" => handle_initialize(),
                    "tools/list" => Ok(list_tools_response(&state.tools)),
                    "tools/call" => handle_call_tool(&state.tools, req.params),
                    "ping" => Ok(serde_json::json!({})),
                    method => Err((-32601, format!("Method not found: {method}"))),
                };

                let response = match result {
                    Ok(value) => serde_json::json!({
                        "jsonrpc": "2.0",
                        "id": req.id,
                        "result": value
                    }),
                    Err((code, message)) => serde_json::json!({
                        "jsonrpc": "2.0",
                        "id": req.id,
                        "error": {
                            "code": code,
                            "message": message
                        }
                    }),
                };

                (StatusCode::OK, Json(response))
            },
            Err(e) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "jsonrpc": "2.0",
                    "error": {
                        "code": -32700,
                        "message": format!("Parse error: {e}")
                    }
                })),
            ),
        }
    }
}

#[cfg(feature = "http")]
pub use http_transport::{McpHttpState, handle_http_request};
