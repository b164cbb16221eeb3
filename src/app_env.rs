/// URL for accessing the PostgreSQL database (should contain a schema name in the path)
pub const DB_URL: &str = "DATABASE_URL";
/// Log level configuration for the application. Follows the usual `tracing_subscriber`
/// env-filter syntax, e.g. `info,task_manager_rest=debug`
pub const LOG_LEVEL: &str = "LOG_LEVEL";
/// Address and port the HTTP server binds to, e.g. `0.0.0.0:8080`
pub const SERVER_ADDR: &str = "SERVER_ADDR";

/// OpenTelemetry span export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs traces to the correct place
pub const OTEL_SPAN_EXPORT_URL: &str = "OTEL_SPAN_EXPORT_URL";
/// OpenTelemetry metrics export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_METRIC_EXPORT_URL: &str = "OTEL_METRIC_EXPORT_URL";
