//! Root banner route

/// Plain-text banner served at GET /
pub const BANNER: &str = "Identity Reconciliation API is running";

/// GET /
///
/// Liveness banner for humans and simple probes
pub async fn serve_index() -> &'static str {
    BANNER
}
