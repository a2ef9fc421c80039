//! HTTP endpoints.
//!
//! - `/metrics` : republished file metrics + exporter metrics
//! - `/alive`   : liveness (cheaper than scraping `/metrics`)
//! - `/`        : landing page

use std::time::Instant;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::app_state::AppState;
use crate::obs::render::{encode_text, families_from_samples, merge_families};

const INDEX_HTML: &str = "<html>
<head><title>Textfile Exporter</title></head>
<body>
<h1>Textfile Exporter</h1>
<p>Click <a href='/metrics'>here</a> to see the metrics.</p>
</body>
</html>";

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn alive() -> impl IntoResponse {
    (StatusCode::OK, "i'm alive\n")
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let begin = Instant::now();
    state.metrics().scrapes.inc();

    // The store lock is released before any encoding happens.
    let samples = state.store().collect();
    let emitted = samples.len();

    let families = merge_families(families_from_samples(samples), state.metrics().gather());

    match encode_text(&families) {
        Ok(body) => {
            tracing::debug!(emitted, elapsed_ms = begin.elapsed().as_millis() as u64, "metrics emitted");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
                body,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "metrics encoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
        }
    }
}
