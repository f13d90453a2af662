use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "web/dist/"]
struct Assets;

/// Placeholder in page templates replaced by a status message.
const MESSAGE_SLOT: &str = "{{response}}";

/// `GET /static/{*path}`
pub async fn static_handler(Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');

    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Renders an embedded HTML page, filling its message slot with
/// `message` (HTML-escaped) or leaving it empty.
pub fn render_page(name: &str, message: Option<&str>) -> Response {
    match Assets::get(name) {
        Some(content) => {
            let template = String::from_utf8_lossy(&content.data);
            let html = template.replace(MESSAGE_SLOT, &escape_html(message.unwrap_or("")));
            Html(html).into_response()
        }
        None => {
            tracing::error!("Embedded page missing: {name}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
