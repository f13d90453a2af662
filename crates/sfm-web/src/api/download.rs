use std::path::PathBuf;

use axum::body::Body;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use sfm_core::fs::sniff;
use tokio_util::io::ReaderStream;

use crate::auth::middleware::AuthUser;
use crate::error::AppError;

/// Read size per streamed chunk (1 MiB).
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// `GET /download/{*path}`: streams `/path` as an attachment.
pub async fn download(_user: AuthUser, Path(path): Path<String>) -> Result<Response, AppError> {
    let path = PathBuf::from(format!("/{}", path.trim_start_matches('/')));

    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|e| AppError::NotFound(format!("{}: {e}", path.display())))?;
    if !metadata.is_file() {
        return Err(AppError::NotFound(format!("not a regular file: {}", path.display())));
    }

    let sniff_target = path.clone();
    let mime = tokio::task::spawn_blocking(move || sniff::sniff_file(&sniff_target)).await?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| AppError::NotFound(format!("{}: {e}", path.display())))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    tracing::info!("Download {} ({} bytes, {mime})", path.display(), metadata.len());

    let stream = ReaderStream::with_capacity(file, CHUNK_SIZE);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_DISPOSITION, attachment(&name)),
            (header::CONTENT_LENGTH, metadata.len().to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// `attachment` disposition with an ASCII `filename` and, when needed, the
/// exact UTF-8 name in `filename*`.
fn attachment(name: &str) -> String {
    let ascii: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    if ascii == name {
        return format!("attachment; filename=\"{ascii}\"");
    }

    let mut encoded = String::new();
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_plain_name() {
        assert_eq!(attachment("report.pdf"), "attachment; filename=\"report.pdf\"");
    }

    #[test]
    fn attachment_escapes_quotes() {
        assert_eq!(attachment("a\"b.txt"), "attachment; filename=\"a_b.txt\"; filename*=UTF-8''a%22b.txt");
    }

    #[test]
    fn attachment_non_ascii_name() {
        assert_eq!(
            attachment("é.txt"),
            "attachment; filename=\"_.txt\"; filename*=UTF-8''%C3%A9.txt"
        );
    }
}
