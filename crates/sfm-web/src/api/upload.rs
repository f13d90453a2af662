use std::path::{Path, PathBuf};

use axum::extract::{Multipart, State};
use axum::response::Response;
use sfm_core::{CoreError, FileEntity};
use tokio::io::AsyncWriteExt;

use crate::auth::middleware::AuthUser;
use crate::state::AppState;
use crate::static_files::render_page;
use crate::workspace;

/// Multipart field carrying the file.
pub const UPLOAD_FIELD: &str = "uploadFile";
pub const UPLOADED: &str = "File uploaded successfully";
pub const NO_FILE: &str = "No file selected";

/// `GET /upload`
pub async fn upload_form(_user: AuthUser) -> Response {
    render_page("upload.html", None)
}

/// `POST /upload`: stores the file in the workspace's current directory.
pub async fn upload(
    user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let session = state.workspaces.session_for(&user);
    let dir = workspace::current_directory(&session);

    let message = match store_upload(&mut multipart, &dir).await {
        Ok(Some(path)) => {
            tracing::info!("Uploaded {}", path.display());
            UPLOADED.to_string()
        }
        Ok(None) => NO_FILE.to_string(),
        Err(e) => {
            tracing::warn!("Upload into {} failed: {e}", dir.display());
            e
        }
    };

    render_page("upload.html", Some(&message))
}

/// Streams the first `uploadFile` field to disk. `Ok(None)` when the form
/// carried no file.
async fn store_upload(multipart: &mut Multipart, dir: &Path) -> Result<Option<PathBuf>, String> {
    while let Some(mut field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Ok(None),
        };

        let entity = FileEntity::new(dir);
        let target = entity.path_for(&file_name).map_err(|e| e.to_string())?;
        let mut file = tokio::fs::File::create(&target)
            .await
            .map_err(|e| CoreError::from_io(e, &target).to_string())?;

        let written: Result<(), String> = async {
            while let Some(chunk) = field.chunk().await.map_err(|e| e.to_string())? {
                file.write_all(&chunk)
                    .await
                    .map_err(|e| CoreError::from_io(e, &target).to_string())?;
            }
            file.flush().await.map_err(|e| e.to_string())
        }
        .await;

        if let Err(e) = written {
            drop(file);
            if let Err(cleanup) = entity.remove(&file_name) {
                tracing::debug!("Could not remove partial upload: {cleanup}");
            }
            return Err(e);
        }
        return Ok(Some(target));
    }
    Ok(None)
}
