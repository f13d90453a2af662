use axum::response::Response;

use crate::auth::middleware::AuthUser;
use crate::static_files::render_page;

/// `GET /`: the file manager shell. The listing itself arrives over `/ws`.
pub async fn index(_user: AuthUser) -> Response {
    render_page("index.html", None)
}
