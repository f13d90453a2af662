use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;

use crate::auth::middleware::AuthUser;
use crate::auth::{cookie, jwt, password};
use crate::dto::LoginForm;
use crate::error::AppError;
use crate::state::AppState;
use crate::static_files::render_page;

pub const WRONG_CREDENTIALS: &str = "Wrong login or password";

/// `GET /auth`
pub async fn login_page(user: Option<AuthUser>) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    render_page("auth.html", None)
}

/// `POST /auth`
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let login = form.login.unwrap_or_default();
    let passwd = form.passwd.unwrap_or_default();

    // Always verify the password so a wrong login name costs the same time.
    let hash = state.config.auth.password_hash.clone();
    let password_ok =
        tokio::task::spawn_blocking(move || password::verify_password(&hash, &passwd)).await??;

    if !password_ok || login != state.config.auth.login {
        tracing::warn!("Failed login attempt for user: {login}");
        return Ok(render_page("auth.html", Some(WRONG_CREDENTIALS)));
    }

    let ttl_hours = state.config.auth.session_ttl_hours;
    let issued = jwt::create_token(&state.config.auth.cookie_secret, ttl_hours, &login)?;
    tracing::info!("User {login} logged in (jti: {})", issued.claims.jti);

    let set_cookie =
        cookie::session_cookie(&issued.token, ttl_hours * 3600, state.config.tls_enabled());
    Ok(([(header::SET_COOKIE, set_cookie)], Redirect::to("/")).into_response())
}

/// `GET /exit`
pub async fn exit(State(state): State<AppState>, user: Option<AuthUser>) -> Response {
    if let Some(user) = user {
        state.revoke(&user.jti, user.exp);
        tracing::info!("User {} logged out (jti: {})", user.sub, user.jti);
    }
    let cleared = cookie::clear_session_cookie(state.config.tls_enabled());
    ([(header::SET_COOKIE, cleared)], Redirect::to("/auth")).into_response()
}
