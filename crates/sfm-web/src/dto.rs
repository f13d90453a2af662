use serde::Deserialize;

/// `POST /auth` form body. Missing fields count as empty, not as a
/// malformed request.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub passwd: Option<String>,
}
