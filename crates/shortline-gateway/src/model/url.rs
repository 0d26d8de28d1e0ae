use serde::{Deserialize, Serialize};

/// Body of `POST /shorten`, sent as `application/x-www-form-urlencoded`.
#[derive(Debug, Deserialize)]
pub struct ShortenForm {
    /// A missing field is treated like an empty URL.
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub short_code: String,
    pub short_url: String,
}
