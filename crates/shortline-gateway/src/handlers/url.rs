use crate::error::Result;
use crate::model::{ShortenForm, ShortenResponse};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::{Form, Json};
use shortline_core::{ShortCode, ShortenParams};
use std::time::Instant;
use tracing::info;

pub async fn shorten_handler(
    State(state): State<AppState>,
    Form(form): Form<ShortenForm>,
) -> Result<(StatusCode, Json<ShortenResponse>)> {
    let params = ShortenParams {
        original_url: form.url,
        deadline: Instant::now() + state.request_timeout(),
    };

    let code = state.shortener().shorten(params).await?;
    let short_url = state.short_url(&code);
    info!(code = %code, short_url = %short_url, "short url created");

    Ok((
        StatusCode::CREATED,
        Json(ShortenResponse {
            short_code: code.to_string(),
            short_url,
        }),
    ))
}

pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect> {
    let code = ShortCode::new(&short_code)?;
    let target = state.shortener().resolve(&code).await?;
    Ok(Redirect::temporary(&target))
}
