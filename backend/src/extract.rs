use crate::error::AgriError;
use axum::extract::{FromRequest, FromRequestParts};

/// `Json` whose rejections go through `AgriError`, so a bad body gets the
/// same JSON error envelope as every other failure.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AgriError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AgriError))]
pub struct AppQuery<T>(pub T);
