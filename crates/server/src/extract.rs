//! Request extractors

use axum::extract::FromRequest;

use crate::error::ApiError;

/// `Json<T>` với lỗi giải mã trả về dạng `{code, message}` của [`ApiError`]
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);
