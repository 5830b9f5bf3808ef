use axum::{
    http::{header, HeaderValue},
    response::Response,
};

use crate::http::image::{content_type_for, IMAGE_CACHE_CONTROL};

/// Applies the image headers on top of a file response.
///
/// The long-lived `Cache-Control` goes on every response. `Content-Type` is
/// only replaced when a body is served (200 or 206).
pub fn with_image_headers(mut response: Response, filename: &str) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(IMAGE_CACHE_CONTROL),
    );

    if response.status().is_success() {
        if let Ok(content_type) = HeaderValue::from_str(&content_type_for(filename)) {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type);
        }
    }

    response
}
