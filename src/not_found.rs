//! The page shown for routes and resources that do not exist.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

pub fn get_404_not_found_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        error_view(
            "Tidak Ditemukan",
            "404",
            "Halaman tidak ditemukan",
            "Periksa kembali alamat yang Anda tuju.",
        ),
    )
        .into_response()
}
