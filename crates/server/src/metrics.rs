use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};
use service::auth::AuthError;

// Prometheus metrics (default registry)
pub static REGISTER_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("auth_register_total", "Registration attempts by outcome", &["outcome"])
        .expect("register auth_register_total")
});

pub static LOGIN_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("auth_login_total", "Login attempts by outcome", &["outcome"])
        .expect("register auth_login_total")
});

fn outcome<T>(res: &Result<T, AuthError>) -> &'static str {
    match res {
        Ok(_) => "success",
        Err(e) => e.kind(),
    }
}

pub fn record_register<T>(res: &Result<T, AuthError>) {
    REGISTER_TOTAL.with_label_values(&[outcome(res)]).inc();
}

pub fn record_login<T>(res: &Result<T, AuthError>) {
    LOGIN_TOTAL.with_label_values(&[outcome(res)]).inc();
}

/// Text exposition of the default registry, for the admin `/metrics` endpoint.
pub fn render() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    match encoder.encode(&prometheus::gather(), &mut buf) {
        Ok(()) => (StatusCode::OK, String::from_utf8_lossy(&buf).into_owned()),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
