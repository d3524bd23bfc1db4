//! Shared helpers for route and bootstrap tests.

use axum::body::Body;
use axum::response::Response;
use careline_core::config::{ConfigOverrides, LoadOptions};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;

use crate::bootstrap::{bootstrap, Application};

/// Bootstrap against a named shared-memory database. The hosted completion
/// API points at an unreachable local port, so every ladder attempt fails
/// fast and chat requests exercise the fallback path without the network.
pub async fn test_application(db_name: &str) -> Application {
    bootstrap(LoadOptions {
        overrides: ConfigOverrides {
            database_url: Some(format!("sqlite:file:{db_name}?mode=memory&cache=shared")),
            llm_api_key: Some("gsk_test_key".to_string()),
            llm_base_url: Some("http://127.0.0.1:9".to_string()),
            llm_timeout_secs: Some(1),
            encryption_key: Some("server-test-passphrase".to_string()),
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    })
    .await
    .expect("test bootstrap should succeed")
}

pub async fn body_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = response.into_body().collect().await.expect("read body").to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
