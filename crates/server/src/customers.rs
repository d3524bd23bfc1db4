//! Customer record endpoints. Contact fields are encrypted before they
//! touch the store and never returned in clear.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use careline_core::crypto::mask;
use careline_core::domain::customer::NewCustomer;
use careline_core::errors::ApplicationError;
use careline_db::repositories::CustomerRepository;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::api::{
    interface_error_response, new_correlation_id, repository_error_response, ApiError,
};
use crate::bootstrap::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub email: String,
    pub social_media_id: String,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

fn default_platform() -> String {
    "instagram".to_string()
}

#[derive(Debug, Serialize)]
pub struct CreateCustomerResponse {
    pub id: i64,
    pub social_media_id: String,
    pub platform: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CustomerView {
    pub id: i64,
    pub social_media_id: String,
    pub platform: String,
    pub first_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CustomersResponse {
    pub customers: Vec<CustomerView>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/customers", post(create_customer).get(list_customers))
}

pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<Json<CreateCustomerResponse>, (StatusCode, Json<ApiError>)> {
    let correlation_id = new_correlation_id();

    let email_encrypted = encrypt_contact(&state, &request.email, &correlation_id)?;
    let phone_encrypted = match &request.phone {
        Some(phone) => encrypt_contact(&state, phone, &correlation_id)?,
        None => None,
    };

    let customer = state
        .customers
        .insert(NewCustomer {
            social_media_id: request.social_media_id,
            platform: request.platform,
            first_name: request.first_name,
            last_name: request.last_name,
            email_encrypted,
            phone_encrypted,
        })
        .await
        .map_err(|repository_error| {
            error!(
                event_name = "customers.create.failed",
                correlation_id = %correlation_id,
                error = %repository_error,
                "customer creation failed"
            );
            repository_error_response(repository_error, &correlation_id)
        })?;

    info!(
        event_name = "customers.created",
        correlation_id = %correlation_id,
        customer_id = %customer.id,
        platform = %customer.platform,
        email = %mask(&request.email),
        "customer record created"
    );

    Ok(Json(CreateCustomerResponse {
        id: customer.id.0,
        social_media_id: customer.social_media_id,
        platform: customer.platform,
        message: "Customer created successfully",
    }))
}

pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<CustomersResponse>, (StatusCode, Json<ApiError>)> {
    let correlation_id = new_correlation_id();

    let customers = state.customers.list().await.map_err(|repository_error| {
        error!(
            event_name = "customers.list.failed",
            correlation_id = %correlation_id,
            error = %repository_error,
            "customer listing failed"
        );
        repository_error_response(repository_error, &correlation_id)
    })?;

    Ok(Json(CustomersResponse {
        customers: customers
            .into_iter()
            .map(|customer| CustomerView {
                id: customer.id.0,
                social_media_id: customer.social_media_id,
                platform: customer.platform,
                first_name: customer.first_name,
                created_at: customer.created_at,
            })
            .collect(),
    }))
}

fn encrypt_contact(
    state: &AppState,
    value: &str,
    correlation_id: &str,
) -> Result<Option<String>, (StatusCode, Json<ApiError>)> {
    if value.is_empty() {
        return Ok(None);
    }

    state.cipher.encrypt(value).map(Some).map_err(|crypto_error| {
        error!(
            event_name = "customers.encrypt.failed",
            correlation_id = %correlation_id,
            error = %crypto_error,
            "contact field encryption failed"
        );
        interface_error_response(
            ApplicationError::Configuration(crypto_error.to_string())
                .into_interface(correlation_id),
        )
    })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use careline_db::repositories::CustomerRepository;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::bootstrap::router;
    use crate::testutil::{body_json, test_application};

    fn create_request(email: &str, social_media_id: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/customers")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({
                    "email": email,
                    "social_media_id": social_media_id,
                    "platform": "instagram",
                    "first_name": "Sarah",
                    "last_name": "M.",
                })
                .to_string(),
            ))
            .expect("request")
    }

    #[tokio::test]
    async fn created_customer_shows_up_in_the_listing_without_contact_data() {
        let app = test_application("customers_roundtrip").await;

        let response = router(app.state.clone())
            .oneshot(create_request("sarah@example.com", "ig_sarah"))
            .await
            .expect("create");
        assert_eq!(response.status(), StatusCode::OK);
        let created: Value = body_json(response).await;
        assert_eq!(created["message"], "Customer created successfully");

        let response = router(app.state.clone())
            .oneshot(Request::builder().uri("/customers").body(Body::empty()).expect("request"))
            .await
            .expect("list");
        let listing: Value = body_json(response).await;

        let customers = listing["customers"].as_array().expect("customers");
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0]["social_media_id"], "ig_sarah");
        assert_eq!(customers[0]["first_name"], "Sarah");
        assert!(customers[0].get("email").is_none(), "contact data never leaves the store");

        // At rest the email is ciphertext, not the raw address.
        let stored = app.state.customers.list().await.expect("list");
        let encrypted = stored[0].email_encrypted.as_deref().expect("encrypted email");
        assert_ne!(encrypted, "sarah@example.com");
        assert_eq!(
            app.state.cipher.decrypt(encrypted).expect("decrypt"),
            "sarah@example.com"
        );
    }

    #[tokio::test]
    async fn duplicate_identity_is_rejected_as_a_client_error() {
        let app = test_application("customers_duplicate").await;

        let first = router(app.state.clone())
            .oneshot(create_request("a@example.com", "ig_dup"))
            .await
            .expect("first");
        assert_eq!(first.status(), StatusCode::OK);

        let second = router(app.state.clone())
            .oneshot(create_request("b@example.com", "ig_dup"))
            .await
            .expect("second");
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);

        let payload: Value = body_json(second).await;
        assert!(payload["correlation_id"].as_str().is_some());
    }
}
