use crate::controller::{
    health_check_controller, monzo_controller, oauth_controller, truelayer_controller,
};
use crate::{params, AppState};
use axum::{routing::get, Router};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI document. To be a part
// of the rendered document, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Bank Dashboard API"
        ),
        paths(
            health_check_controller::health_check,
            truelayer_controller::get_auth_url,
            truelayer_controller::exchange_auth_code,
            truelayer_controller::refresh_access_token,
            truelayer_controller::connection_metadata,
            truelayer_controller::get_cards,
            truelayer_controller::get_transactions,
            monzo_controller::get_auth_url,
            monzo_controller::exchange_auth_code,
            monzo_controller::refresh_access_token,
            monzo_controller::connection_metadata,
            monzo_controller::get_accounts,
            monzo_controller::get_transactions,
            oauth_controller::callback,
        ),
        components(
            schemas(
                domain::account::Account,
                domain::authentication_status::AuthenticationStatus,
                domain::provider::Provider,
                domain::transaction::Transaction,
                domain::transaction::TransactionList,
                params::bank::AuthUrlResponse,
                params::bank::TokenPayload,
            )
        ),
        tags(
            (name = "bank_dashboard", description = "Read-only banking data for the dashboard frontend")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(truelayer_routes(app_state.clone()))
        .merge(monzo_routes(app_state.clone()))
        .merge(oauth_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn truelayer_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/truelayer/get_auth_url",
            get(truelayer_controller::get_auth_url),
        )
        .route(
            "/api/truelayer/exchange_auth_code",
            get(truelayer_controller::exchange_auth_code),
        )
        .route(
            "/api/truelayer/refresh_access_token",
            get(truelayer_controller::refresh_access_token),
        )
        .route(
            "/api/truelayer/connection_metadata",
            get(truelayer_controller::connection_metadata),
        )
        .route(
            "/api/truelayer/get_cards",
            get(truelayer_controller::get_cards),
        )
        .route(
            "/api/truelayer/get_transactions",
            get(truelayer_controller::get_transactions),
        )
        .with_state(app_state)
}

fn monzo_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/monzo/get_auth_url", get(monzo_controller::get_auth_url))
        .route(
            "/api/monzo/exchange_auth_code",
            get(monzo_controller::exchange_auth_code),
        )
        .route(
            "/api/monzo/refresh_access_token",
            get(monzo_controller::refresh_access_token),
        )
        .route(
            "/api/monzo/connection_metadata",
            get(monzo_controller::connection_metadata),
        )
        .route("/api/monzo/get_accounts", get(monzo_controller::get_accounts))
        .route(
            "/api/monzo/get_transactions",
            get(monzo_controller::get_transactions),
        )
        .with_state(app_state)
}

/// Redirect target registered with both gateways
fn oauth_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/oauth/callback", get(oauth_controller::callback))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use clap::Parser;
    use domain::connection::Connections;
    use domain::MemoryStorage;
    use mockito::{Matcher, Server};
    use serde_json::Value;
    use service::config::Config;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn config(server: &Server) -> Config {
        Config::try_parse_from([
            "bank_dashboard",
            "--truelayer-client-id",
            "tl_client",
            "--truelayer-client-secret",
            "tl_secret",
            "--truelayer-redirect-url",
            "http://localhost:3001/oauth/callback",
            "--monzo-client-id",
            "mz_client",
            "--monzo-client-secret",
            "mz_secret",
            "--monzo-redirect-url",
            "http://localhost:3001/oauth/callback",
            "--frontend-base-url",
            "http://localhost:3000/",
            "--http-max-retries",
            "0",
        ])
        .unwrap()
        .set_truelayer_urls(&server.url(), &server.url())
        .set_monzo_urls(&server.url(), &server.url())
    }

    fn app(server: &Server) -> Router {
        let config = config(server);
        let connections = Connections::new(&config, Arc::new(MemoryStorage::new())).unwrap();
        define_routes(AppState::new(config, Arc::new(connections)))
    }

    async fn get(app: &Router, uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn state_of(url: &str) -> String {
        url.split("state=").nth(1).unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = Server::new_async().await;
        let response = get(&app(&server), "/health").await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let server = Server::new_async().await;
        let response = get(&app(&server), "/api-docs/openapi.json").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert!(body["paths"]["/api/truelayer/get_cards"].is_object());
    }

    #[tokio::test]
    async fn test_unknown_provider_is_bad_request() {
        let server = Server::new_async().await;
        let app = app(&server);

        let response = get(&app, "/api/truelayer/get_auth_url?provider=nationwide").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get(&app, "/api/truelayer/get_cards").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get(&app, "/api/monzo/get_accounts?providerKey=AMEX").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_auth_url_returns_provider_scoped_url() {
        let server = Server::new_async().await;
        let response = get(&app(&server), "/api/truelayer/get_auth_url?provider=AMEX").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        let url = body["authURL"].as_str().unwrap();
        assert!(url.contains("client_id=tl_client"));
        assert!(url.contains("uk-ob-amex"));
        assert!(url.contains("state="));
    }

    #[tokio::test]
    async fn test_data_without_tokens_is_unauthorized() {
        let server = Server::new_async().await;
        let app = app(&server);

        let response = get(&app, "/api/truelayer/get_cards?providerKey=HSBC").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = get(&app, "/api/monzo/get_accounts").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_date_range_is_bad_request() {
        let server = Server::new_async().await;
        let response = get(
            &app(&server),
            "/api/monzo/get_transactions?accountID=acc_1&from=2024-02-01&to=2024-01-01",
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_callback_redirects_to_gateway_page() {
        let server = Server::new_async().await;
        let app = app(&server);

        let body = json(get(&app, "/api/monzo/get_auth_url").await).await;
        let state = state_of(body["authURL"].as_str().unwrap());

        let response = get(&app, &format!("/oauth/callback?code=a%2Fb&state={state}")).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers()[header::LOCATION],
            format!("http://localhost:3000/monzo_callback?code=a%2Fb&state={state}").as_str()
        );

        let response = get(&app, "/oauth/callback?error=access_denied").await;
        assert_eq!(
            response.headers()[header::LOCATION],
            "http://localhost:3000/truelayer_callback?error=access_denied"
        );

        let response = get(&app, "/oauth/callback").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_monzo_exchange_then_transactions() {
        let mut server = Server::new_async().await;
        let _token = server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_body(
                r#"{"access_token":"mz_access","refresh_token":"mz_refresh","expires_in":3600,"token_type":"Bearer","user_id":"user_1"}"#,
            )
            .create_async()
            .await;
        let _transactions = server
            .mock("GET", "/transactions")
            .match_header("authorization", "Bearer mz_access")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("account_id".into(), "acc_1".into()),
                Matcher::UrlEncoded("since".into(), "2024-01-01T00:00:00Z".into()),
                Matcher::UrlEncoded("before".into(), "2024-02-01T00:00:00Z".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"transactions":[
                    {"id":"tx_1","amount":-250,"created":"2024-01-10T09:00:00Z","currency":"GBP","description":"COFFEE","settled":"2024-01-11T00:00:00Z"},
                    {"id":"tx_2","amount":1000,"created":"2024-01-12T09:00:00Z","currency":"GBP","description":"REFUND","settled":""}
                ]}"#,
            )
            .create_async()
            .await;

        let app = app(&server);
        let body = json(get(&app, "/api/monzo/get_auth_url").await).await;
        let state = state_of(body["authURL"].as_str().unwrap());

        let response = get(
            &app,
            &format!("/api/monzo/exchange_auth_code?authCode=code_1&state={state}"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let tokens = json(response).await;
        assert_eq!(tokens["access_token"], "mz_access");
        assert_eq!(tokens["user_id"], "user_1");

        let response = get(
            &app,
            "/api/monzo/get_transactions?accountID=acc_1&from=2024-01-01&to=2024-01-31",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["results"].as_array().unwrap().len(), 2);
        assert_eq!(body["results"][0]["id"], 1);
        assert_eq!(body["results"][1]["amountIsPending"], true);
        assert_eq!(body["balance"], 7.5);
        assert_eq!(body["balanceWithPrefix"], "£7.50");
    }
}
