//! API handlers

use crate::error::ApiError;
use crate::server::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use countdown_common::{Countdown, NewCountdown, TimeLeft, Wallet, WalletService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Upper bound on words per generated phrase
const MAX_PHRASE_WORDS: usize = 48;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MnemonicQuery {
    words: Option<usize>,
}

/// Registration carries only the owner secret; the recovery phrase stays on the client
#[derive(Debug, Deserialize)]
pub struct CreateWalletRequest {
    owner_secret: String,
}

#[derive(Debug, Deserialize)]
pub struct ImportWalletRequest {
    wallet_id: String,
    owner_secret: String,
}

#[derive(Debug, Serialize)]
struct WalletSummary {
    wallet_id: String,
    path: String,
    created_at: i64,
}

impl From<Wallet> for WalletSummary {
    fn from(wallet: Wallet) -> Self {
        Self {
            path: wallet.path(),
            wallet_id: wallet.wallet_id,
            created_at: wallet.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct WalletResponse {
    wallet_id: String,
    path: String,
    created_at: i64,
    countdowns: Vec<CountdownView>,
}

/// A countdown as served to clients, evaluated at request time
#[derive(Debug, Serialize)]
struct CountdownView {
    #[serde(flatten)]
    countdown: Countdown,
    share_url: String,
    next_occurrence: DateTime<Utc>,
    time_left: TimeLeft,
    time_left_display: String,
    reminder_at: Option<DateTime<Utc>>,
}

impl CountdownView {
    fn new(countdown: Countdown, state: &AppState, now: DateTime<Utc>) -> Self {
        let time_left = countdown.time_left(now);
        Self {
            share_url: state.config.public_url(&countdown.share_path()),
            next_occurrence: countdown.next_occurrence(now),
            time_left_display: time_left.to_string(),
            time_left,
            reminder_at: countdown.reminder_at(now),
            countdown,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Run wallet-service work on the blocking pool
async fn blocking<T, F>(state: &Arc<AppState>, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&WalletService) -> countdown_common::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let wallets = state.wallets.clone();
    Ok(tokio::task::spawn_blocking(move || f(&wallets)).await??)
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "countdown-web",
        "version": countdown_common::VERSION,
    }))
}

pub async fn generate_mnemonic_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<MnemonicQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let words = query
        .words
        .unwrap_or(state.wallets.config().mnemonic_words);
    if words > MAX_PHRASE_WORDS {
        return Err(ApiError::BadRequest(format!(
            "at most {} words per phrase",
            MAX_PHRASE_WORDS
        )));
    }
    let mnemonic = state.wallets.generator().mnemonic(words)?;
    Ok(Json(serde_json::json!({ "mnemonic": mnemonic, "words": words })))
}

pub async fn create_wallet_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateWalletRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let wallet = blocking(&state, move |w| w.register_wallet(&req.owner_secret)).await?;
    Ok((StatusCode::CREATED, Json(WalletSummary::from(wallet))))
}

pub async fn import_wallet_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ImportWalletRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let wallet = blocking(&state, move |w| {
        w.import_wallet(&req.wallet_id, &req.owner_secret)
    })
    .await?;
    Ok(Json(WalletSummary::from(wallet)))
}

pub async fn get_wallet_handler(
    State(state): State<Arc<AppState>>,
    Path(wallet_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (wallet, countdowns) = blocking(&state, move |w| {
        let wallet = w.get_wallet(&wallet_id)?;
        let countdowns = w.list_countdowns(&wallet.wallet_id)?;
        Ok((wallet, countdowns))
    })
    .await?;

    let now = Utc::now();
    Ok(Json(WalletResponse {
        path: wallet.path(),
        wallet_id: wallet.wallet_id,
        created_at: wallet.created_at,
        countdowns: countdowns
            .into_iter()
            .map(|c| CountdownView::new(c, &state, now))
            .collect(),
    }))
}

pub async fn create_wallet_countdown_handler(
    State(state): State<Arc<AppState>>,
    Path(wallet_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<NewCountdown>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    let owner_secret = match extract_token(&headers) {
        Some(token) => token,
        None if state.wallets.config().enforce_ownership => return Err(ApiError::Unauthorized),
        None => String::new(),
    };

    let countdown = blocking(&state, move |w| {
        w.create_countdown(&wallet_id, &owner_secret, &input)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CountdownView::new(countdown, &state, Utc::now())),
    ))
}

pub async fn create_countdown_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewCountdown>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    let countdown = blocking(&state, move |w| w.create_standalone_countdown(&input)).await?;
    Ok((
        StatusCode::CREATED,
        Json(CountdownView::new(countdown, &state, Utc::now())),
    ))
}

pub async fn get_countdown_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let countdown = blocking(&state, move |w| w.get_countdown(&token)).await?;
    Ok(Json(CountdownView::new(countdown, &state, Utc::now())))
}

pub async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not found" })),
    )
}

#[cfg(test)]
mod tests {
    use crate::WebServer;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use countdown_common::{
        generate_mnemonic, owner_secret_from_mnemonic, random_owner_secret, Config, Database,
        DEFAULT_SECRET_BYTES,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let mut config = Config::default();
        config.public_base_url = "https://count.example".to_string();
        WebServer::with_database(Database::open_memory().unwrap(), config)
            .unwrap()
            .router()
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn birthday() -> Value {
        json!({
            "title": "Birthday",
            "date": "2099-06-01",
            "repeat": "yearly",
            "remind_at": "1_day_before"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_generate_mnemonic() {
        let app = app();
        let (status, body) =
            send(&app, Method::GET, "/api/generate/mnemonic", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mnemonic"].as_str().unwrap().split(' ').count(), 12);

        let (_, body) = send(&app, Method::GET, "/api/generate/mnemonic?words=5", None, None).await;
        assert_eq!(body["mnemonic"].as_str().unwrap().split(' ').count(), 5);

        let (status, _) = send(&app, Method::GET, "/api/generate/mnemonic?words=0", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) =
            send(&app, Method::GET, "/api/generate/mnemonic?words=500", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    fn fresh_secret() -> String {
        random_owner_secret(DEFAULT_SECRET_BYTES).unwrap()
    }

    async fn register(app: &Router, owner_secret: &str) -> String {
        let (status, created) = send(
            app,
            Method::POST,
            "/api/wallets",
            None,
            Some(json!({ "owner_secret": owner_secret })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        created["wallet_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_and_import_wallet() {
        let app = app();
        let mnemonic = generate_mnemonic(12).unwrap();
        let owner_secret = owner_secret_from_mnemonic(&mnemonic).unwrap();
        let (status, created) = send(
            &app,
            Method::POST,
            "/api/wallets",
            None,
            Some(json!({ "owner_secret": owner_secret })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let wallet_id = created["wallet_id"].as_str().unwrap();
        assert_eq!(created["path"], format!("/w/{}", wallet_id));
        assert!(created.get("owner_secret").is_none());
        assert!(created.get("mnemonic").is_none());

        let recovered = owner_secret_from_mnemonic(&mnemonic.to_uppercase()).unwrap();
        let (status, imported) = send(
            &app,
            Method::POST,
            "/api/wallets/import",
            None,
            Some(json!({ "wallet_id": wallet_id, "owner_secret": recovered })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(imported["wallet_id"], wallet_id);
        assert!(imported.get("owner_secret").is_none());

        let wrong = owner_secret_from_mnemonic("not the phrase").unwrap();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/wallets/import",
            None,
            Some(json!({ "wallet_id": wallet_id, "owner_secret": wrong })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].is_string());

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/wallets/import",
            None,
            Some(json!({ "wallet_id": "no-such-wallet", "owner_secret": owner_secret })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_register_rejects_phrase_and_malformed_secret() {
        let app = app();
        for body in [
            json!({ "owner_secret": "glacier owl echo river" }),
            json!({ "owner_secret": "" }),
            json!({ "mnemonic": "glacier owl echo river" }),
        ] {
            let (status, reply) = send(&app, Method::POST, "/api/wallets", None, Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(reply["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_malformed_bodies_get_json_errors() {
        let app = app();
        let secret = fresh_secret();
        let wallet_id = register(&app, &secret).await;
        let uri = format!("/api/wallets/{}/countdowns", wallet_id);

        let unknown_repeat = json!({ "title": "Launch", "date": "2099-01-01", "repeat": "hourly" });
        let (status, body) =
            send(&app, Method::POST, &uri, Some(&secret), Some(unknown_repeat)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let unknown_reminder = json!({ "title": "Launch", "date": "2099-01-01", "remind_at": "soon" });
        let (status, body) =
            send(&app, Method::POST, "/api/countdowns", None, Some(unknown_reminder)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/countdowns")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].is_string());

        let (status, body) =
            send(&app, Method::GET, "/api/generate/mnemonic?words=many", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_wallet_countdowns() {
        let app = app();
        let secret = fresh_secret();
        let wallet_id = register(&app, &secret).await;
        let uri = format!("/api/wallets/{}/countdowns", wallet_id);

        let (status, _) = send(&app, Method::POST, &uri, None, Some(birthday())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let wrong = "0".repeat(64);
        let (status, _) = send(&app, Method::POST, &uri, Some(&wrong), Some(birthday())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, countdown) =
            send(&app, Method::POST, &uri, Some(&secret), Some(birthday())).await;
        assert_eq!(status, StatusCode::CREATED);
        let token = countdown["token"].as_str().unwrap();
        assert_eq!(countdown["color"], "#4f46e5");
        assert_eq!(
            countdown["share_url"],
            format!("https://count.example/c/{}", token)
        );
        assert_eq!(countdown["time_left"]["state"], "remaining");
        assert!(countdown.get("wallet_id").is_none());

        let (status, wallet) = send(
            &app,
            Method::GET,
            &format!("/api/wallets/{}", wallet_id),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(wallet["countdowns"].as_array().unwrap().len(), 1);
        assert_eq!(wallet["countdowns"][0]["token"], token);
        assert!(wallet.get("owner_secret_hash").is_none());

        let (status, fetched) = send(
            &app,
            Method::GET,
            &format!("/api/countdowns/{}", token),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["title"], "Birthday");
        assert_eq!(fetched["next_occurrence"], "2099-06-01T00:00:00Z");
        assert_eq!(fetched["reminder_at"], "2099-05-31T00:00:00Z");
    }

    #[tokio::test]
    async fn test_invalid_countdown_rejected() {
        let app = app();
        let secret = fresh_secret();
        let wallet_id = register(&app, &secret).await;
        let uri = format!("/api/wallets/{}/countdowns", wallet_id);

        let bad = json!({ "title": "Launch", "date": "2099-13-40" });
        let (status, body) = send(&app, Method::POST, &uri, Some(&secret), Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("date"));

        let timed = json!({ "title": "Launch", "date": "2099-01-01", "all_day": false });
        let (status, _) = send(&app, Method::POST, &uri, Some(&secret), Some(timed)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let ancient = json!({
            "title": "Launch",
            "date": "-262143-01-01",
            "remind_at": "1_week_before"
        });
        let (status, body) = send(&app, Method::POST, &uri, Some(&secret), Some(ancient)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("years"));

        let (status, wallet) = send(
            &app,
            Method::GET,
            &format!("/api/wallets/{}", wallet_id),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(wallet["countdowns"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_standalone_countdown() {
        let app = app();
        let timed = json!({
            "title": "Launch",
            "date": "2099-01-01",
            "time": "09:30",
            "all_day": false,
            "color": "#FF0000"
        });
        let (status, countdown) =
            send(&app, Method::POST, "/api/countdowns", None, Some(timed)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(countdown["target_time"], "2099-01-01T09:30:00Z");
        assert_eq!(countdown["color"], "#ff0000");

        let (status, _) = send(
            &app,
            Method::GET,
            "/api/countdowns/missing-token-here",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/api/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
    }
}
