use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const TOKEN_HEADER: &str = "x-bunker-token";

/// Keys that travel alongside a profile in create/update bodies but are not
/// part of the stored profile.
const OPTION_KEYS: &[&str] = &[
    "request_metadata",
    "finaltime",
    "slidingtime",
    "groupname",
    "groupid",
    "rolename",
    "roleid",
];

#[derive(Clone, Debug)]
pub struct UserRecord {
    pub token: String,
    pub profile: Map<String, Value>,
}

#[derive(Clone, Debug)]
pub struct TokenRecord {
    pub token_type: String,
    pub record: String,
}

#[derive(Default, Debug)]
pub struct Store {
    pub users: HashMap<String, UserRecord>,
    pub tokens: HashMap<String, TokenRecord>,
}

impl Store {
    fn find_user(&self, mode: &str, identity: &str) -> Option<&UserRecord> {
        match mode {
            "token" => self.users.get(identity),
            "email" | "phone" | "login" => self
                .users
                .values()
                .find(|u| u.profile.get(mode).and_then(Value::as_str) == Some(identity)),
            _ => None,
        }
    }

    fn email_taken(&self, email: &str) -> bool {
        self.find_user("email", email).is_some()
    }

    fn insert_user(&mut self, profile: Map<String, Value>) -> UserRecord {
        let record = UserRecord {
            token: Uuid::new_v4().to_string(),
            profile,
        };
        self.users.insert(record.token.clone(), record.clone());
        record
    }
}

pub type Db = Arc<RwLock<Store>>;

/// `Json` extractor whose rejections use the error envelope.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(error(rejection.status(), &rejection.body_text())),
        }
    }
}

#[derive(Deserialize)]
pub struct BulkCreate {
    pub records: Vec<Map<String, Value>>,
}

#[derive(Deserialize)]
pub struct CreateToken {
    pub tokentype: String,
    pub record: String,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/v2/user", post(create_user))
        .route("/v2/users/bulk", post(create_users_bulk))
        .route(
            "/v2/user/{mode}/{identity}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/v2/system/stats", get(system_stats))
        .route("/v2/token", post(create_token))
        .route("/v2/token/{token}", get(get_token).delete(delete_token))
        .fallback(|| async { error(StatusCode::NOT_FOUND, "unknown route") })
        .layer(middleware::from_fn(require_token))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"status": "error", "message": message}))).into_response()
}

fn strip_options(mut body: Map<String, Value>) -> Map<String, Value> {
    for key in OPTION_KEYS {
        body.remove(*key);
    }
    body
}

async fn require_token(headers: HeaderMap, request: Request, next: Next) -> Response {
    let present = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.is_empty());
    if !present {
        return error(StatusCode::UNAUTHORIZED, "missing X-Bunker-Token");
    }
    next.run(request).await
}

async fn create_user(
    State(db): State<Db>,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> Response {
    let profile = strip_options(body);
    if profile.is_empty() {
        return error(StatusCode::BAD_REQUEST, "empty profile");
    }
    let mut store = db.write().await;
    if let Some(email) = profile.get("email").and_then(Value::as_str) {
        if store.email_taken(email) {
            // Application-level failure reported inside a 200 envelope.
            return Json(json!({"status": "error", "message": "duplicate user"})).into_response();
        }
    }
    let user = store.insert_user(profile);
    tracing::debug!(token = %user.token, "user created");
    Json(json!({"status": "ok", "token": user.token})).into_response()
}

async fn create_users_bulk(
    State(db): State<Db>,
    JsonBody(body): JsonBody<BulkCreate>,
) -> Response {
    let mut store = db.write().await;
    let mut created = Vec::with_capacity(body.records.len());
    for record in body.records {
        let profile = match record.get("profile") {
            Some(Value::Object(profile)) => profile.clone(),
            _ => return error(StatusCode::BAD_REQUEST, "record without profile"),
        };
        let user = store.insert_user(profile);
        created.push(json!({"token": user.token, "profile": user.profile}));
    }
    Json(json!({"status": "ok", "created": created})).into_response()
}

async fn get_user(State(db): State<Db>, Path((mode, identity)): Path<(String, String)>) -> Response {
    let store = db.read().await;
    match store.find_user(&mode, &identity) {
        Some(user) => Json(json!({
            "status": "ok",
            "token": user.token,
            "profile": user.profile,
        }))
        .into_response(),
        None => error(StatusCode::NOT_FOUND, "record not found"),
    }
}

async fn update_user(
    State(db): State<Db>,
    Path((mode, identity)): Path<(String, String)>,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> Response {
    let mut store = db.write().await;
    let Some(token) = store.find_user(&mode, &identity).map(|u| u.token.clone()) else {
        return error(StatusCode::NOT_FOUND, "record not found");
    };
    if let Some(user) = store.users.get_mut(&token) {
        user.profile.extend(strip_options(body));
    }
    Json(json!({"status": "ok", "token": token})).into_response()
}

async fn delete_user(State(db): State<Db>, Path((mode, identity)): Path<(String, String)>) -> Response {
    let mut store = db.write().await;
    let Some(token) = store.find_user(&mode, &identity).map(|u| u.token.clone()) else {
        return error(StatusCode::NOT_FOUND, "record not found");
    };
    store.users.remove(&token);
    Json(json!({"status": "ok", "result": "done"})).into_response()
}

async fn system_stats(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    Json(json!({
        "status": "ok",
        "stats": {
            "numusers": store.users.len(),
            "numtokens": store.tokens.len(),
        }
    }))
}

async fn create_token(State(db): State<Db>, JsonBody(body): JsonBody<CreateToken>) -> Response {
    if body.record.is_empty() {
        return error(StatusCode::BAD_REQUEST, "empty record");
    }
    let token = Uuid::new_v4().to_string();
    db.write().await.tokens.insert(
        token.clone(),
        TokenRecord {
            token_type: body.tokentype,
            record: body.record,
        },
    );
    Json(json!({"status": "ok", "tokenuuid": token})).into_response()
}

async fn get_token(State(db): State<Db>, Path(token): Path<String>) -> Response {
    let store = db.read().await;
    match store.tokens.get(&token) {
        Some(record) => Json(json!({
            "status": "ok",
            "tokenuuid": token,
            "tokentype": record.token_type,
            "record": record.record,
        }))
        .into_response(),
        None => error(StatusCode::NOT_FOUND, "token not found"),
    }
}

async fn delete_token(State(db): State<Db>, Path(token): Path<String>) -> Response {
    match db.write().await.tokens.remove(&token) {
        Some(_) => Json(json!({"status": "ok"})).into_response(),
        None => error(StatusCode::NOT_FOUND, "token not found"),
    }
}
