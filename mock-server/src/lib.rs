use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    #[default]
    User,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub name: String,
    pub message: String,
    pub email: String,
    pub phone: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Deserialize)]
pub struct UpdateMe {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateFeedback {
    pub name: String,
    pub message: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

struct Account {
    user: User,
    password: String,
}

/// In-memory backend state. Tokens are opaque UUIDs mapped to a user id.
#[derive(Default)]
pub struct Store {
    accounts: BTreeMap<i64, Account>,
    feedback: BTreeMap<i64, Feedback>,
    tokens: BTreeMap<String, i64>,
    next_user_id: i64,
    next_feedback_id: i64,
}

pub type Db = Arc<RwLock<Store>>;

/// `{detail}` error body, the shape every failure uses.
pub struct Failure {
    status: StatusCode,
    detail: String,
}

impl Failure {
    fn new(status: StatusCode, detail: &str) -> Self {
        Self {
            status,
            detail: detail.to_string(),
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/health", get(health))
        .route("/auth/token", post(login))
        .route("/auth/register", post(register))
        .route("/api/users/me", get(me).put(update_me))
        .route("/api/admin/users", get(list_users))
        .route(
            "/api/admin/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/feedback/", get(list_feedback).post(create_feedback))
        .route("/api/feedback/{id}", axum::routing::delete(delete_feedback))
        .route("/api/moderator/feedbacks", get(list_feedback))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock backend listening");
    }
    axum::serve(listener, app()).await
}

/// Resolve the bearer token to a user, optionally requiring one of `roles`.
/// Admins pass every role check.
async fn authenticate(db: &Db, headers: &HeaderMap, roles: &[Role]) -> Result<User, Failure> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| Failure::new(StatusCode::UNAUTHORIZED, "Not authenticated"))?;

    let store = db.read().await;
    let user = store
        .tokens
        .get(token)
        .and_then(|id| store.accounts.get(id))
        .map(|account| account.user.clone())
        .ok_or_else(|| Failure::new(StatusCode::UNAUTHORIZED, "Could not validate credentials"))?;

    if !roles.is_empty() && user.role != Role::Admin && !roles.contains(&user.role) {
        return Err(Failure::new(StatusCode::FORBIDDEN, "Not enough permissions"));
    }
    Ok(user)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "database": "connected" }))
}

async fn login(State(db): State<Db>, Form(form): Form<LoginForm>) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    let id = store
        .accounts
        .values()
        .find(|a| a.user.username == form.username && a.password == form.password)
        .map(|a| a.user.id)
        .ok_or_else(|| Failure::new(StatusCode::UNAUTHORIZED, "Incorrect username or password"))?;

    let token = Uuid::new_v4().to_string();
    store.tokens.insert(token.clone(), id);
    Ok(Json(json!({ "access_token": token, "token_type": "bearer" })))
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<RegisterUser>,
) -> Result<Json<User>, Failure> {
    let mut store = db.write().await;
    if store.accounts.values().any(|a| a.user.username == input.username) {
        return Err(Failure::new(StatusCode::BAD_REQUEST, "Username already registered"));
    }
    store.next_user_id += 1;
    let user = User {
        id: store.next_user_id,
        username: input.username,
        email: input.email,
        role: input.role,
        is_active: true,
    };
    store.accounts.insert(
        user.id,
        Account {
            user: user.clone(),
            password: input.password,
        },
    );
    Ok(Json(user))
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> Result<Json<User>, Failure> {
    authenticate(&db, &headers, &[]).await.map(Json)
}

async fn update_me(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<UpdateMe>,
) -> Result<Json<User>, Failure> {
    let current = authenticate(&db, &headers, &[]).await?;
    let mut store = db.write().await;
    let account = store
        .accounts
        .get_mut(&current.id)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "User not found"))?;
    if let Some(email) = input.email {
        account.user.email = email;
    }
    if let Some(password) = input.password {
        account.password = password;
    }
    Ok(Json(account.user.clone()))
}

async fn list_users(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<User>>, Failure> {
    authenticate(&db, &headers, &[Role::Admin]).await?;
    let store = db.read().await;
    Ok(Json(store.accounts.values().map(|a| a.user.clone()).collect()))
}

async fn get_user(
    State(db): State<Db>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<User>, Failure> {
    authenticate(&db, &headers, &[Role::Admin]).await?;
    let store = db.read().await;
    store
        .accounts
        .get(&id)
        .map(|a| Json(a.user.clone()))
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "User not found"))
}

async fn update_user(
    State(db): State<Db>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(input): Json<UpdateUser>,
) -> Result<Json<User>, Failure> {
    authenticate(&db, &headers, &[Role::Admin]).await?;
    let mut store = db.write().await;
    let account = store
        .accounts
        .get_mut(&id)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "User not found"))?;
    if let Some(username) = input.username {
        account.user.username = username;
    }
    if let Some(email) = input.email {
        account.user.email = email;
    }
    if let Some(password) = input.password {
        account.password = password;
    }
    if let Some(role) = input.role {
        account.user.role = role;
    }
    Ok(Json(account.user.clone()))
}

async fn delete_user(
    State(db): State<Db>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Value>, Failure> {
    authenticate(&db, &headers, &[Role::Admin]).await?;
    let mut store = db.write().await;
    store
        .accounts
        .remove(&id)
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "User not found"))?;
    store.tokens.retain(|_, owner| *owner != id);
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

async fn create_feedback(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateFeedback>,
) -> Result<Json<CreateFeedback>, Failure> {
    authenticate(&db, &headers, &[]).await?;
    let name_len = input.name.chars().count();
    if !(2..=50).contains(&name_len) {
        return Err(Failure::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "name must be 2 to 50 characters",
        ));
    }
    if !(10..=2000).contains(&input.message.chars().count()) {
        return Err(Failure::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "message must be 10 to 2000 characters",
        ));
    }

    let mut store = db.write().await;
    store.next_feedback_id += 1;
    let feedback = Feedback {
        id: store.next_feedback_id,
        name: input.name.clone(),
        message: input.message.clone(),
        email: input.email.clone(),
        phone: input.phone.clone(),
    };
    store.feedback.insert(feedback.id, feedback);
    Ok(Json(input))
}

/// Serves both `GET /api/feedback/` (any user) and the moderator listing;
/// the route decides which roles apply.
async fn list_feedback(
    State(db): State<Db>,
    uri: axum::http::Uri,
    headers: HeaderMap,
) -> Result<Json<Vec<Feedback>>, Failure> {
    let roles: &[Role] = if uri.path().starts_with("/api/moderator") {
        &[Role::Moderator]
    } else {
        &[]
    };
    authenticate(&db, &headers, roles).await?;
    let store = db.read().await;
    Ok(Json(store.feedback.values().cloned().collect()))
}

async fn delete_feedback(
    State(db): State<Db>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Value>, Failure> {
    authenticate(&db, &headers, &[Role::Moderator]).await?;
    let mut store = db.write().await;
    store
        .feedback
        .remove(&id)
        .map(|_| Json(json!({ "message": "Feedback deleted successfully" })))
        .ok_or_else(|| Failure::new(StatusCode::NOT_FOUND, "Feedback not found"))
}
