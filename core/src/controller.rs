//! Session controller: one method per user action.
//!
//! # Design
//! `Controller` owns everything a user action touches: the API client, the
//! transport, the session and the presenter. Callers hold it explicitly and
//! nothing is global. Each operation validates its input, makes its request,
//! updates the session and renders exactly one envelope. The outcome is
//! also returned so callers can react to it (the CLI picks an exit code).
//!
//! Session invalidation is status-driven:
//! - 401 and 403 responses clear the session from any operation;
//! - any HTTP failure of the current-user fetch clears it;
//! - any failure after login was dispatched clears it.
//!
//! Transport failures elsewhere leave the session alone.

use std::io::Write;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::envelope::ApiResult;
use crate::error::ApiError;
use crate::http::{HttpMethod, Transport};
use crate::presenter::Presenter;
use crate::session::{Session, SessionState, TokenStore};
use crate::types::{
    Credentials, Feedback, NewFeedback, ProfileUpdate, Registration, TokenResponse, User,
    UserUpdate,
};

const ME: &str = "/api/users/me";

pub struct Controller<T, S, W>
where
    T: Transport,
    S: TokenStore,
    W: Write,
{
    client: ApiClient,
    transport: T,
    session: Session<S>,
    presenter: Presenter<W>,
}

impl<T, S, W> Controller<T, S, W>
where
    T: Transport,
    S: TokenStore,
    W: Write,
{
    pub fn new(client: ApiClient, transport: T, session: Session<S>, presenter: Presenter<W>) -> Self {
        Self {
            client,
            transport,
            session,
            presenter,
        }
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn presenter_mut(&mut self) -> &mut Presenter<W> {
        &mut self.presenter
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Exchange credentials for a token, then load the user it belongs to.
    pub fn login(&mut self, credentials: &Credentials) -> Result<User, ApiError> {
        credentials.validate().or_else(|e| self.fail(e))?;

        match self.try_login(credentials) {
            Ok((status, user)) => {
                info!(username = %user.username, "logged in");
                self.announce("Login successful", "user", &user, status);
                Ok(user)
            }
            Err(err) => {
                self.invalidate("login failed");
                self.fail(err)
            }
        }
    }

    fn try_login(&mut self, credentials: &Credentials) -> Result<(Option<u16>, User), ApiError> {
        let request = self.client.build_login(credentials);
        let result = self.client.send(&self.transport, &request)?;
        let token: TokenResponse = decode(&result)?;
        if token.access_token.is_empty() {
            return Err(ApiError::Deserialization(
                "login response carried an empty access_token".to_string(),
            ));
        }
        self.session.set_token(&token.access_token)?;

        let me = self.dispatch(HttpMethod::Get, ME, None)?;
        let user: User = decode(&me)?;
        self.session.set_user(user.clone());
        Ok((me.status, user))
    }

    pub fn register(&mut self, registration: &Registration) -> Result<User, ApiError> {
        let outcome = registration
            .validate()
            .and_then(|()| to_body(registration))
            .and_then(|body| self.dispatch(HttpMethod::Post, "/auth/register", Some(body)))
            .and_then(|result| decode::<User>(&result).map(|user| (result.status, user)));

        match outcome {
            Ok((status, user)) => {
                self.announce("Registration successful", "user", &user, status);
                Ok(user)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Fetch and cache the user behind the current token.
    pub fn current_user(&mut self) -> Result<User, ApiError> {
        match self.fetch_current_user() {
            Ok((result, user)) => {
                self.presenter.present_result(&result);
                Ok(user)
            }
            Err(err) => self.fail(err),
        }
    }

    fn fetch_current_user(&mut self) -> Result<(ApiResult, User), ApiError> {
        let outcome = self
            .dispatch(HttpMethod::Get, ME, None)
            .and_then(|result| decode::<User>(&result).map(|user| (result, user)));

        match outcome {
            Ok((result, user)) => {
                self.session.set_user(user.clone());
                Ok((result, user))
            }
            Err(err) => {
                if matches!(err, ApiError::Http { .. } | ApiError::Deserialization(_)) {
                    self.invalidate("current user could not be loaded");
                }
                Err(err)
            }
        }
    }

    /// Startup check: when a token was persisted, try to load its user.
    /// Renders nothing; failures follow the current-user clearing rules.
    pub fn restore(&mut self) -> Option<User> {
        if self.session.state() == SessionState::LoggedOut {
            return None;
        }
        match self.fetch_current_user() {
            Ok((_, user)) => Some(user),
            Err(err) => {
                info!(error = %err, "stored token could not be restored");
                None
            }
        }
    }

    /// Render the local session without contacting the server.
    pub fn status(&mut self) -> SessionState {
        let state = self.session.state();
        let shown = json!({
            "state": state.as_str(),
            "user": self.session.current_user(),
        });
        self.presenter.present(&shown, None);
        state
    }

    /// Always succeeds; a store that fails to clear is only logged.
    pub fn logout(&mut self) {
        self.invalidate("logout");
        self.presenter
            .present(&json!({"message": "Logout successful"}), None);
    }

    pub fn update_current_user(&mut self, update: ProfileUpdate) -> Result<User, ApiError> {
        let outcome = update
            .normalized()
            .and_then(|update| to_body(&update))
            .and_then(|body| self.dispatch(HttpMethod::Put, ME, Some(body)))
            .and_then(|result| decode::<User>(&result).map(|user| (result.status, user)));

        match outcome {
            Ok((status, user)) => {
                self.session.set_user(user.clone());
                self.announce("Profile updated", "user", &user, status);
                Ok(user)
            }
            Err(err) => self.fail(err),
        }
    }

    // -----------------------------------------------------------------------
    // Admin
    // -----------------------------------------------------------------------

    pub fn list_users(&mut self) -> Result<Vec<User>, ApiError> {
        self.fetch(HttpMethod::Get, "/api/admin/users")
    }

    pub fn get_user(&mut self, id: i64) -> Result<User, ApiError> {
        self.fetch(HttpMethod::Get, &format!("/api/admin/users/{id}"))
    }

    pub fn update_user(&mut self, id: i64, update: UserUpdate) -> Result<User, ApiError> {
        let endpoint = format!("/api/admin/users/{id}");
        let outcome = update
            .normalized()
            .and_then(|update| to_body(&update))
            .and_then(|body| self.dispatch(HttpMethod::Put, &endpoint, Some(body)))
            .and_then(|result| decode::<User>(&result).map(|user| (result.status, user)));

        match outcome {
            Ok((status, user)) => {
                self.announce("User updated", "user", &user, status);
                Ok(user)
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn delete_user(&mut self, id: i64) -> Result<Value, ApiError> {
        let endpoint = format!("/api/admin/users/{id}");
        self.remove(&endpoint, "User deleted")
    }

    // -----------------------------------------------------------------------
    // Feedback
    // -----------------------------------------------------------------------

    /// Submit feedback. The server echoes the submission without an id, so
    /// the raw payload is returned.
    pub fn create_feedback(&mut self, feedback: &NewFeedback) -> Result<Value, ApiError> {
        let outcome = feedback
            .validate()
            .and_then(|()| to_body(feedback))
            .and_then(|body| self.dispatch(HttpMethod::Post, "/api/feedback/", Some(body)));

        match outcome {
            Ok(result) => {
                self.announce("Feedback created", "feedback", &result.data, result.status);
                Ok(result.data)
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn list_feedback(&mut self) -> Result<Vec<Feedback>, ApiError> {
        self.fetch(HttpMethod::Get, "/api/feedback/")
    }

    /// Moderator view over every submission.
    pub fn list_all_feedback(&mut self) -> Result<Vec<Feedback>, ApiError> {
        self.fetch(HttpMethod::Get, "/api/moderator/feedbacks")
    }

    pub fn delete_feedback(&mut self, id: i64) -> Result<Value, ApiError> {
        let endpoint = format!("/api/feedback/{id}");
        self.remove(&endpoint, "Feedback deleted")
    }

    // -----------------------------------------------------------------------
    // System
    // -----------------------------------------------------------------------

    pub fn health(&mut self) -> Result<ApiResult, ApiError> {
        self.request(HttpMethod::Get, "/api/health", None)
    }

    /// Raw facade call: send anything, render whatever comes back.
    pub fn request(
        &mut self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<ApiResult, ApiError> {
        match self.dispatch(method, endpoint, body) {
            Ok(result) => {
                self.presenter.present_result(&result);
                Ok(result)
            }
            Err(err) => self.fail(err),
        }
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    /// Build, send and classify one request with the current token.
    fn dispatch(
        &mut self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<ApiResult, ApiError> {
        let request = self
            .client
            .build_request(method, endpoint, body.as_ref(), self.session.token())?;
        let result = self.client.send(&self.transport, &request);
        if let Err(err) = &result {
            if err.is_auth_failure() {
                self.invalidate("server rejected credentials");
            }
        }
        result
    }

    /// Dispatch a body-less request, render the envelope and decode it.
    fn fetch<D: DeserializeOwned>(&mut self, method: HttpMethod, endpoint: &str) -> Result<D, ApiError> {
        let outcome = self
            .dispatch(method, endpoint, None)
            .and_then(|result| decode::<D>(&result).map(|data| (result, data)));

        match outcome {
            Ok((result, data)) => {
                self.presenter.present_result(&result);
                Ok(data)
            }
            Err(err) => self.fail(err),
        }
    }

    fn remove(&mut self, endpoint: &str, message: &str) -> Result<Value, ApiError> {
        match self.dispatch(HttpMethod::Delete, endpoint, None) {
            Ok(result) => {
                self.announce(message, "result", &result.data, result.status);
                Ok(result.data)
            }
            Err(err) => self.fail(err),
        }
    }

    fn announce<D: Serialize>(&mut self, message: &str, key: &str, data: &D, status: Option<u16>) {
        let mut shown = json!({ "message": message });
        shown[key] = json!(data);
        self.presenter.present(&shown, status);
    }

    fn invalidate(&mut self, reason: &str) {
        if self.session.state() == SessionState::LoggedIn || self.session.current_user().is_some() {
            info!(reason, "clearing session");
        }
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "failed to clear token store");
        }
    }

    fn fail<R>(&mut self, err: ApiError) -> Result<R, ApiError> {
        if let ApiError::Validation(message) = &err {
            info!(%message, "input rejected");
        }
        self.presenter.present_error(&err);
        Err(err)
    }
}

fn to_body<B: Serialize>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn decode<D: DeserializeOwned>(result: &ApiResult) -> Result<D, ApiError> {
    D::deserialize(&result.data).map_err(|e| ApiError::Deserialization(e.to_string()))
}
