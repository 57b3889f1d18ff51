//! Remote API collaborator.
//!
//! [`SetApi`] is the seam between the session core and the network: one
//! method per endpoint. [`HttpSetApi`] implements it over HTTP+JSON with a
//! bearer credential obtained from a [`TokenSource`].

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::models::{
    Comparison, NewSetBody, PreviousPerformance, Recommendation, Set, SetFields, SetId, SetList,
};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use log::{debug, info, warn};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::rc::Rc;

/// Remote calls used by the session. Futures are local: the client runs on a
/// single-threaded event loop.
pub trait SetApi {
    /// `GET /workouts/{workoutId}/sets?exercise_id=...`
    fn list_sets(
        &self,
        workout_id: &str,
        exercise_id: &str,
    ) -> LocalBoxFuture<'_, Result<Option<Vec<Set>>, ApiError>>;

    /// `POST /workouts/{workoutId}/sets`
    fn create_set(&self, workout_id: &str, body: NewSetBody)
        -> LocalBoxFuture<'_, Result<Set, ApiError>>;

    /// `PATCH /sets/{id}`; `None` when the server answers without a body.
    fn update_set(&self, id: &SetId, fields: SetFields)
        -> LocalBoxFuture<'_, Result<Option<Set>, ApiError>>;

    /// `DELETE /sets/{id}`
    fn delete_set(&self, id: &SetId) -> LocalBoxFuture<'_, Result<(), ApiError>>;

    /// `GET /users/{userId}/exercises/{exerciseId}/recommend-set-parameters`
    fn recommend_set_parameters(
        &self,
        user_id: &str,
        exercise_id: &str,
    ) -> LocalBoxFuture<'_, Result<Recommendation, ApiError>>;

    /// `GET /workouts/exercise/{exerciseId}/previous-performance`
    fn previous_performance(&self, exercise_id: &str)
        -> LocalBoxFuture<'_, Result<Comparison, ApiError>>;
}

/// Supplies the bearer credential kept by the authentication collaborator.
pub trait TokenSource {
    fn bearer_token(&self) -> Option<String>;
}

/// A fixed credential, for embedding hosts that already hold one.
#[derive(Clone, Debug, Default)]
pub struct StaticToken(pub Option<String>);

impl TokenSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Reads the credential from browser local storage on every call, so a
/// token refreshed by the auth layer is picked up without a reload.
#[derive(Clone, Debug)]
pub struct LocalStorageToken {
    key: String,
}

impl LocalStorageToken {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl TokenSource for LocalStorageToken {
    fn bearer_token(&self) -> Option<String> {
        let storage = gloo_utils::window().local_storage().ok()??;
        storage.get_item(&self.key).ok()?
    }
}

/// Accepts both a bare object and one wrapped in `{"data": ...}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

/// Pull a human-readable message out of an error body, if there is one.
pub(crate) fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message", "detail"].iter().find_map(|key| match value.get(key)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Object(inner) => inner
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string),
        _ => None,
    })
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str::<Envelope<T>>(body)
        .map(Envelope::into_inner)
        .map_err(|e| ApiError::Decode(e.to_string()))
}

fn require_id(set: Set) -> Result<Set, ApiError> {
    if set.id.is_none() {
        return Err(ApiError::Decode("set without id".to_string()));
    }
    Ok(set)
}

pub struct HttpSetApi {
    client: reqwest::Client,
    base_url: String,
    token: Rc<dyn TokenSource>,
}

impl HttpSetApi {
    pub fn new(config: &ClientConfig, token: Rc<dyn TokenSource>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.client.request(method, self.url(path));
        match self.token.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send and turn any non-2xx status into an error.
    async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
        let response = Self::send_raw(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(Self::error_from(response).await)
    }

    async fn send_raw(request: RequestBuilder) -> Result<Response, ApiError> {
        request.send().await.map_err(|e| {
            warn!("Request failed before reaching the server: {}", e);
            ApiError::Network(e.to_string())
        })
    }

    async fn error_from(response: Response) -> ApiError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .ok()
            .and_then(|body| server_message(&body));
        warn!("HTTP {}: {}", status, message.as_deref().unwrap_or("<no message>"));
        ApiError::remote(status, message)
    }

    async fn body(response: Response) -> Result<String, ApiError> {
        response
            .text()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl SetApi for HttpSetApi {
    fn list_sets(
        &self,
        workout_id: &str,
        exercise_id: &str,
    ) -> LocalBoxFuture<'_, Result<Option<Vec<Set>>, ApiError>> {
        let request = self
            .request(Method::GET, &format!("/workouts/{}/sets", workout_id))
            .query(&[("exercise_id", exercise_id)]);
        async move {
            let response = Self::send(request).await?;
            let list: SetList = serde_json::from_str(&Self::body(response).await?)
                .map_err(|e| ApiError::Decode(e.to_string()))?;
            info!(
                "Loaded {} sets",
                list.data.as_ref().map(Vec::len).unwrap_or(0)
            );
            Ok(list.data)
        }
        .boxed_local()
    }

    fn create_set(
        &self,
        workout_id: &str,
        body: NewSetBody,
    ) -> LocalBoxFuture<'_, Result<Set, ApiError>> {
        let request = self
            .request(Method::POST, &format!("/workouts/{}/sets", workout_id))
            .json(&body);
        async move {
            let response = Self::send(request).await?;
            let set = require_id(decode(&Self::body(response).await?)?)?;
            info!("Created set {}", set.id.as_ref().map(SetId::as_str).unwrap_or("?"));
            Ok(set)
        }
        .boxed_local()
    }

    fn update_set(
        &self,
        id: &SetId,
        fields: SetFields,
    ) -> LocalBoxFuture<'_, Result<Option<Set>, ApiError>> {
        let request = self
            .request(Method::PATCH, &format!("/sets/{}", id))
            .json(&fields);
        let id = id.clone();
        async move {
            let response = Self::send(request).await?;
            let body = Self::body(response).await?;
            info!("Updated set {}", id);
            if body.trim().is_empty() {
                return Ok(None);
            }
            // Some deployments answer with a status object instead of the set.
            match decode::<Set>(&body) {
                Ok(set) => Ok(Some(set)),
                Err(e) => {
                    debug!("PATCH body is not a set ({}), merging local draft", e);
                    Ok(None)
                }
            }
        }
        .boxed_local()
    }

    fn delete_set(&self, id: &SetId) -> LocalBoxFuture<'_, Result<(), ApiError>> {
        let request = self.request(Method::DELETE, &format!("/sets/{}", id));
        let id = id.clone();
        async move {
            Self::send(request).await?;
            info!("Deleted set {}", id);
            Ok(())
        }
        .boxed_local()
    }

    fn recommend_set_parameters(
        &self,
        user_id: &str,
        exercise_id: &str,
    ) -> LocalBoxFuture<'_, Result<Recommendation, ApiError>> {
        let request = self.request(
            Method::GET,
            &format!(
                "/users/{}/exercises/{}/recommend-set-parameters",
                user_id, exercise_id
            ),
        );
        async move {
            let response = Self::send(request).await?;
            decode(&Self::body(response).await?)
        }
        .boxed_local()
    }

    fn previous_performance(
        &self,
        exercise_id: &str,
    ) -> LocalBoxFuture<'_, Result<Comparison, ApiError>> {
        let request = self.request(
            Method::GET,
            &format!("/workouts/exercise/{}/previous-performance", exercise_id),
        );
        async move {
            let response = Self::send_raw(request).await?;
            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                debug!("No previous performance recorded");
                return Ok(Comparison::NoPriorData);
            }
            if !status.is_success() {
                return Err(Self::error_from(response).await);
            }
            let previous: PreviousPerformance = decode(&Self::body(response).await?)?;
            Ok(Comparison::Previous(previous))
        }
        .boxed_local()
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted in-memory API for driving the session in tests.

    use super::*;
    use futures::channel::oneshot;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    type Reply<T> = Result<T, ApiError>;

    enum Scripted<T> {
        Ready(Reply<T>),
        Deferred(oneshot::Receiver<Reply<T>>),
    }

    /// Replies handed out in FIFO order, one per call.
    pub(crate) struct Script<T>(RefCell<VecDeque<Scripted<T>>>);

    impl<T: 'static> Script<T> {
        fn new() -> Self {
            Self(RefCell::new(VecDeque::new()))
        }

        pub(crate) fn reply(&self, reply: Reply<T>) {
            self.0.borrow_mut().push_back(Scripted::Ready(reply));
        }

        /// Queue a reply that stays pending until the sender fires.
        pub(crate) fn defer(&self) -> oneshot::Sender<Reply<T>> {
            let (tx, rx) = oneshot::channel();
            self.0.borrow_mut().push_back(Scripted::Deferred(rx));
            tx
        }

        fn next(&self) -> LocalBoxFuture<'static, Reply<T>> {
            match self.0.borrow_mut().pop_front() {
                Some(Scripted::Ready(reply)) => futures::future::ready(reply).boxed_local(),
                Some(Scripted::Deferred(rx)) => async move {
                    rx.await
                        .unwrap_or_else(|_| Err(ApiError::Network("reply dropped".into())))
                }
                .boxed_local(),
                None => futures::future::ready(Err(ApiError::Network("no scripted reply".into())))
                    .boxed_local(),
            }
        }
    }

    pub(crate) struct FakeApi {
        pub list: Script<Option<Vec<Set>>>,
        pub create: Script<Set>,
        pub update: Script<Option<Set>>,
        pub delete: Script<()>,
        pub recommend: Script<Recommendation>,
        pub previous: Script<Comparison>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeApi {
        pub(crate) fn new() -> Self {
            Self {
                list: Script::new(),
                create: Script::new(),
                update: Script::new(),
                delete: Script::new(),
                recommend: Script::new(),
                previous: Script::new(),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        pub(crate) fn count(&self, prefix: &str) -> usize {
            self.calls
                .borrow()
                .iter()
                .filter(|c| c.starts_with(prefix))
                .count()
        }

        fn record(&self, call: String) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl SetApi for FakeApi {
        fn list_sets(
            &self,
            workout_id: &str,
            exercise_id: &str,
        ) -> LocalBoxFuture<'_, Result<Option<Vec<Set>>, ApiError>> {
            self.record(format!("GET sets {} {}", workout_id, exercise_id));
            self.list.next()
        }

        fn create_set(
            &self,
            workout_id: &str,
            body: NewSetBody,
        ) -> LocalBoxFuture<'_, Result<Set, ApiError>> {
            self.record(format!("POST {} #{}", workout_id, body.set_number));
            self.create.next()
        }

        fn update_set(
            &self,
            id: &SetId,
            _fields: SetFields,
        ) -> LocalBoxFuture<'_, Result<Option<Set>, ApiError>> {
            self.record(format!("PATCH {}", id));
            self.update.next()
        }

        fn delete_set(&self, id: &SetId) -> LocalBoxFuture<'_, Result<(), ApiError>> {
            self.record(format!("DELETE {}", id));
            self.delete.next()
        }

        fn recommend_set_parameters(
            &self,
            user_id: &str,
            exercise_id: &str,
        ) -> LocalBoxFuture<'_, Result<Recommendation, ApiError>> {
            self.record(format!("GET recommend {} {}", user_id, exercise_id));
            self.recommend.next()
        }

        fn previous_performance(
            &self,
            exercise_id: &str,
        ) -> LocalBoxFuture<'_, Result<Comparison, ApiError>> {
            self.record(format!("GET previous {}", exercise_id));
            self.previous.next()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_server_messages() {
        assert_eq!(
            server_message(r#"{"error": "Workout is closed"}"#).as_deref(),
            Some("Workout is closed")
        );
        assert_eq!(
            server_message(r#"{"detail": "Not found"}"#).as_deref(),
            Some("Not found")
        );
        assert_eq!(
            server_message(r#"{"error": {"message": "bad rir"}}"#).as_deref(),
            Some("bad rir")
        );
        assert_eq!(server_message(r#"{"error": ""}"#), None);
        assert_eq!(server_message("<html>502</html>"), None);
    }

    #[test]
    fn decodes_wrapped_and_bare_sets() {
        let bare: Set = decode(r#"{"id": 7, "set_number": 1, "actual_weight": 80, "actual_reps": 5}"#)
            .unwrap();
        let wrapped: Set = decode(
            r#"{"data": {"id": 7, "set_number": 1, "actual_weight": 80, "actual_reps": 5}}"#,
        )
        .unwrap();
        assert_eq!(bare, wrapped);
        assert!(matches!(decode::<Set>("[]"), Err(ApiError::Decode(_))));
    }

    #[test]
    fn created_set_must_carry_id() {
        let set: Set = decode(r#"{"set_number": 1, "actual_weight": 80, "actual_reps": 5}"#).unwrap();
        assert!(matches!(require_id(set), Err(ApiError::Decode(_))));
    }

    #[test]
    fn urls_join_base_and_path() {
        let api = HttpSetApi::new(
            &ClientConfig {
                base_url: "https://gym.example/api/".into(),
            },
            Rc::new(StaticToken(None)),
        );
        assert_eq!(api.url("/sets/4"), "https://gym.example/api/sets/4");
    }
}
