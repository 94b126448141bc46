//! In-process stub of the user REST backend.
//!
//! The harness owns a single-threaded Tokio runtime plus a `LocalSet` because
//! Actix uses `spawn_local` internally. Client calls made through
//! [`StubHarness::block_on`] share that runtime with the server.

use std::collections::HashMap;
use std::future::Future;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, web};
use serde_json::{Value, json};
use tokio::runtime::Runtime;
use tokio::task::LocalSet;
use url::Url;

/// Backend operation addressed by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    List,
    Fetch,
    Create,
    Update,
    Delete,
}

/// One request observed by the stub.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub route: Route,
    pub id: Option<u64>,
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct StubState {
    users: Vec<Value>,
    last_id: u64,
    failures: HashMap<Route, u16>,
    delays: HashMap<Route, Duration>,
    requests: Vec<RecordedRequest>,
}

/// Shared, scriptable backend state.
#[derive(Debug, Clone, Default)]
pub struct StubBackend {
    state: Arc<Mutex<StubState>>,
}

impl StubBackend {
    /// Backend seeded with `users`; created records continue after the
    /// highest seeded id.
    pub fn with_users(users: Vec<Value>) -> Self {
        let last_id = users
            .iter()
            .filter_map(|user| user.get("id").and_then(Value::as_u64))
            .max()
            .unwrap_or(0);
        Self {
            state: Arc::new(Mutex::new(StubState {
                users,
                last_id,
                ..StubState::default()
            })),
        }
    }

    /// Answer every request for `route` with `status`.
    pub fn fail(&self, route: Route, status: u16) {
        self.lock().failures.insert(route, status);
    }

    /// Hold every response for `route` by `delay`.
    pub fn stall(&self, route: Route, delay: Duration) {
        self.lock().delays.insert(route, delay);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    pub fn request_count(&self, route: Route) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|request| request.route == route)
            .count()
    }

    pub fn stored_ids(&self) -> Vec<u64> {
        self.lock()
            .users
            .iter()
            .filter_map(|user| user.get("id").and_then(Value::as_u64))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StubState> {
        self.state.lock().expect("stub state mutex")
    }

    fn record(
        &self,
        route: Route,
        id: Option<u64>,
        body: Option<Value>,
    ) -> (Option<u16>, Option<Duration>) {
        let mut state = self.lock();
        state.requests.push(RecordedRequest { route, id, body });
        (
            state.failures.get(&route).copied(),
            state.delays.get(&route).copied(),
        )
    }

    async fn intercept(
        &self,
        route: Route,
        id: Option<u64>,
        body: Option<Value>,
    ) -> Option<HttpResponse> {
        let (failure, delay) = self.record(route, id, body);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        failure.map(|status| {
            let code = StatusCode::from_u16(status).expect("valid stub status");
            HttpResponse::build(code).json(json!({ "error": "stub failure" }))
        })
    }
}

async fn list_users(backend: web::Data<StubBackend>) -> HttpResponse {
    if let Some(response) = backend.intercept(Route::List, None, None).await {
        return response;
    }
    HttpResponse::Ok().json(backend.lock().users.clone())
}

async fn fetch_user(backend: web::Data<StubBackend>, path: web::Path<u64>) -> HttpResponse {
    let id = path.into_inner();
    if let Some(response) = backend.intercept(Route::Fetch, Some(id), None).await {
        return response;
    }
    let state = backend.lock();
    match state.users.iter().find(|user| has_id(user, id)) {
        Some(user) => HttpResponse::Ok().json(user),
        None => HttpResponse::NotFound().json(json!({})),
    }
}

async fn create_user(backend: web::Data<StubBackend>, body: web::Json<Value>) -> HttpResponse {
    let payload = body.into_inner();
    if let Some(response) = backend
        .intercept(Route::Create, None, Some(payload.clone()))
        .await
    {
        return response;
    }
    let mut state = backend.lock();
    state.last_id += 1;
    let record = with_id(payload, state.last_id);
    state.users.push(record.clone());
    HttpResponse::Created().json(record)
}

async fn update_user(
    backend: web::Data<StubBackend>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> HttpResponse {
    let id = path.into_inner();
    let payload = body.into_inner();
    if let Some(response) = backend
        .intercept(Route::Update, Some(id), Some(payload.clone()))
        .await
    {
        return response;
    }
    let mut state = backend.lock();
    match state.users.iter_mut().find(|user| has_id(user, id)) {
        Some(user) => {
            *user = with_id(payload, id);
            HttpResponse::Ok().json(user.clone())
        }
        None => HttpResponse::NotFound().json(json!({})),
    }
}

async fn delete_user(backend: web::Data<StubBackend>, path: web::Path<u64>) -> HttpResponse {
    let id = path.into_inner();
    if let Some(response) = backend.intercept(Route::Delete, Some(id), None).await {
        return response;
    }
    let mut state = backend.lock();
    let before = state.users.len();
    state.users.retain(|user| !has_id(user, id));
    if state.users.len() == before {
        HttpResponse::NotFound().json(json!({}))
    } else {
        HttpResponse::Ok().json(json!({}))
    }
}

fn has_id(user: &Value, id: u64) -> bool {
    user.get("id").and_then(Value::as_u64) == Some(id)
}

fn with_id(mut payload: Value, id: u64) -> Value {
    if let Some(object) = payload.as_object_mut() {
        object.insert("id".to_owned(), json!(id));
    }
    payload
}

/// JSON record as the backend stores it.
pub fn user_json(id: u64, first_name: &str, last_name: &str) -> Value {
    json!({
        "id": id,
        "firstName": first_name,
        "lastName": last_name,
        "email": format!("{}@example.org", first_name.to_lowercase()),
        "phone": "0123456789",
    })
}

async fn spawn_stub_server(backend: StubBackend) -> Result<(Url, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
    let addr = listener.local_addr().map_err(|err| err.to_string())?;
    let data = web::Data::new(backend);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .service(
                web::resource("/users")
                    .route(web::get().to(list_users))
                    .route(web::post().to(create_user)),
            )
            .service(
                web::resource("/users/{id}")
                    .route(web::get().to(fetch_user))
                    .route(web::put().to(update_user))
                    .route(web::delete().to(delete_user)),
            )
    })
    .disable_signals()
    .workers(1)
    .listen(listener)
    .map_err(|err| err.to_string())?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);

    let base_url = Url::parse(&format!("http://{addr}")).map_err(|err| err.to_string())?;
    Ok((base_url, handle))
}

/// Running stub server plus the runtime that drives it.
pub struct StubHarness {
    runtime: Runtime,
    local: LocalSet,
    handle: ServerHandle,
    base_url: Url,
    backend: StubBackend,
}

impl StubHarness {
    pub fn start(backend: StubBackend) -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");
        let local = LocalSet::new();
        let (base_url, handle) = local
            .block_on(&runtime, spawn_stub_server(backend.clone()))
            .expect("stub server starts");
        Self {
            runtime,
            local,
            handle,
            base_url,
            backend,
        }
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub const fn backend(&self) -> &StubBackend {
        &self.backend
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.local.block_on(&self.runtime, future)
    }
}

impl Drop for StubHarness {
    fn drop(&mut self) {
        self.local.block_on(&self.runtime, self.handle.stop(false));
    }
}
