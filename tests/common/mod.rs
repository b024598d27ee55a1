#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use pantry_console::{
    auth::SessionSettings,
    collection::{CUSTOMERS, EMPLOYEES, ORDERS},
    store::{Criteria, InMemoryStore, Record, RecordStore},
    AppError, AppState, Collection, CollectionSchema, ColumnInfo, ColumnKind, RecordRepository, Views,
};
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

pub fn pantry_store() -> InMemoryStore {
    InMemoryStore::new()
        .with_collection(
            CUSTOMERS,
            &[
                ("first_name", ColumnKind::Text),
                ("last_name", ColumnKind::Text),
                ("household_size", ColumnKind::Integer),
                ("location", ColumnKind::Text),
            ],
        )
        .with_collection(
            EMPLOYEES,
            &[
                ("first_name", ColumnKind::Text),
                ("username", ColumnKind::Text),
                ("password", ColumnKind::Text),
                ("level", ColumnKind::Text),
            ],
        )
        .with_required(EMPLOYEES, "username")
        .with_required(EMPLOYEES, "password")
        .with_collection(
            ORDERS,
            &[
                ("customer_id", ColumnKind::Integer),
                ("items", ColumnKind::Text),
            ],
        )
}

/// Delegating store that counts every call reaching it.
pub struct CountingStore {
    inner: InMemoryStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: InMemoryStore) -> Self {
        CountingStore {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn columns(&self, collection: Collection) -> Result<Vec<ColumnInfo>, AppError> {
        self.hit();
        self.inner.columns(collection).await
    }

    async fn select(&self, schema: &CollectionSchema, criteria: &Criteria) -> Result<Vec<Record>, AppError> {
        self.hit();
        self.inner.select(schema, criteria).await
    }

    async fn insert(&self, schema: &CollectionSchema, fields: &Record) -> Result<Record, AppError> {
        self.hit();
        self.inner.insert(schema, fields).await
    }

    async fn update(&self, schema: &CollectionSchema, id: &Value, fields: &Record) -> Result<u64, AppError> {
        self.hit();
        self.inner.update(schema, id, fields).await
    }

    async fn delete(&self, schema: &CollectionSchema, id: &Value) -> Result<u64, AppError> {
        self.hit();
        self.inner.delete(schema, id).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.hit();
        self.inner.ping().await
    }
}

pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(pantry_store());
        let state = AppState {
            records: RecordRepository::new(store.clone()),
            sessions: SessionSettings::new(b"integration-secret", time::Duration::minutes(30)).unwrap(),
            views: Arc::new(Views::new().unwrap()),
        };
        let router = pantry_console::app_router(state.clone(), Path::new("."));
        TestApp { store, state, router }
    }

    pub fn records(&self) -> &RecordRepository {
        &self.state.records
    }

    /// Employee whose password goes through the normal (hashing) write path.
    pub async fn add_employee(&self, username: &str, password: &str, level: &str) {
        self.records()
            .insert("employees", record(&[("username", username), ("password", password), ("level", level)]))
            .await
            .unwrap();
    }

    /// Employee row written straight to the store, bypassing hashing.
    pub async fn add_raw_employee(&self, username: &str, password: &str) {
        let schema = self.records().schema("employees").await.unwrap();
        let fields = record(&[("username", username), ("password", password), ("level", "staff")]);
        self.store.insert(&schema, &fields).await.unwrap();
    }

    pub async fn add_customer(&self, first_name: &str, location: &str) -> Record {
        self.records()
            .insert("customers", record(&[("first_name", first_name), ("location", location)]))
            .await
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(uri);
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(c) = cookie {
            builder = builder.header(header::COOKIE, c);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap()).await
    }

    /// Log in and return the `Cookie` header value for the new session.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let res = self
            .post_form("/login", &format!("username={}&password={}", username, password), None)
            .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        session_cookie(&res).expect("session cookie")
    }
}

pub fn record(fields: &[(&str, &str)]) -> Record {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

/// `name=value` part of the response's Set-Cookie header.
pub fn session_cookie(res: &Response<Body>) -> Option<String> {
    let raw = res.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    raw.split(';').next().map(str::to_string)
}

pub fn location(res: &Response<Body>) -> Option<&str> {
    res.headers().get(header::LOCATION)?.to_str().ok()
}

pub async fn body_text(res: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
