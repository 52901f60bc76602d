//! Shared test fixtures: in-memory store, fake catalog and recording sink

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use clapper_bot::metadata::{CatalogItem, MetadataLookup};
use clapper_bot::router::{Actor, CommandRouter, Interaction, InteractionKind, Services};
use clapper_bot::sink::{OutputSink, POST_FAILED_MESSAGE};
use clapper_bot::view::{Reply, View};
use clapper_common::db::init_memory_database;
use clapper_common::{Error, Result};
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Catalog with a fixed set of movies
#[derive(Default)]
pub struct FakeLookup {
    movies: Vec<CatalogItem>,
}

impl FakeLookup {
    pub fn with(movies: Vec<CatalogItem>) -> Self {
        Self { movies }
    }
}

#[async_trait]
impl MetadataLookup for FakeLookup {
    async fn search_by_title(&self, text: &str) -> Option<CatalogItem> {
        let needle = text.trim().to_lowercase();
        self.movies
            .iter()
            .find(|m| m.title.to_lowercase().contains(&needle))
            .cloned()
    }

    async fn get_by_id(&self, id: i64) -> Option<CatalogItem> {
        self.movies.iter().find(|m| m.id == id).cloned()
    }

    fn poster_url(&self, poster_ref: &str) -> Option<String> {
        Some(format!("https://images.test{}", poster_ref))
    }
}

/// Sink that records posts, or fails every post when `failing`
#[derive(Default)]
pub struct RecordingSink {
    pub posts: Mutex<Vec<(String, View)>>,
    pub failing: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            posts: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }
}

#[async_trait]
impl OutputSink for RecordingSink {
    async fn post_message(&self, channel: &str, view: &View) -> Result<()> {
        if self.failing {
            return Err(Error::TransportFailure(POST_FAILED_MESSAGE.to_string()));
        }
        self.posts
            .lock()
            .unwrap()
            .push((channel.to_string(), view.clone()));
        Ok(())
    }
}

pub fn movie(id: i64, title: &str, score: f64, genre_ids: Vec<i64>, release_date: &str) -> CatalogItem {
    CatalogItem {
        id,
        title: title.to_string(),
        summary: format!("{} summary", title),
        score,
        release_date: release_date.to_string(),
        poster_ref: Some(format!("/{}.jpg", id)),
        genre_ids,
    }
}

/// Catalog used across the integration tests
pub fn catalog() -> Vec<CatalogItem> {
    vec![
        movie(603, "The Matrix", 7.5, vec![28, 18], "1999-03-30"),
        movie(949, "Heat", 7.9, vec![80, 18], "1995-12-15"),
        movie(348, "Alien", 8.1, vec![27, 878], "1979-05-25"),
        movie(679, "Aliens", 7.9, vec![28, 878], "1986-07-18"),
    ]
}

pub struct Harness {
    pub db: SqlitePool,
    pub sink: Arc<RecordingSink>,
    pub router: CommandRouter,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_sink(RecordingSink::default()).await
    }

    pub async fn with_sink(sink: RecordingSink) -> Self {
        let db = init_memory_database().await.unwrap();
        let sink = Arc::new(sink);
        let router = CommandRouter::new(Services {
            db: db.clone(),
            lookup: Arc::new(FakeLookup::with(catalog())),
            sink: sink.clone(),
        });
        Self { db, sink, router }
    }

    pub async fn command(&self, tenant: &str, actor: &Actor, name: &str, options: &[(&str, &str)]) -> Reply {
        self.router.dispatch(&command(tenant, actor, name, options)).await
    }

    pub async fn click(&self, tenant: &str, actor: &Actor, token: &str) -> Reply {
        self.router.dispatch(&component(tenant, actor, token)).await
    }
}

pub fn admin(id: &str) -> Actor {
    Actor {
        id: id.to_string(),
        name: format!("{}-name", id),
        is_admin: true,
    }
}

pub fn member(id: &str) -> Actor {
    Actor {
        id: id.to_string(),
        name: format!("{}-name", id),
        is_admin: false,
    }
}

pub fn command(tenant: &str, actor: &Actor, name: &str, options: &[(&str, &str)]) -> Interaction {
    Interaction {
        tenant_id: Some(tenant.to_string()),
        actor: actor.clone(),
        kind: InteractionKind::Command {
            name: name.to_string(),
            options: options
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        },
    }
}

pub fn component(tenant: &str, actor: &Actor, token: &str) -> Interaction {
    Interaction {
        tenant_id: Some(tenant.to_string()),
        actor: actor.clone(),
        kind: InteractionKind::Component {
            token: token.to_string(),
        },
    }
}

pub fn content(reply: &Reply) -> &str {
    reply.content.as_deref().unwrap_or_default()
}

pub fn field<'a>(reply: &'a Reply, name: &str) -> Option<&'a str> {
    reply
        .view
        .as_ref()?
        .fields
        .iter()
        .find(|f| f.name == name)
        .map(|f| f.value.as_str())
}

/// Test helper: JSON POST request
pub fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
pub async fn extract_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}
