// Engine tests against an in-memory adapter and a wiremock-backed one.
#![allow(clippy::unwrap_used)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use metal_api::models::ProjectResponse;
use metal_api::{Credentials, MetalClient};
use metalctl_core::bulk::encode_all;
use metalctl_core::entities::ProjectAdapter;
use metalctl_core::ops::{create_all, delete_all};
use metalctl_core::{
    ApplyHooks, ApplyOptions, ApplyOutcome, BulkReader, Converted, CoreError, EntityAdapter,
    NoHooks, apply, edit,
};

// ── In-memory adapter ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Thing {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ThingUpdate {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default)]
struct Calls {
    create: Vec<String>,
    update: Vec<String>,
    delete: Vec<String>,
}

/// Stores things by id; ids starting with `bad` fail every call.
#[derive(Debug, Default)]
struct Store {
    things: RefCell<BTreeMap<String, Thing>>,
    calls: RefCell<Calls>,
}

impl Store {
    fn with(ids: &[&str]) -> Self {
        let store = Self::default();
        for id in ids {
            store.things.borrow_mut().insert(
                (*id).to_owned(),
                Thing {
                    id: (*id).to_owned(),
                    name: format!("old-{id}"),
                },
            );
        }
        store
    }

    fn check(id: &str) -> Result<(), CoreError> {
        if id.starts_with("bad") {
            Err(CoreError::InvalidArgument(format!("{id} is rejected")))
        } else {
            Ok(())
        }
    }
}

impl EntityAdapter for Store {
    type Response = Thing;
    type CreateRequest = Thing;
    type UpdateRequest = ThingUpdate;
    type Filter = ();

    const KIND: &'static str = "thing";

    async fn get(&self, id: &str) -> Result<Thing, CoreError> {
        self.things
            .borrow()
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                message: id.to_owned(),
            })
    }

    async fn list(&self, _: &()) -> Result<Vec<Thing>, CoreError> {
        Ok(self.things.borrow().values().cloned().collect())
    }

    async fn create(&self, req: &Thing) -> Result<Thing, CoreError> {
        self.calls.borrow_mut().create.push(req.id.clone());
        Self::check(&req.id)?;
        let mut things = self.things.borrow_mut();
        if things.contains_key(&req.id) {
            return Err(CoreError::AlreadyExists {
                message: req.id.clone(),
            });
        }
        things.insert(req.id.clone(), req.clone());
        Ok(req.clone())
    }

    async fn update(&self, req: &ThingUpdate) -> Result<Thing, CoreError> {
        self.calls.borrow_mut().update.push(req.id.clone());
        Self::check(&req.id)?;
        let thing = Thing {
            id: req.id.clone(),
            name: req.name.clone(),
        };
        self.things
            .borrow_mut()
            .insert(req.id.clone(), thing.clone());
        Ok(thing)
    }

    async fn delete(&self, id: &str) -> Result<Thing, CoreError> {
        self.calls.borrow_mut().delete.push(id.to_owned());
        self.things
            .borrow_mut()
            .remove(id)
            .ok_or_else(|| CoreError::NotFound {
                message: id.to_owned(),
            })
    }

    fn id(resp: &Thing) -> String {
        resp.id.clone()
    }

    fn convert(&self, resp: &Thing) -> Result<Converted<Thing, ThingUpdate>, CoreError> {
        Ok(Converted {
            id: resp.id.clone(),
            create: resp.clone(),
            update: ThingUpdate {
                id: resp.id.clone(),
                name: resp.name.clone(),
            },
        })
    }
}

fn thing(id: &str, name: &str) -> Thing {
    Thing {
        id: id.into(),
        name: name.into(),
    }
}

// ── Apply ───────────────────────────────────────────────────────────

#[tokio::test]
async fn apply_updates_existing_and_creates_missing() {
    let store = Store::with(&["1"]);
    let reader = BulkReader::from_string("id: \"1\"\nname: one\n---\nid: \"2\"\nname: two\n");

    let report = apply(&store, &reader, ApplyOptions::default(), &mut NoHooks)
        .await
        .unwrap();

    assert!(report.is_success());
    let labels: Vec<&str> = report.outcomes.iter().map(ApplyOutcome::label).collect();
    assert_eq!(labels, vec!["updated", "created"]);
    let responses: Vec<Thing> = report.responses().cloned().collect();
    assert_eq!(responses, vec![thing("1", "one"), thing("2", "two")]);

    let calls = store.calls.borrow();
    assert_eq!(calls.create, vec!["1", "2"]);
    assert_eq!(calls.update, vec!["1"]);
}

#[tokio::test]
async fn apply_collects_failures_and_continues() {
    let store = Store::default();
    let reader = BulkReader::from_string("id: a\n---\nid: bad\n---\nid: c\n");

    let report = apply(&store, &reader, ApplyOptions::default(), &mut NoHooks)
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.failed(), 1);
    match &report.outcomes[1] {
        ApplyOutcome::Failed(CoreError::Document { index, .. }) => assert_eq!(*index, 1),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(report.outcomes[2].label(), "created");
}

#[tokio::test]
async fn failed_documents_are_reported_with_their_id() {
    let store = Store::default();
    let reader = BulkReader::from_string("id: a\n---\nid: bad\n");
    let mut hooks = Decline {
        seen: Vec::new(),
        outcomes: Vec::new(),
    };

    let report = apply(&store, &reader, ApplyOptions::default(), &mut hooks)
        .await
        .unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(
        hooks.outcomes,
        vec![("a".to_owned(), "created"), ("bad".to_owned(), "failed")]
    );
}

#[tokio::test]
async fn apply_fail_fast_stops_at_first_failure() {
    let store = Store::default();
    let reader = BulkReader::from_string("id: bad\n---\nid: b\n");
    let options = ApplyOptions { fail_fast: true };

    let report = apply(&store, &reader, options, &mut NoHooks).await.unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(store.calls.borrow().create, vec!["bad"]);
}

#[tokio::test]
async fn apply_decode_error_sends_nothing() {
    let store = Store::default();
    let reader = BulkReader::from_string("id: a\n---\nname: [unterminated\n");

    let err = apply(&store, &reader, ApplyOptions::default(), &mut NoHooks)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Decode { .. }), "{err:?}");
    assert!(store.calls.borrow().create.is_empty());
}

struct Decline {
    seen: Vec<(usize, String)>,
    outcomes: Vec<(String, &'static str)>,
}

impl ApplyHooks<Thing> for Decline {
    fn before_update(&mut self, index: usize, id: &str) -> Result<bool, CoreError> {
        self.seen.push((index, id.to_owned()));
        Ok(false)
    }

    fn on_outcome(&mut self, _index: usize, id: &str, outcome: &ApplyOutcome<Thing>) {
        self.outcomes.push((id.to_owned(), outcome.label()));
    }
}

#[tokio::test]
async fn declined_update_is_skipped() {
    let store = Store::with(&["1"]);
    let reader = BulkReader::from_string("id: \"1\"\nname: changed\n---\nid: \"2\"\n");
    let mut hooks = Decline {
        seen: Vec::new(),
        outcomes: Vec::new(),
    };

    let report = apply(&store, &reader, ApplyOptions::default(), &mut hooks)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(hooks.seen, vec![(0, "1".to_owned())]);
    assert_eq!(
        hooks.outcomes,
        vec![("1".to_owned(), "skipped"), ("2".to_owned(), "created")]
    );
    assert!(store.calls.borrow().update.is_empty());
    assert_eq!(store.get("1").await.unwrap().name, "old-1");
}

// ── File-driven operations ──────────────────────────────────────────

#[tokio::test]
async fn delete_from_file_deletes_each_id_once() {
    let store = Store::with(&["1", "2"]);
    let reader = BulkReader::from_string("id: \"1\"\nname: x\n---\nid: \"2\"\n");

    let deleted = delete_all(&store, &reader).await.unwrap();

    assert_eq!(deleted.len(), 2);
    assert_eq!(store.calls.borrow().delete, vec!["1", "2"]);
    assert!(store.list(&()).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_from_file_without_id_deletes_nothing() {
    let store = Store::with(&["1"]);
    let reader = BulkReader::from_string("id: \"1\"\n---\nname: anonymous\n");

    let err = delete_all(&store, &reader).await.unwrap_err();

    assert!(matches!(err, CoreError::MissingId { index: 1, .. }));
    assert!(store.calls.borrow().delete.is_empty());
}

#[tokio::test]
async fn create_from_file_aborts_on_first_error() {
    let store = Store::with(&["2"]);
    let reader = BulkReader::from_string("id: \"1\"\n---\nid: \"2\"\n---\nid: \"3\"\n");

    let err = create_all(&store, &reader).await.unwrap_err();

    assert!(matches!(err, CoreError::Document { index: 1, .. }));
    assert!(err.is_already_exists());
    assert_eq!(store.calls.borrow().create, vec!["1", "2"]);
}

// ── Edit ────────────────────────────────────────────────────────────

#[tokio::test]
async fn unchanged_edit_sends_the_converted_update() {
    let store = Store::with(&["1"]);
    let expected = store
        .convert(&store.get("1").await.unwrap())
        .unwrap()
        .update;

    edit(&store, "1", |_: &Path| Ok(())).await.unwrap();

    assert_eq!(store.calls.borrow().update, vec!["1"]);
    assert_eq!(store.get("1").await.unwrap().name, expected.name);
}

#[tokio::test]
async fn edited_document_is_sent() {
    let store = Store::with(&["1"]);

    let updated = edit(&store, "1", |p: &Path| {
        std::fs::write(p, "id: \"1\"\nname: renamed\n")
            .map_err(|e| CoreError::io("rewrite", e))
    })
    .await
    .unwrap();

    assert_eq!(updated, thing("1", "renamed"));
}

#[tokio::test]
async fn failing_editor_sends_nothing() {
    let store = Store::with(&["1"]);

    let err = edit(&store, "1", |_: &Path| {
        Err(CoreError::Editor("exited with 1".into()))
    })
    .await
    .unwrap_err();

    assert!(matches!(err, CoreError::Editor(_)));
    assert!(store.calls.borrow().update.is_empty());
}

// ── Against the HTTP client ─────────────────────────────────────────

#[tokio::test]
async fn project_apply_falls_back_to_update_on_conflict() {
    let server = MockServer::start().await;
    let client = MetalClient::with_client(
        &server.uri(),
        reqwest::Client::new(),
        Credentials::Anonymous,
    )
    .unwrap();

    Mock::given(method("PUT"))
        .and(path("/v1/project"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "project 1 already exists"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/project"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "1", "name": "project-1", "tenant_id": "t1", "meta": { "id": "1" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = ProjectAdapter::new(client);
    let reader = BulkReader::from_string("id: \"1\"\nname: project-1\ntenant_id: t1\n");
    let report = apply(&adapter, &reader, ApplyOptions::default(), &mut NoHooks)
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].label(), "updated");
}

#[tokio::test]
async fn project_delete_from_file_reads_the_meta_id() {
    let server = MockServer::start().await;
    let client = MetalClient::with_client(
        &server.uri(),
        reqwest::Client::new(),
        Credentials::Anonymous,
    )
    .unwrap();

    Mock::given(method("DELETE"))
        .and(path("/v1/project/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "id": "p1" }, "name": "project-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    // what `project describe -o yaml` prints for a project known only by meta.id
    let mut described = ProjectResponse {
        name: "project-1".into(),
        ..ProjectResponse::default()
    };
    described.meta.id = "p1".into();
    let reader = BulkReader::from_string(encode_all(&[described]).unwrap());

    let adapter = ProjectAdapter::new(client);
    let deleted = delete_all(&adapter, &reader).await.unwrap();

    assert_eq!(deleted.len(), 1);
    assert_eq!(ProjectAdapter::id(&deleted[0]), "p1");
}
