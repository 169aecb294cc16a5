// ── Apply engine ──
//
// Create-or-update reconciliation over a bulk stream. Each document gets
// at most one create and, when the entity already exists, at most one
// update with the same position re-decoded as an update request.

use tracing::{debug, info};

use crate::adapter::EntityAdapter;
use crate::bulk::{BulkReader, id_of};
use crate::error::CoreError;

/// Result of reconciling one document.
#[derive(Debug)]
pub enum ApplyOutcome<R> {
    Created(R),
    Updated(R),
    /// The entity existed and the update was declined.
    Skipped { id: String },
    Failed(CoreError),
}

impl<R> ApplyOutcome<R> {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn response(&self) -> Option<&R> {
        match self {
            Self::Created(r) | Self::Updated(r) => Some(r),
            Self::Skipped { .. } | Self::Failed(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
            Self::Skipped { .. } => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

/// Outcomes in input order.
#[derive(Debug)]
pub struct ApplyReport<R> {
    pub outcomes: Vec<ApplyOutcome<R>>,
}

impl<R> ApplyReport<R> {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn responses(&self) -> impl Iterator<Item = &R> {
        self.outcomes.iter().filter_map(ApplyOutcome::response)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Stop after the first failed document.
    pub fail_fast: bool,
}

/// Callbacks around each document; the CLI uses them for confirmation
/// prompts and streaming `--bulk-output`.
pub trait ApplyHooks<R> {
    /// Called before an existing entity is updated. Returning `false` skips it.
    fn before_update(&mut self, _index: usize, _id: &str) -> Result<bool, CoreError> {
        Ok(true)
    }

    /// Called once per document; `id` is read from the document and is
    /// empty when the document names none.
    fn on_outcome(&mut self, _index: usize, _id: &str, _outcome: &ApplyOutcome<R>) {}
}

/// Hooks that confirm every update and observe nothing.
#[derive(Debug, Default)]
pub struct NoHooks;

impl<R> ApplyHooks<R> for NoHooks {}

/// Reconcile every document of `reader` against the API.
///
/// Decoding the stream as create requests is all-or-nothing; after that,
/// per-document failures are collected instead of aborting.
pub async fn apply<A, H>(
    adapter: &A,
    reader: &BulkReader,
    options: ApplyOptions,
    hooks: &mut H,
) -> Result<ApplyReport<A::Response>, CoreError>
where
    A: EntityAdapter,
    H: ApplyHooks<A::Response>,
{
    let docs: Vec<A::CreateRequest> = reader.decode_all()?;
    // server-assigned ids are legitimately absent from create documents
    let ids: Vec<String> = reader
        .values()?
        .iter()
        .map(|v| id_of(v, A::ID_FIELDS).unwrap_or_default())
        .collect();
    debug!(kind = A::KIND, count = docs.len(), "applying documents");

    let mut outcomes = Vec::with_capacity(docs.len());
    for (index, (doc, id)) in docs.iter().zip(&ids).enumerate() {
        let outcome = apply_one(adapter, reader, index, id, doc, hooks).await;
        hooks.on_outcome(index, id, &outcome);
        let stop = options.fail_fast && outcome.is_failed();
        outcomes.push(outcome);
        if stop {
            info!(index, "stopping after failed document");
            break;
        }
    }

    Ok(ApplyReport { outcomes })
}

async fn apply_one<A, H>(
    adapter: &A,
    reader: &BulkReader,
    index: usize,
    id: &str,
    doc: &A::CreateRequest,
    hooks: &mut H,
) -> ApplyOutcome<A::Response>
where
    A: EntityAdapter,
    H: ApplyHooks<A::Response>,
{
    let err = match adapter.create(doc).await {
        Ok(resp) => {
            debug!(kind = A::KIND, index, id = %A::id(&resp), "created");
            return ApplyOutcome::Created(resp);
        }
        Err(err) => err,
    };
    if !adapter.is_already_exists(&err) {
        return ApplyOutcome::Failed(CoreError::at(index, err));
    }

    let update: A::UpdateRequest = match reader.decode_at(index) {
        Ok(update) => update,
        Err(err) => return ApplyOutcome::Failed(err),
    };

    match hooks.before_update(index, id) {
        Ok(true) => {}
        Ok(false) => return ApplyOutcome::Skipped { id: id.to_owned() },
        Err(err) => return ApplyOutcome::Failed(CoreError::at(index, err)),
    }

    match adapter.update(&update).await {
        Ok(resp) => {
            debug!(kind = A::KIND, index, id = %A::id(&resp), "updated");
            ApplyOutcome::Updated(resp)
        }
        Err(err) => ApplyOutcome::Failed(CoreError::at(index, err)),
    }
}
