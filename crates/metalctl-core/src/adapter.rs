// ── Entity CRUD adapter ──
//
// One implementation per entity kind bridges the generic engine to the
// typed metal-api client. The engine only ever sees the associated types.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CoreError;

/// A generic operation an adapter may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: &'static [Self] = &[
        Self::List,
        Self::Get,
        Self::Create,
        Self::Update,
        Self::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// A response split into the shapes needed to recreate or update it.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted<C, U> {
    pub id: String,
    pub create: C,
    pub update: U,
}

/// Bridge between one entity kind and the remote API.
///
/// Unsupported operations keep the default bodies, which fail with
/// [`CoreError::NotSupported`]; list them in `SUPPORTED` so the command
/// factory can leave the matching subcommands out.
#[allow(async_fn_in_trait)]
pub trait EntityAdapter {
    type Response: Serialize + DeserializeOwned + Clone;
    type CreateRequest: Serialize + DeserializeOwned;
    type UpdateRequest: Serialize + DeserializeOwned;
    /// Server- or client-side list filter; `Default` lists everything.
    type Filter: Default;

    /// Singular noun used in messages, e.g. `"machine"`.
    const KIND: &'static str;

    /// Document keys that carry the id in YAML input, tried in order.
    /// Nested keys are dotted, e.g. `meta.id`.
    const ID_FIELDS: &'static [&'static str] = &["id"];

    const SUPPORTED: &'static [Operation] = Operation::ALL;

    fn supports(op: Operation) -> bool {
        Self::SUPPORTED.contains(&op)
    }

    fn not_supported(op: Operation) -> CoreError {
        CoreError::NotSupported {
            entity: Self::KIND,
            operation: op.as_str(),
        }
    }

    async fn get(&self, _id: &str) -> Result<Self::Response, CoreError> {
        Err(Self::not_supported(Operation::Get))
    }

    async fn list(&self, _filter: &Self::Filter) -> Result<Vec<Self::Response>, CoreError> {
        Err(Self::not_supported(Operation::List))
    }

    async fn create(&self, _req: &Self::CreateRequest) -> Result<Self::Response, CoreError> {
        Err(Self::not_supported(Operation::Create))
    }

    async fn update(&self, _req: &Self::UpdateRequest) -> Result<Self::Response, CoreError> {
        Err(Self::not_supported(Operation::Update))
    }

    async fn delete(&self, _id: &str) -> Result<Self::Response, CoreError> {
        Err(Self::not_supported(Operation::Delete))
    }

    /// Stable natural key of a response.
    fn id(resp: &Self::Response) -> String;

    /// Short description shown next to the id in shell completion.
    fn completion_hint(_resp: &Self::Response) -> Option<String> {
        None
    }

    /// Project a response onto its create and update request shapes.
    fn convert(
        &self,
        resp: &Self::Response,
    ) -> Result<Converted<Self::CreateRequest, Self::UpdateRequest>, CoreError>;

    /// Whether a create failed because the entity is already there.
    fn is_already_exists(&self, err: &CoreError) -> bool {
        err.is_already_exists()
    }
}
