// Audit traces are read-only.

use metal_api::MetalClient;
use metal_api::models::{AuditFindRequest, AuditResponse};

use crate::adapter::{Converted, EntityAdapter, Operation};
use crate::error::CoreError;
use crate::sort::{Sorter, cmp_opt};

#[derive(Debug, Clone)]
pub struct AuditAdapter {
    client: MetalClient,
}

impl AuditAdapter {
    pub fn new(client: MetalClient) -> Self {
        Self { client }
    }
}

impl EntityAdapter for AuditAdapter {
    type Response = AuditResponse;
    type CreateRequest = AuditResponse;
    type UpdateRequest = AuditResponse;
    type Filter = AuditFindRequest;

    const KIND: &'static str = "audit trace";
    const ID_FIELDS: &'static [&'static str] = &["rqid"];
    const SUPPORTED: &'static [Operation] = &[Operation::List, Operation::Get];

    async fn get(&self, id: &str) -> Result<AuditResponse, CoreError> {
        Ok(self.client.get_audit_trace(id).await?)
    }

    async fn list(&self, filter: &AuditFindRequest) -> Result<Vec<AuditResponse>, CoreError> {
        Ok(self.client.find_audit_traces(filter).await?)
    }

    fn id(resp: &AuditResponse) -> String {
        resp.rqid.clone()
    }

    fn completion_hint(resp: &AuditResponse) -> Option<String> {
        Some(resp.path.clone()).filter(|p| !p.is_empty())
    }

    fn convert(
        &self,
        resp: &AuditResponse,
    ) -> Result<Converted<AuditResponse, AuditResponse>, CoreError> {
        Ok(Converted {
            id: resp.rqid.clone(),
            create: resp.clone(),
            update: resp.clone(),
        })
    }
}

pub fn audit_sorter() -> Sorter<AuditResponse> {
    Sorter::<AuditResponse>::new()
        .field("timestamp", |a, b, d| {
            cmp_opt(a.timestamp.as_ref(), b.timestamp.as_ref(), d)
        })
        .str_field("rqid", |a| a.rqid.as_str())
        .str_field("user", |a| a.user.as_str())
        .str_field("path", |a| a.path.as_str())
        .str_field("phase", |a| a.phase.as_str())
        .default_keys(&["timestamp"])
}
