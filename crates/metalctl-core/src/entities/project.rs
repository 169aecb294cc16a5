// Projects and tenants.

use metal_api::MetalClient;
use metal_api::models::{ProjectFindRequest, ProjectResponse, TenantFindRequest, TenantResponse};

use crate::adapter::{Converted, EntityAdapter};
use crate::error::CoreError;
use crate::sort::Sorter;

#[derive(Debug, Clone)]
pub struct ProjectAdapter {
    client: MetalClient,
}

impl ProjectAdapter {
    pub fn new(client: MetalClient) -> Self {
        Self { client }
    }
}

impl EntityAdapter for ProjectAdapter {
    type Response = ProjectResponse;
    type CreateRequest = ProjectResponse;
    type UpdateRequest = ProjectResponse;
    type Filter = ProjectFindRequest;

    const KIND: &'static str = "project";
    const ID_FIELDS: &'static [&'static str] = &["id", "meta.id"];

    async fn get(&self, id: &str) -> Result<ProjectResponse, CoreError> {
        Ok(self.client.get_project(id).await?)
    }

    async fn list(&self, filter: &ProjectFindRequest) -> Result<Vec<ProjectResponse>, CoreError> {
        if filter.is_empty() {
            Ok(self.client.list_projects().await?)
        } else {
            Ok(self.client.find_projects(filter).await?)
        }
    }

    async fn create(&self, req: &ProjectResponse) -> Result<ProjectResponse, CoreError> {
        Ok(self.client.create_project(req).await?)
    }

    async fn update(&self, req: &ProjectResponse) -> Result<ProjectResponse, CoreError> {
        Ok(self.client.update_project(req).await?)
    }

    async fn delete(&self, id: &str) -> Result<ProjectResponse, CoreError> {
        Ok(self.client.delete_project(id).await?)
    }

    fn id(resp: &ProjectResponse) -> String {
        if resp.id.is_empty() {
            resp.meta.id.clone()
        } else {
            resp.id.clone()
        }
    }

    fn completion_hint(resp: &ProjectResponse) -> Option<String> {
        Some(resp.name.clone()).filter(|n| !n.is_empty())
    }

    fn convert(
        &self,
        resp: &ProjectResponse,
    ) -> Result<Converted<ProjectResponse, ProjectResponse>, CoreError> {
        Ok(Converted {
            id: Self::id(resp),
            create: resp.clone(),
            update: resp.clone(),
        })
    }
}

pub fn project_sorter() -> Sorter<ProjectResponse> {
    Sorter::<ProjectResponse>::new()
        .str_field("id", |p| if p.id.is_empty() { p.meta.id.as_str() } else { p.id.as_str() })
        .str_field("name", |p| p.name.as_str())
        .str_field("tenant", |p| p.tenant_id.as_str())
        .str_field("description", |p| p.description.as_str())
        .default_keys(&["tenant", "id"])
}

// ── Tenant ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TenantAdapter {
    client: MetalClient,
}

impl TenantAdapter {
    pub fn new(client: MetalClient) -> Self {
        Self { client }
    }
}

impl EntityAdapter for TenantAdapter {
    type Response = TenantResponse;
    type CreateRequest = TenantResponse;
    type UpdateRequest = TenantResponse;
    type Filter = TenantFindRequest;

    const KIND: &'static str = "tenant";
    const ID_FIELDS: &'static [&'static str] = &["id", "meta.id"];

    async fn get(&self, id: &str) -> Result<TenantResponse, CoreError> {
        Ok(self.client.get_tenant(id).await?)
    }

    async fn list(&self, filter: &TenantFindRequest) -> Result<Vec<TenantResponse>, CoreError> {
        if filter.is_empty() {
            Ok(self.client.list_tenants().await?)
        } else {
            Ok(self.client.find_tenants(filter).await?)
        }
    }

    async fn create(&self, req: &TenantResponse) -> Result<TenantResponse, CoreError> {
        Ok(self.client.create_tenant(req).await?)
    }

    async fn update(&self, req: &TenantResponse) -> Result<TenantResponse, CoreError> {
        Ok(self.client.update_tenant(req).await?)
    }

    async fn delete(&self, id: &str) -> Result<TenantResponse, CoreError> {
        Ok(self.client.delete_tenant(id).await?)
    }

    fn id(resp: &TenantResponse) -> String {
        if resp.id.is_empty() {
            resp.meta.id.clone()
        } else {
            resp.id.clone()
        }
    }

    fn completion_hint(resp: &TenantResponse) -> Option<String> {
        Some(resp.name.clone()).filter(|n| !n.is_empty())
    }

    fn convert(
        &self,
        resp: &TenantResponse,
    ) -> Result<Converted<TenantResponse, TenantResponse>, CoreError> {
        Ok(Converted {
            id: Self::id(resp),
            create: resp.clone(),
            update: resp.clone(),
        })
    }
}

pub fn tenant_sorter() -> Sorter<TenantResponse> {
    Sorter::<TenantResponse>::new()
        .str_field("id", |t| if t.id.is_empty() { t.meta.id.as_str() } else { t.id.as_str() })
        .str_field("name", |t| t.name.as_str())
        .str_field("description", |t| t.description.as_str())
        .default_keys(&["id"])
}
