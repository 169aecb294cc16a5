use crate::client::{MetalClient, segment};
use crate::error::Error;
use crate::models::{
    ProjectCreateRequest, ProjectFindRequest, ProjectResponse, ProjectUpdateRequest,
    TenantCreateRequest, TenantFindRequest, TenantResponse, TenantUpdateRequest,
};

impl MetalClient {
    // ── Projects ─────────────────────────────────────────────────────

    pub async fn list_projects(&self) -> Result<Vec<ProjectResponse>, Error> {
        self.get("v1/project").await
    }

    pub async fn find_projects(
        &self,
        find: &ProjectFindRequest,
    ) -> Result<Vec<ProjectResponse>, Error> {
        self.post("v1/project/find", find).await
    }

    pub async fn get_project(&self, id: &str) -> Result<ProjectResponse, Error> {
        self.get(&format!("v1/project/{}", segment(id))).await
    }

    pub async fn create_project(&self, req: &ProjectCreateRequest) -> Result<ProjectResponse, Error> {
        self.put("v1/project", req).await
    }

    pub async fn update_project(&self, req: &ProjectUpdateRequest) -> Result<ProjectResponse, Error> {
        self.post("v1/project", req).await
    }

    pub async fn delete_project(&self, id: &str) -> Result<ProjectResponse, Error> {
        self.delete(&format!("v1/project/{}", segment(id))).await
    }

    // ── Tenants ──────────────────────────────────────────────────────

    pub async fn list_tenants(&self) -> Result<Vec<TenantResponse>, Error> {
        self.get("v1/tenant").await
    }

    pub async fn find_tenants(&self, find: &TenantFindRequest) -> Result<Vec<TenantResponse>, Error> {
        self.post("v1/tenant/find", find).await
    }

    pub async fn get_tenant(&self, id: &str) -> Result<TenantResponse, Error> {
        self.get(&format!("v1/tenant/{}", segment(id))).await
    }

    pub async fn create_tenant(&self, req: &TenantCreateRequest) -> Result<TenantResponse, Error> {
        self.put("v1/tenant", req).await
    }

    pub async fn update_tenant(&self, req: &TenantUpdateRequest) -> Result<TenantResponse, Error> {
        self.post("v1/tenant", req).await
    }

    pub async fn delete_tenant(&self, id: &str) -> Result<TenantResponse, Error> {
        self.delete(&format!("v1/tenant/{}", segment(id))).await
    }
}
