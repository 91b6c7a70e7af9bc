use async_trait::async_trait;

use crate::catalog::{
    error::CatalogError,
    types::{CatalogEntry, CatalogPage},
};

#[async_trait]
pub trait CatalogPort: Send + Sync {
    async fn list(&self, limit: u32, offset: u32) -> Result<CatalogPage, CatalogError>;

    async fn find_by_id(&self, id: u32) -> Result<CatalogEntry, CatalogError>;

    async fn find_by_name(&self, name: &str) -> Result<CatalogEntry, CatalogError>;

    async fn resolve_name(&self, catalog_id: u32) -> Result<String, CatalogError> {
        let entry = self.find_by_id(catalog_id).await?;
        let name = entry.name.trim();
        if name.is_empty() {
            return Err(CatalogError::InvalidResponse(format!(
                "catalog entry {catalog_id} has no name"
            )));
        }
        Ok(name.to_string())
    }
}
