// File-driven create, update and delete.
//
// Documents are processed in order and the first failure aborts the
// run; entities handled before it stay changed.

use tracing::debug;

use crate::adapter::EntityAdapter;
use crate::bulk::BulkReader;
use crate::error::CoreError;

/// Create every document of the stream.
pub async fn create_all<A: EntityAdapter>(
    adapter: &A,
    reader: &BulkReader,
) -> Result<Vec<A::Response>, CoreError> {
    let docs: Vec<A::CreateRequest> = reader.decode_all()?;
    let mut out = Vec::with_capacity(docs.len());
    for (index, doc) in docs.iter().enumerate() {
        let resp = adapter
            .create(doc)
            .await
            .map_err(|e| CoreError::at(index, e))?;
        debug!(kind = A::KIND, id = %A::id(&resp), "created from file");
        out.push(resp);
    }
    Ok(out)
}

/// Update every document of the stream.
pub async fn update_all<A: EntityAdapter>(
    adapter: &A,
    reader: &BulkReader,
) -> Result<Vec<A::Response>, CoreError> {
    let docs: Vec<A::UpdateRequest> = reader.decode_all()?;
    let mut out = Vec::with_capacity(docs.len());
    for (index, doc) in docs.iter().enumerate() {
        let resp = adapter
            .update(doc)
            .await
            .map_err(|e| CoreError::at(index, e))?;
        debug!(kind = A::KIND, id = %A::id(&resp), "updated from file");
        out.push(resp);
    }
    Ok(out)
}

/// Delete the entity named by each document's id field.
///
/// All ids are read before the first delete, so a document without an
/// id aborts the run before anything is removed.
pub async fn delete_all<A: EntityAdapter>(
    adapter: &A,
    reader: &BulkReader,
) -> Result<Vec<A::Response>, CoreError> {
    let ids = reader.ids(A::ID_FIELDS)?;
    let mut out = Vec::with_capacity(ids.len());
    for (index, id) in ids.iter().enumerate() {
        debug!(kind = A::KIND, id, "deleting from file");
        out.push(
            adapter
                .delete(id)
                .await
                .map_err(|e| CoreError::at(index, e))?,
        );
    }
    Ok(out)
}
