// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The Adapter Contract: the pluggable storage boundary
//! between the Resource Service and a durable backing store. An adapter is
//! free to apply as much of a query's filter/sort/pagination as it can and
//! report the rest back as a residual for the service layer to finish in
//! memory against the dynamic `serde_json::Value` view of each resource.

use async_trait::async_trait;

use crate::filter::{AttrPath, Filter};
use crate::resource::Resource;
use crate::response::Error;
use crate::meta::StoredParts;

/// A query against a single resource type, passed down from the Resource
/// Service to an `Adapter`.
#[derive(Debug, Clone, Default)]
pub struct ResourceQuery {
    pub filter: Option<Filter>,
    pub sort_by: Option<AttrPath>,
    pub ascending: bool,
    pub start_index: Option<usize>,
    pub count: Option<usize>,
}

/// A page of results from an `Adapter`. `total_results` is the count of
/// resources matching `filter` *before* pagination, not the page length.
///
/// `residual_filter` is `Some` when the adapter could not fully evaluate
/// `filter` itself (for example, a SQL-backed adapter that pushes down
/// `eq`/`co` on indexed columns but can't express `pr` on a JSON blob
/// column); the Resource Service re-applies it against each returned
/// resource before responding. An in-memory adapter that holds the whole
/// dataset always reports `None`.
#[derive(Debug)]
pub struct AdapterPage<R: Resource> {
    pub items: Vec<StoredParts<R>>,
    pub total_results: usize,
    pub residual_filter: Option<Filter>,
}

/// The durable store for a single resource type. `R` is the typed resource
/// (`User` or `Group`); `CreateRequest` is the corresponding creation
/// payload type (`CreateUserRequest` / `CreateGroupRequest`), which also
/// doubles as the replace-body shape for `update_resource`.
#[async_trait]
pub trait Adapter<R: Resource>: Sync {
    type CreateRequest: Send + Sync;

    async fn get_resource(
        &self,
        id: &str,
    ) -> Result<Option<StoredParts<R>>, AdapterError>;

    async fn query_resources(
        &self,
        query: &ResourceQuery,
    ) -> Result<AdapterPage<R>, AdapterError>;

    async fn create_resource(
        &self,
        request: Self::CreateRequest,
    ) -> Result<StoredParts<R>, AdapterError>;

    async fn update_resource(
        &self,
        id: &str,
        request: Self::CreateRequest,
    ) -> Result<StoredParts<R>, AdapterError>;

    /// Replace the stored resource's attributes wholesale with the result of
    /// an already-applied PATCH (the Resource Service does read-modify-write
    /// at the JSON level; the adapter only needs to persist the outcome).
    async fn put_patched(
        &self,
        id: &str,
        patched: serde_json::Value,
    ) -> Result<StoredParts<R>, AdapterError>;

    /// Returns `true` if the resource existed prior to the delete.
    async fn delete_resource(&self, id: &str) -> Result<bool, AdapterError>;
}

/// The backing store for a resource may throw its own error type, or it may
/// throw a SCIM protocol error directly (for example, a uniqueness
/// violation it detected at the storage layer).
#[derive(Debug)]
pub enum AdapterError {
    Store(anyhow::Error),
    Scim(Error),
}

impl From<Error> for AdapterError {
    fn from(e: Error) -> AdapterError {
        AdapterError::Scim(e)
    }
}

impl From<anyhow::Error> for AdapterError {
    fn from(e: anyhow::Error) -> AdapterError {
        AdapterError::Store(e)
    }
}

/// Lets a `ResourceService<User, Arc<Store>>` and a
/// `ResourceService<Group, Arc<Store>>` share one underlying store — an HTTP
/// binding registers both against the same `Arc` so User and Group endpoints
/// stay backed by one store instance.
#[async_trait]
impl<R, T> Adapter<R> for std::sync::Arc<T>
where
    R: Resource,
    T: Adapter<R> + Send + Sync,
{
    type CreateRequest = T::CreateRequest;

    async fn get_resource(
        &self,
        id: &str,
    ) -> Result<Option<StoredParts<R>>, AdapterError> {
        (**self).get_resource(id).await
    }

    async fn query_resources(
        &self,
        query: &ResourceQuery,
    ) -> Result<AdapterPage<R>, AdapterError> {
        (**self).query_resources(query).await
    }

    async fn create_resource(
        &self,
        request: Self::CreateRequest,
    ) -> Result<StoredParts<R>, AdapterError> {
        (**self).create_resource(request).await
    }

    async fn update_resource(
        &self,
        id: &str,
        request: Self::CreateRequest,
    ) -> Result<StoredParts<R>, AdapterError> {
        (**self).update_resource(id, request).await
    }

    async fn put_patched(
        &self,
        id: &str,
        patched: serde_json::Value,
    ) -> Result<StoredParts<R>, AdapterError> {
        (**self).put_patched(id, patched).await
    }

    async fn delete_resource(&self, id: &str) -> Result<bool, AdapterError> {
        (**self).delete_resource(id).await
    }
}
