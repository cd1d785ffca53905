// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The Resource Service: one generic implementation of SCIM CRUD + PATCH +
//! query shared by both `User` and `Group`, sitting between the HTTP binding
//! and an `Adapter`, rather than duplicating `list_users`/`list_groups`,
//! `create_user`/`create_group`, etc. pairs over two concrete types.

use std::marker::PhantomData;

use dropshot::Body;
use http::Response;
use serde::Serialize;
use slog::{Logger, error};

use crate::adapter::{Adapter, AdapterError, ResourceQuery};
use crate::eval;
use crate::patch::{PatchRequest, enforce_single_primary};
use crate::query_params::QueryParams;
use crate::resource::Resource;
use crate::response::{
    Error, ListResponse, SingleResourceResponse, deleted_http_response,
};

fn adapter_error_to_error(
    log: &Logger,
    context: String,
) -> impl FnOnce(AdapterError) -> Error {
    let log = log.clone();
    move |error| match error {
        AdapterError::Store(mut error) => {
            error = error.context(context.clone());
            // NB: Using the "#?" formatter is load bearing as it will
            // inline the entire error chain.
            error!(log, "{error:#?}");
            Error::internal_error(context)
        }
        AdapterError::Scim(error) => error,
    }
}

/// A creation/replacement payload that may carry client-supplied values for
/// attributes the protocol marks readOnly (e.g. `groups` on `User`). Most
/// request types have nothing to reject.
pub trait ValidateCreate {
    fn validate(&self) -> Result<(), Error> {
        Ok(())
    }
}

pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Implements SCIM CRUD, query, and PATCH over some `Adapter<R>`,
/// transforming the adapter's typed results into the generic SCIM response
/// types.
pub struct ResourceService<R, A>
where
    R: Resource,
    A: Adapter<R>,
{
    log: Logger,
    adapter: A,
    location_base: String,
    max_filter_results: usize,
    _resource: PhantomData<R>,
}

/// Re-serializes a create/replace request, applies single-primary
/// enforcement to its multi-valued
/// attributes, and deserializes it back into the typed request so the
/// `Adapter` never sees more than one `primary: true` per array.
fn enforce_primary_on_request<T>(request: T) -> Result<T, Error>
where
    T: Serialize + serde::de::DeserializeOwned,
{
    let mut value = serde_json::to_value(&request).map_err(|e| {
        Error::internal_error(format!(
            "failed to serialize request for single-primary enforcement: {e}"
        ))
    })?;
    enforce_single_primary(&mut value);
    serde_json::from_value(value).map_err(|e| {
        Error::internal_error(format!(
            "failed to rebuild request after single-primary enforcement: {e}"
        ))
    })
}

impl<R, A> ResourceService<R, A>
where
    R: Resource + Serialize + Clone,
    A: Adapter<R>,
    A::CreateRequest: ValidateCreate + Serialize + serde::de::DeserializeOwned,
{
    pub fn new(
        log: Logger,
        adapter: A,
        location_base: String,
        max_filter_results: usize,
    ) -> Self {
        Self {
            log,
            adapter,
            location_base,
            max_filter_results,
            _resource: PhantomData,
        }
    }

    pub async fn get(
        &self,
        query_params: &QueryParams,
        id: &str,
    ) -> Result<SingleResourceResponse, Error> {
        let stored = self
            .adapter
            .get_resource(id)
            .await
            .map_err(adapter_error_to_error(
                &self.log,
                format!("get resource {id} failed"),
            ))?
            .ok_or_else(|| Error::not_found(id.to_string()))?;

        let response = SingleResourceResponse::from_resource(
            stored.resource,
            stored.meta,
            &self.location_base,
        )?;

        project_single(
            response,
            &query_params.attributes_list(),
            &query_params.excluded_attributes_list(),
        )
    }

    pub async fn query(
        &self,
        query_params: &QueryParams,
    ) -> Result<ListResponse, Error> {
        query_params.validate()?;
        let filter = query_params.filter()?;
        let sort_by = query_params.sort_by_path();
        let ascending = query_params.ascending();
        let start_index = query_params.start_index;
        let count =
            Some(query_params.count.unwrap_or(self.max_filter_results).min(
                self.max_filter_results,
            ));

        let adapter_query = ResourceQuery {
            filter: filter.clone(),
            sort_by: sort_by.clone(),
            ascending,
            start_index,
            count,
        };

        let page = self
            .adapter
            .query_resources(&adapter_query)
            .await
            .map_err(adapter_error_to_error(
                &self.log,
                "query resources failed".to_string(),
            ))?;

        let mut values = Vec::with_capacity(page.items.len());
        for stored in page.items {
            let response = SingleResourceResponse::from_resource(
                stored.resource,
                stored.meta,
                &self.location_base,
            )?;
            values.push(response.to_value()?);
        }

        // The adapter reported it couldn't fully apply the filter itself, so
        // it returned the full (unpaginated) candidate set and we finish the
        // job: apply the residual, sort, then paginate.
        let (total_results, windowed) = if let Some(residual) =
            &page.residual_filter
        {
            values.retain(|v| eval::evaluate(residual, v));
            if let Some(sort_by) = &sort_by {
                eval::sort_resources(&mut values, sort_by, ascending);
            }
            let total_results = values.len();
            let windowed_page = eval::paginate(&values, start_index, count);
            let windowed = windowed_page.items.to_vec();
            (total_results, windowed)
        } else {
            (page.total_results, values)
        };

        let attributes = query_params.attributes_list();
        let excluded = query_params.excluded_attributes_list();
        let items_per_page = windowed.len();

        let resources = windowed
            .iter()
            .map(|v| eval::project(v, &attributes, &excluded))
            .map(|v| match v {
                serde_json::Value::Object(map) => map,
                _ => serde_json::Map::new(),
            })
            .collect();

        Ok(ListResponse::new(
            resources,
            total_results,
            Some(start_index.unwrap_or(1).max(1)),
            Some(items_per_page),
        ))
    }

    pub async fn create(
        &self,
        request: A::CreateRequest,
    ) -> Result<SingleResourceResponse, Error> {
        request.validate()?;
        let request = enforce_primary_on_request(request)?;

        let stored = self.adapter.create_resource(request).await.map_err(
            adapter_error_to_error(&self.log, "create resource failed".to_string()),
        )?;

        SingleResourceResponse::from_resource(
            stored.resource,
            stored.meta,
            &self.location_base,
        )
    }

    pub async fn replace(
        &self,
        id: &str,
        request: A::CreateRequest,
    ) -> Result<SingleResourceResponse, Error> {
        request.validate()?;
        let request = enforce_primary_on_request(request)?;

        let stored = self
            .adapter
            .update_resource(id, request)
            .await
            .map_err(adapter_error_to_error(
                &self.log,
                format!("replace resource {id} failed"),
            ))?;

        SingleResourceResponse::from_resource(
            stored.resource,
            stored.meta,
            &self.location_base,
        )
    }

    pub async fn patch(
        &self,
        id: &str,
        request: PatchRequest,
    ) -> Result<SingleResourceResponse, Error> {
        let stored = self
            .adapter
            .get_resource(id)
            .await
            .map_err(adapter_error_to_error(
                &self.log,
                format!("patch resource {id} failed"),
            ))?
            .ok_or_else(|| Error::not_found(id.to_string()))?;

        let current = serde_json::to_value(&stored.resource).map_err(|e| {
            Error::internal_error(format!(
                "failed to serialize resource {id} for patch: {e}"
            ))
        })?;

        let patched = request.apply(&self.log, id, &current)?;

        let stored = self.adapter.put_patched(id, patched).await.map_err(
            adapter_error_to_error(
                &self.log,
                format!("store patched resource {id} failed"),
            ),
        )?;

        SingleResourceResponse::from_resource(
            stored.resource,
            stored.meta,
            &self.location_base,
        )
    }

    pub async fn delete(&self, id: &str) -> Result<Response<Body>, Error> {
        let existed = self.adapter.delete_resource(id).await.map_err(
            adapter_error_to_error(
                &self.log,
                format!("delete resource {id} failed"),
            ),
        )?;

        match existed {
            true => deleted_http_response(),
            false => Err(Error::not_found(id.to_string())),
        }
    }
}

fn project_single(
    response: SingleResourceResponse,
    attributes: &[String],
    excluded: &[String],
) -> Result<SingleResourceResponse, Error> {
    if attributes.is_empty() && excluded.is_empty() {
        return Ok(response);
    }

    let value = response.to_value()?;
    let projected = eval::project(&value, attributes, excluded);
    serde_json::from_value(projected).map_err(|e| {
        Error::internal_error(format!(
            "failed to reconstruct projected response: {e}"
        ))
    })
}
