// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The Bulk Dispatcher: a `/Bulk` envelope carrying a
//! sequence of per-resource operations. Processed strictly sequentially
//! (RFC 7644 §3.7) so `failOnErrors` has well-defined semantics; each
//! operation's outcome is captured into the response envelope rather than
//! surfaced at the top level. Has no teacher counterpart — `server.rs`
//! hard-codes `bulk.supported=false` and routes no `/Bulk` endpoint at all.

use http::StatusCode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapter::Adapter;
use crate::group::{CreateGroupRequest, Group};
use crate::patch::PatchRequest;
use crate::response::Error;
use crate::service::ResourceService;
use crate::user::{CreateUserRequest, User};

pub const DEFAULT_MAX_BULK_OPERATIONS: usize = 100;

#[derive(Deserialize, JsonSchema, Debug, Clone)]
pub struct BulkOperation {
    pub method: String,

    pub path: String,

    #[serde(rename = "bulkId", default)]
    pub bulk_id: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Deserialize, JsonSchema, Debug, Clone)]
pub struct BulkRequest {
    pub schemas: Vec<String>,

    #[serde(rename = "failOnErrors", default)]
    pub fail_on_errors: Option<usize>,

    #[serde(rename = "Operations")]
    pub operations: Vec<BulkOperation>,
}

#[derive(Serialize, JsonSchema, Debug)]
pub struct BulkResponseOperation {
    pub method: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(rename = "bulkId", skip_serializing_if = "Option::is_none")]
    pub bulk_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Error>,
}

#[derive(Serialize, JsonSchema, Debug)]
pub struct BulkResponse {
    pub schemas: Vec<String>,

    #[serde(rename = "Operations")]
    pub operations: Vec<BulkResponseOperation>,
}

impl BulkResponse {
    fn new(operations: Vec<BulkResponseOperation>) -> Self {
        BulkResponse {
            schemas: vec![String::from(crate::urn::BULK_RESPONSE_URN)],
            operations,
        }
    }
}

enum BulkPath {
    Users(Option<String>),
    Groups(Option<String>),
}

/// Matches `^/(Users|Groups)(/([^/]+))?$`.
fn parse_bulk_path(path: &str) -> Result<BulkPath, ()> {
    let rest = path.strip_prefix('/').ok_or(())?;
    let mut segments = rest.splitn(2, '/');
    let resource = segments.next().ok_or(())?;
    let id = match segments.next() {
        Some(id) if id.is_empty() || id.contains('/') => return Err(()),
        Some(id) => Some(id.to_string()),
        None => None,
    };

    match resource {
        "Users" => Ok(BulkPath::Users(id)),
        "Groups" => Ok(BulkPath::Groups(id)),
        _ => Err(()),
    }
}

/// Routes bulk envelope operations to a `User` and, if configured, a
/// `Group` resource service sharing one underlying adapter. A `None` group
/// service represents the "group adapter absent" case: bulk
/// operations against `/Groups` then fail with `NotImplemented`.
pub struct BulkDispatcher<'a, A>
where
    A: Adapter<User, CreateRequest = CreateUserRequest>
        + Adapter<Group, CreateRequest = CreateGroupRequest>,
{
    users: &'a ResourceService<User, A>,
    groups: Option<&'a ResourceService<Group, A>>,
    max_bulk_operations: usize,
}

type OpOutcome = (StatusCode, Option<String>, Option<String>);

impl<'a, A> BulkDispatcher<'a, A>
where
    A: Adapter<User, CreateRequest = CreateUserRequest>
        + Adapter<Group, CreateRequest = CreateGroupRequest>,
{
    pub fn new(
        users: &'a ResourceService<User, A>,
        groups: Option<&'a ResourceService<Group, A>>,
        max_bulk_operations: usize,
    ) -> Self {
        Self { users, groups, max_bulk_operations }
    }

    pub async fn dispatch(
        &self,
        request: BulkRequest,
    ) -> Result<BulkResponse, Error> {
        if request.operations.len() > self.max_bulk_operations {
            return Err(Error::invalid_value(format!(
                "bulk request contains {} operations, exceeding the \
                 maximum of {}",
                request.operations.len(),
                self.max_bulk_operations
            )));
        }

        let fail_on_errors = request.fail_on_errors.unwrap_or(0);
        let mut responses = Vec::with_capacity(request.operations.len());
        let mut error_count = 0usize;

        for op in request.operations {
            if fail_on_errors > 0 && error_count >= fail_on_errors {
                break;
            }

            let result = self.dispatch_one(&op).await;
            if result.is_err() {
                error_count += 1;
            }
            responses.push(to_bulk_response_operation(op, result));
        }

        Ok(BulkResponse::new(responses))
    }

    async fn dispatch_one(&self, op: &BulkOperation) -> Result<OpOutcome, Error> {
        let path = parse_bulk_path(&op.path).map_err(|()| {
            Error::invalid_value(format!(
                "unrecognized bulk operation path {:?}",
                op.path
            ))
        })?;
        let method = op.method.to_ascii_uppercase();

        match path {
            BulkPath::Users(id) => {
                dispatch_resource(
                    self.users,
                    &method,
                    id.as_deref(),
                    op.data.clone(),
                )
                .await
            }
            BulkPath::Groups(id) => {
                let groups = self.groups.ok_or_else(|| {
                    Error::not_implemented(
                        "Group resources are not configured".to_string(),
                    )
                })?;
                dispatch_resource(
                    groups,
                    &method,
                    id.as_deref(),
                    op.data.clone(),
                )
                .await
            }
        }
    }
}

/// Shared PATCH/POST/PUT/DELETE dispatch for one resource type. Generic
/// over `A::CreateRequest` via `serde::de::DeserializeOwned` so the same
/// code path serves both `/Users` and `/Groups` operations.
async fn dispatch_resource<R, A>(
    service: &ResourceService<R, A>,
    method: &str,
    id: Option<&str>,
    data: Option<Value>,
) -> Result<OpOutcome, Error>
where
    R: crate::resource::Resource + Serialize + Clone,
    A: Adapter<R>,
    A::CreateRequest: crate::service::ValidateCreate
        + serde::de::DeserializeOwned,
{
    match (method, id) {
        ("POST", None) => {
            let request = deserialize_payload(data)?;
            let response = service.create(request).await?;
            Ok((
                StatusCode::CREATED,
                Some(response.meta.location.clone()),
                Some(response.meta.version.clone()),
            ))
        }
        ("PUT", Some(id)) => {
            let request = deserialize_payload(data)?;
            let response = service.replace(id, request).await?;
            Ok((
                StatusCode::OK,
                Some(response.meta.location.clone()),
                Some(response.meta.version.clone()),
            ))
        }
        ("PATCH", Some(id)) => {
            let data = data.ok_or_else(|| {
                Error::invalid_value(
                    "bulk PATCH operation requires a data payload"
                        .to_string(),
                )
            })?;
            let request: PatchRequest =
                serde_json::from_value(data).map_err(|e| {
                    Error::invalid_syntax(format!(
                        "invalid PatchRequest payload: {e}"
                    ))
                })?;
            let response = service.patch(id, request).await?;
            Ok((
                StatusCode::OK,
                Some(response.meta.location.clone()),
                Some(response.meta.version.clone()),
            ))
        }
        ("DELETE", Some(id)) => {
            service.delete(id).await?;
            Ok((StatusCode::NO_CONTENT, None, None))
        }
        (_, None) if method != "POST" => {
            Err(Error::invalid_value(format!(
                "bulk {method} operation requires a resource id in its path"
            )))
        }
        _ => Err(Error::invalid_value(format!(
            "unsupported bulk operation method {method}"
        ))),
    }
}

fn deserialize_payload<T: serde::de::DeserializeOwned>(
    data: Option<Value>,
) -> Result<T, Error> {
    let data = data.ok_or_else(|| {
        Error::invalid_value(
            "bulk operation requires a data payload".to_string(),
        )
    })?;
    serde_json::from_value(data).map_err(|e| {
        Error::invalid_syntax(format!("invalid bulk operation payload: {e}"))
    })
}

fn to_bulk_response_operation(
    op: BulkOperation,
    result: Result<OpOutcome, Error>,
) -> BulkResponseOperation {
    match result {
        Ok((status, location, version)) => BulkResponseOperation {
            method: op.method,
            location,
            bulk_id: op.bulk_id,
            version,
            status: status.as_str().to_string(),
            response: None,
        },
        Err(error) => BulkResponseOperation {
            method: op.method,
            location: None,
            bulk_id: op.bulk_id,
            version: None,
            status: error.status().as_str().to_string(),
            response: Some(error),
        },
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use slog::Logger;

    use super::*;
    use crate::in_memory_provider_store::InMemoryProviderStore;

    fn log() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }

    fn services() -> (
        ResourceService<User, Arc<InMemoryProviderStore>>,
        ResourceService<Group, Arc<InMemoryProviderStore>>,
    ) {
        let store = Arc::new(InMemoryProviderStore::new());
        (
            ResourceService::new(
                log(),
                store.clone(),
                "https://example.com/v2".to_string(),
                200,
            ),
            ResourceService::new(
                log(),
                store,
                "https://example.com/v2".to_string(),
                200,
            ),
        )
    }

    #[test]
    fn parses_resource_and_id_from_path() {
        assert!(matches!(
            parse_bulk_path("/Users").unwrap(),
            BulkPath::Users(None)
        ));
        match parse_bulk_path("/Users/abc-123").unwrap() {
            BulkPath::Users(Some(id)) => assert_eq!(id, "abc-123"),
            _ => panic!("expected a Users path with an id"),
        }
        assert!(parse_bulk_path("/Users/abc/extra").is_err());
        assert!(parse_bulk_path("/Widgets").is_err());
    }

    #[tokio::test]
    async fn rejects_envelopes_over_the_operation_limit() {
        let (users, groups) = services();
        let dispatcher = BulkDispatcher::new(&users, Some(&groups), 1);

        let request = BulkRequest {
            schemas: vec![String::from(crate::urn::BULK_REQUEST_URN)],
            fail_on_errors: None,
            operations: vec![
                BulkOperation {
                    method: "POST".to_string(),
                    path: "/Users".to_string(),
                    bulk_id: None,
                    version: None,
                    data: None,
                },
                BulkOperation {
                    method: "POST".to_string(),
                    path: "/Users".to_string(),
                    bulk_id: None,
                    version: None,
                    data: None,
                },
            ],
        };

        let err = dispatcher.dispatch(request).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stops_processing_once_fail_on_errors_is_reached() {
        let (users, groups) = services();
        let dispatcher = BulkDispatcher::new(&users, Some(&groups), 100);

        let missing_put = |bulk_id: &str| BulkOperation {
            method: "PUT".to_string(),
            path: "/Users/does-not-exist".to_string(),
            bulk_id: Some(bulk_id.to_string()),
            version: None,
            data: Some(serde_json::json!({"userName": "nobody"})),
        };

        let request = BulkRequest {
            schemas: vec![String::from(crate::urn::BULK_REQUEST_URN)],
            fail_on_errors: Some(1),
            operations: vec![
                missing_put("1"),
                missing_put("2"),
                BulkOperation {
                    method: "POST".to_string(),
                    path: "/Users".to_string(),
                    bulk_id: Some("3".to_string()),
                    version: None,
                    data: Some(serde_json::json!({"userName": "new.user"})),
                },
            ],
        };

        let response = dispatcher.dispatch(request).await.unwrap();
        assert_eq!(response.operations.len(), 1);
        assert_eq!(response.operations[0].status, "404");
    }

    #[tokio::test]
    async fn groups_absent_reports_not_implemented() {
        let (users, _groups) = services();
        let dispatcher: BulkDispatcher<'_, Arc<InMemoryProviderStore>> =
            BulkDispatcher::new(&users, None, DEFAULT_MAX_BULK_OPERATIONS);

        let request = BulkRequest {
            schemas: vec![String::from(crate::urn::BULK_REQUEST_URN)],
            fail_on_errors: None,
            operations: vec![BulkOperation {
                method: "POST".to_string(),
                path: "/Groups".to_string(),
                bulk_id: None,
                version: None,
                data: Some(serde_json::json!({"displayName": "Sales"})),
            }],
        };

        let response = dispatcher.dispatch(request).await.unwrap();
        assert_eq!(response.operations[0].status, "501");
    }
}
