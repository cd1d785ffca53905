// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A non-optimized, in-memory reference `Adapter` implementation, used by
//! the HTTP binding's default configuration and by this
//! crate's own tests. It holds the complete dataset, so it always applies
//! the whole filter/sort/pagination itself and reports no residual filter.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::adapter::{Adapter, AdapterError, AdapterPage, ResourceQuery};
use crate::eval;
use crate::group::{CreateGroupRequest, Group, GroupMember};
use crate::meta::{StoredMeta, StoredParts};
use crate::resource::{Resource, ResourceType};
use crate::response::Error;
use crate::user::{CreateUserRequest, User, UserGroup, UserGroupType};

#[derive(Clone, Serialize, JsonSchema)]
pub struct InMemoryProviderStoreState {
    users: BTreeMap<String, StoredParts<User>>,
    groups: BTreeMap<String, StoredParts<Group>>,
    version_counter: u64,
}

impl InMemoryProviderStoreState {
    fn next_version(&mut self) -> String {
        self.version_counter += 1;
        format!("W/\"{}\"", self.version_counter)
    }

    /// Fills in a group member's computed `type` field (or rejects it if the
    /// referenced resource doesn't exist / is an unsupported nested group).
    fn validate_group_member(
        &self,
        member: &GroupMember,
    ) -> Result<GroupMember, Error> {
        let Some(value) = &member.value else {
            return Err(Error::invalid_syntax(String::from(
                "group member missing value field",
            )));
        };

        let resource_type = if let Some(resource_type) = &member.resource_type
        {
            let resource_type = ResourceType::from_str(resource_type)
                .map_err(Error::invalid_syntax)?;

            match resource_type {
                ResourceType::User => {
                    self.users
                        .get(value)
                        .ok_or_else(|| Error::not_found(value.clone()))?;
                }
                ResourceType::Group => {
                    return Err(Error::internal_error(
                        "nested groups not supported".to_string(),
                    ));
                }
            }

            resource_type
        } else {
            match (self.users.get(value), self.groups.get(value)) {
                (None, None) => return Err(Error::not_found(value.clone())),
                (Some(_), None) => ResourceType::User,
                (None, Some(_)) => {
                    return Err(Error::internal_error(
                        "nested groups not supported".to_string(),
                    ));
                }
                (Some(_), Some(_)) => {
                    return Err(Error::internal_error(format!(
                        "{value} returned a user and group!"
                    )));
                }
            }
        };

        Ok(GroupMember {
            resource_type: Some(resource_type.to_string()),
            value: Some(value.clone()),
            display: member.display.clone(),
            reference: member.reference.clone(),
        })
    }

    /// Recomputes every user's read-only `groups` field from the current
    /// group membership, rather than patching it incrementally — the
    /// group-membership graph is the source of truth, `User.groups` is
    /// always a derived view of it.
    fn recompute_user_groups(&mut self) {
        for (user_id, stored_user) in self.users.iter_mut() {
            let mut user_groups = Vec::new();
            for (group_id, stored_group) in &self.groups {
                let is_member = stored_group
                    .resource
                    .members
                    .as_ref()
                    .is_some_and(|members| {
                        members.iter().any(|m| {
                            m.value.as_deref() == Some(user_id.as_str())
                        })
                    });
                if is_member {
                    user_groups.push(UserGroup {
                        value: group_id.clone(),
                        display: Some(
                            stored_group.resource.display_name.clone(),
                        ),
                        group_type: Some(UserGroupType::Direct),
                        reference: None,
                    });
                }
            }
            stored_user.resource.groups = (!user_groups.is_empty())
                .then_some(user_groups);
        }
    }
}

/// A non-optimized provider store implementation for use with tests
pub struct InMemoryProviderStore {
    state: Mutex<InMemoryProviderStoreState>,
}

impl Default for InMemoryProviderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProviderStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InMemoryProviderStoreState {
                users: BTreeMap::new(),
                groups: BTreeMap::new(),
                version_counter: 0,
            }),
        }
    }

    pub fn state(&self) -> InMemoryProviderStoreState {
        self.state.lock().unwrap().clone()
    }
}

/// Apply a `ResourceQuery`'s filter, sort, and pagination over an in-memory
/// collection, reporting no residual since the whole dataset is in hand.
fn query_in_memory<R>(
    items: Vec<StoredParts<R>>,
    query: &ResourceQuery,
) -> AdapterPage<R>
where
    R: Resource + Clone,
{
    let mut paired: Vec<(Value, StoredParts<R>)> = items
        .into_iter()
        .filter_map(|item| {
            serde_json::to_value(&item.resource).ok().map(|v| (v, item))
        })
        .collect();

    if let Some(filter) = &query.filter {
        paired.retain(|(v, _)| eval::evaluate(filter, v));
    }

    if let Some(sort_by) = &query.sort_by {
        paired.sort_by(|a, b| {
            let ordering =
                eval::sort_key_cmp(eval::resolve(&a.0, sort_by), eval::resolve(&b.0, sort_by));
            if query.ascending { ordering } else { ordering.reverse() }
        });
    }

    let total_results = paired.len();
    let start_index = query.start_index.unwrap_or(1).max(1);
    let skip = start_index.saturating_sub(1);

    let windowed = if skip >= paired.len() {
        Vec::new()
    } else {
        let slice = &paired[skip..];
        let take = query.count.map(|c| c.min(slice.len())).unwrap_or(slice.len());
        slice[..take].iter().map(|(_, item)| item.clone()).collect()
    };

    AdapterPage { items: windowed, total_results, residual_filter: None }
}

#[async_trait]
impl Adapter<User> for InMemoryProviderStore {
    type CreateRequest = CreateUserRequest;

    async fn get_resource(
        &self,
        id: &str,
    ) -> Result<Option<StoredParts<User>>, AdapterError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.get(id).cloned())
    }

    async fn query_resources(
        &self,
        query: &ResourceQuery,
    ) -> Result<AdapterPage<User>, AdapterError> {
        let state = self.state.lock().unwrap();
        Ok(query_in_memory(state.users.values().cloned().collect(), query))
    }

    async fn create_resource(
        &self,
        request: CreateUserRequest,
    ) -> Result<StoredParts<User>, AdapterError> {
        let mut state = self.state.lock().unwrap();

        if state
            .users
            .values()
            .any(|s| s.resource.name.eq_ignore_ascii_case(&request.name))
        {
            return Err(Error::conflict(request.name).into());
        }

        let id = Uuid::new_v4().to_string();
        let mut user: User = request.into();
        user.id = id.clone();

        let now = Utc::now();
        let version = state.next_version();
        let stored = StoredParts {
            resource: user,
            meta: StoredMeta { created: now, last_modified: now, version },
        };

        state.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_resource(
        &self,
        id: &str,
        request: CreateUserRequest,
    ) -> Result<StoredParts<User>, AdapterError> {
        let mut state = self.state.lock().unwrap();

        if state.users.values().any(|s| {
            s.resource.name.eq_ignore_ascii_case(&request.name)
                && s.resource.id != id
        }) {
            return Err(Error::conflict(format!(
                "userName {}",
                request.name
            ))
            .into());
        }

        let existing = state
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(id.to_string()))?;

        let mut user: User = request.into();
        user.id = id.to_string();
        user.groups = existing.resource.groups.clone();

        let version = state.next_version();
        let stored = StoredParts {
            resource: user,
            meta: StoredMeta {
                created: existing.meta.created,
                last_modified: Utc::now(),
                version,
            },
        };

        state.users.insert(id.to_string(), stored.clone());
        Ok(stored)
    }

    async fn put_patched(
        &self,
        id: &str,
        patched: Value,
    ) -> Result<StoredParts<User>, AdapterError> {
        let mut state = self.state.lock().unwrap();

        let existing = state
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(id.to_string()))?;

        let mut user: User =
            serde_json::from_value(patched).map_err(|e| {
                Error::invalid_value(format!(
                    "patched resource did not match the User schema: {e}"
                ))
            })?;
        user.id = id.to_string();

        let version = state.next_version();
        let stored = StoredParts {
            resource: user,
            meta: StoredMeta {
                created: existing.meta.created,
                last_modified: Utc::now(),
                version,
            },
        };

        state.users.insert(id.to_string(), stored.clone());
        Ok(stored)
    }

    async fn delete_resource(&self, id: &str) -> Result<bool, AdapterError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.users.remove(id).is_some())
    }
}

#[async_trait]
impl Adapter<Group> for InMemoryProviderStore {
    type CreateRequest = CreateGroupRequest;

    async fn get_resource(
        &self,
        id: &str,
    ) -> Result<Option<StoredParts<Group>>, AdapterError> {
        let state = self.state.lock().unwrap();
        Ok(state.groups.get(id).cloned())
    }

    async fn query_resources(
        &self,
        query: &ResourceQuery,
    ) -> Result<AdapterPage<Group>, AdapterError> {
        let state = self.state.lock().unwrap();
        Ok(query_in_memory(state.groups.values().cloned().collect(), query))
    }

    async fn create_resource(
        &self,
        request: CreateGroupRequest,
    ) -> Result<StoredParts<Group>, AdapterError> {
        let mut state = self.state.lock().unwrap();

        if state.groups.values().any(|s| {
            s.resource.display_name == request.display_name
        }) {
            return Err(Error::conflict(format!(
                "displayName {}",
                request.display_name
            ))
            .into());
        }

        let mut members = request.members.clone();
        if let Some(members) = &mut members {
            let validated: Result<Vec<_>, Error> = members
                .iter()
                .map(|m| state.validate_group_member(m))
                .collect();
            *members = validated?.into_iter().collect();
        }

        let id = Uuid::new_v4().to_string();
        let mut group: Group = request.into();
        group.id = id.clone();
        group.members = members;

        let now = Utc::now();
        let version = state.next_version();
        let stored = StoredParts {
            resource: group,
            meta: StoredMeta { created: now, last_modified: now, version },
        };

        state.groups.insert(id, stored.clone());
        state.recompute_user_groups();
        Ok(stored)
    }

    async fn update_resource(
        &self,
        id: &str,
        request: CreateGroupRequest,
    ) -> Result<StoredParts<Group>, AdapterError> {
        let mut state = self.state.lock().unwrap();

        if state.groups.values().any(|s| {
            s.resource.display_name == request.display_name
                && s.resource.id != id
        }) {
            return Err(Error::conflict(format!(
                "displayName {}",
                request.display_name
            ))
            .into());
        }

        let existing = state
            .groups
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(id.to_string()))?;

        let mut members = request.members.clone();
        if let Some(members) = &mut members {
            let validated: Result<Vec<_>, Error> = members
                .iter()
                .map(|m| state.validate_group_member(m))
                .collect();
            *members = validated?.into_iter().collect();
        }

        let mut group: Group = request.into();
        group.id = id.to_string();
        group.members = members;

        let version = state.next_version();
        let stored = StoredParts {
            resource: group,
            meta: StoredMeta {
                created: existing.meta.created,
                last_modified: Utc::now(),
                version,
            },
        };

        state.groups.insert(id.to_string(), stored.clone());
        state.recompute_user_groups();
        Ok(stored)
    }

    async fn put_patched(
        &self,
        id: &str,
        patched: Value,
    ) -> Result<StoredParts<Group>, AdapterError> {
        let mut state = self.state.lock().unwrap();

        let existing = state
            .groups
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(id.to_string()))?;

        let mut group: Group =
            serde_json::from_value(patched).map_err(|e| {
                Error::invalid_value(format!(
                    "patched resource did not match the Group schema: {e}"
                ))
            })?;
        group.id = id.to_string();

        if let Some(members) = &mut group.members {
            let validated: Result<Vec<_>, Error> = members
                .iter()
                .map(|m| state.validate_group_member(m))
                .collect();
            *members = validated?.into_iter().collect();
        }

        let version = state.next_version();
        let stored = StoredParts {
            resource: group,
            meta: StoredMeta {
                created: existing.meta.created,
                last_modified: Utc::now(),
                version,
            },
        };

        state.groups.insert(id.to_string(), stored.clone());
        state.recompute_user_groups();
        Ok(stored)
    }

    async fn delete_resource(&self, id: &str) -> Result<bool, AdapterError> {
        let mut state = self.state.lock().unwrap();
        let existed = state.groups.remove(id).is_some();
        if existed {
            state.recompute_user_groups();
        }
        Ok(existed)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::query_params::QueryParams;
    use crate::service::ResourceService;
    use slog::{Discard, Logger};
    use std::sync::Arc;

    fn log() -> Logger {
        Logger::root(Discard, slog::o!())
    }

    fn user_service(
        store: InMemoryProviderStore,
    ) -> ResourceService<User, InMemoryProviderStore> {
        ResourceService::new(log(), store, "http://localhost/v2".to_string(), 200)
    }

    fn group_service(
        store: InMemoryProviderStore,
    ) -> ResourceService<Group, InMemoryProviderStore> {
        ResourceService::new(log(), store, "http://localhost/v2".to_string(), 200)
    }

    fn shared_services(
        store: Arc<InMemoryProviderStore>,
    ) -> (
        ResourceService<User, Arc<InMemoryProviderStore>>,
        ResourceService<Group, Arc<InMemoryProviderStore>>,
    ) {
        (
            ResourceService::new(
                log(),
                Arc::clone(&store),
                "http://localhost/v2".to_string(),
                200,
            ),
            ResourceService::new(
                log(),
                store,
                "http://localhost/v2".to_string(),
                200,
            ),
        )
    }

    #[tokio::test]
    async fn create_user_rejects_duplicate_username() {
        let store = InMemoryProviderStore::new();
        let svc = user_service(store);

        let req = CreateUserRequest {
            name: "bjensen".to_string(),
            ..Default::default()
        };
        svc.create(req.clone()).await.unwrap();

        let err = svc.create(req).await.unwrap_err();
        assert_eq!(err.status(), http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn query_users_applies_filter() {
        let store = InMemoryProviderStore::new();
        let svc = user_service(store);

        svc.create(CreateUserRequest {
            name: "bjensen".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
        svc.create(CreateUserRequest {
            name: "rhavens".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

        let params = QueryParams {
            filter: Some(r#"userName eq "bjensen""#.to_string()),
            ..Default::default()
        };
        let list = svc.query(&params).await.unwrap();
        assert_eq!(list.total_results, 1);
        assert_eq!(list.resources[0]["userName"], "bjensen");
    }

    #[tokio::test]
    async fn replace_user_preserves_computed_groups() {
        let store = InMemoryProviderStore::new();
        let svc = user_service(store);

        let created = svc
            .create(CreateUserRequest {
                name: "bjensen".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let id = created.to_value().unwrap()["id"].as_str().unwrap().to_string();

        svc.replace(
            &id,
            CreateUserRequest {
                name: "bjensen".to_string(),
                display_name: Some("Babs Jensen".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn group_membership_is_computed_onto_member_users() {
        let store = Arc::new(InMemoryProviderStore::new());
        let (users, groups) = shared_services(store);

        let bjensen = users
            .create(CreateUserRequest {
                name: "bjensen".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let bjensen_id =
            bjensen.to_value().unwrap()["id"].as_str().unwrap().to_string();

        let mut members = iddqd::IdOrdMap::new();
        let _ = members.insert_overwrite(GroupMember {
            value: Some(bjensen_id.clone()),
            ..Default::default()
        });

        groups
            .create(CreateGroupRequest {
                display_name: "Sales".to_string(),
                external_id: None,
                members: Some(members),
            })
            .await
            .unwrap();

        let fetched = users
            .get(&QueryParams::default(), &bjensen_id)
            .await
            .unwrap();
        let value = fetched.to_value().unwrap();
        let groups_field = value["groups"].as_array().unwrap();
        assert_eq!(groups_field.len(), 1);
        assert_eq!(groups_field[0]["display"], "Sales");
    }

    #[tokio::test]
    async fn create_group_rejects_duplicate_display_name() {
        let store = InMemoryProviderStore::new();
        let svc = group_service(store);

        let req = CreateGroupRequest {
            display_name: "Sales".to_string(),
            external_id: None,
            members: None,
        };
        svc.create(req.clone()).await.unwrap();

        let err = svc.create(req).await.unwrap_err();
        assert_eq!(err.status(), http::StatusCode::CONFLICT);
    }
}
