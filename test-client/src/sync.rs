// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The Sync Utility: pages through a source SCIM API and
//! upserts each resource into a target SCIM API, optionally deleting
//! target resources whose natural key no longer appears in the source.
//! Grounded in the teacher's `test-client::Tester` — same
//! `reqwest::blocking::Client` + optional bearer auth + JSON-decoding
//! helper shape — repurposed from conformance assertions into copy/upsert.

use std::collections::HashSet;

use anyhow::{Context, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header;
use serde_json::Value;
use slog::{Logger, info, warn};

use scim2_rs::ListResponse;

/// The two resource types the Sync Utility knows how to copy, plus their
/// natural (client-visible, uniqueness-enforced) key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncResourceType {
    Users,
    Groups,
}

impl SyncResourceType {
    pub fn endpoint(&self) -> &'static str {
        match self {
            SyncResourceType::Users => "Users",
            SyncResourceType::Groups => "Groups",
        }
    }

    /// The attribute that identifies a resource across the two APIs, since
    /// `id` is server-assigned independently by each side.
    fn natural_key_field(&self) -> &'static str {
        match self {
            SyncResourceType::Users => "userName",
            SyncResourceType::Groups => "displayName",
        }
    }

    fn natural_key(&self, resource: &Value) -> Option<String> {
        resource
            .get(self.natural_key_field())
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// A thin blocking HTTP client bound to one SCIM API base URL, the same
/// shape as the teacher's `Tester`.
pub struct SyncClient {
    url: String,
    client: Client,
}

impl SyncClient {
    pub fn new(url: String) -> Self {
        Self { url, client: Client::new() }
    }

    pub fn new_with_bearer_auth(
        url: String,
        bearer: String,
    ) -> anyhow::Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {bearer}"))?,
        );
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { url, client })
    }

    /// Fetches one page of `resource_type`'s list endpoint (RFC 7644 §3.4.2
    /// pagination contract: 1-based `startIndex`, `count` per page).
    fn list_page(
        &self,
        resource_type: SyncResourceType,
        start_index: usize,
        count: usize,
    ) -> anyhow::Result<ListResponse> {
        let result = self
            .client
            .get(format!("{}/{}", self.url, resource_type.endpoint()))
            .query(&[("startIndex", start_index), ("count", count)])
            .send()
            .with_context(|| {
                format!("listing {} from {}", resource_type.endpoint(), self.url)
            })?;

        if result.status() != StatusCode::OK {
            bail!(
                "GET {} returned status {}",
                resource_type.endpoint(),
                result.status()
            );
        }

        Ok(result.json()?)
    }

    /// Pages through the full `resource_type` collection, yielding every
    /// resource as a flattened JSON object (so callers don't need to know
    /// the concrete `User`/`Group` shape to read the natural key).
    fn list_all(
        &self,
        resource_type: SyncResourceType,
    ) -> anyhow::Result<Vec<Value>> {
        const PAGE_SIZE: usize = 100;

        let mut resources = Vec::new();
        let mut start_index = 1;

        loop {
            let page = self.list_page(resource_type, start_index, PAGE_SIZE)?;
            let page_len = page.resources.len();
            resources.extend(page.resources.into_iter().map(Value::Object));

            if page_len == 0 || resources.len() >= page.total_results {
                break;
            }
            start_index += page_len;
        }

        Ok(resources)
    }

    fn find_by_natural_key(
        &self,
        resource_type: SyncResourceType,
        key: &str,
    ) -> anyhow::Result<Option<Value>> {
        let filter = format!(
            "{} eq {:?}",
            resource_type.natural_key_field(),
            key
        );
        let result = self
            .client
            .get(format!("{}/{}", self.url, resource_type.endpoint()))
            .query(&[("filter", filter.as_str())])
            .send()?;

        if result.status() != StatusCode::OK {
            bail!(
                "filtered GET {} returned status {}",
                resource_type.endpoint(),
                result.status()
            );
        }

        let page: ListResponse = result.json()?;
        Ok(page.resources.into_iter().next().map(Value::Object))
    }

    fn create(
        &self,
        resource_type: SyncResourceType,
        body: &Value,
    ) -> anyhow::Result<()> {
        let result = self
            .client
            .post(format!("{}/{}", self.url, resource_type.endpoint()))
            .json(body)
            .send()?;

        if result.status() != StatusCode::CREATED {
            bail!(
                "POST {} returned status {}: {}",
                resource_type.endpoint(),
                result.status(),
                result.text().unwrap_or_default()
            );
        }
        Ok(())
    }

    fn replace(
        &self,
        resource_type: SyncResourceType,
        id: &str,
        body: &Value,
    ) -> anyhow::Result<()> {
        let result = self
            .client
            .put(format!("{}/{}/{}", self.url, resource_type.endpoint(), id))
            .json(body)
            .send()?;

        if result.status() != StatusCode::OK {
            bail!(
                "PUT {}/{} returned status {}: {}",
                resource_type.endpoint(),
                id,
                result.status(),
                result.text().unwrap_or_default()
            );
        }
        Ok(())
    }

    fn delete(
        &self,
        resource_type: SyncResourceType,
        id: &str,
    ) -> anyhow::Result<()> {
        let result = self
            .client
            .delete(format!("{}/{}/{}", self.url, resource_type.endpoint(), id))
            .send()?;

        if result.status() != StatusCode::NO_CONTENT
            && result.status() != StatusCode::NOT_FOUND
        {
            bail!(
                "DELETE {}/{} returned status {}",
                resource_type.endpoint(),
                id,
                result.status()
            );
        }
        Ok(())
    }
}

/// Strips server-controlled fields (`id`, `meta`, `schemas`) from a source
/// resource before it's sent as a create/replace body — the target assigns
/// its own `id`/`meta` (these are server-controlled, read-only
/// to clients).
fn strip_server_controlled(mut resource: Value) -> Value {
    if let Value::Object(obj) = &mut resource {
        obj.remove("id");
        obj.remove("meta");
        obj.remove("schemas");
        // `groups` on User is read-only and computed by a collaborator
        // a collaborator computes it server-side; never offered back as create/replace input.
        obj.remove("groups");
    }
    resource
}

/// Pages through `source`'s `resource_type` collection and upserts each
/// resource into `target` by natural-key lookup-then-PUT-or-POST. When
/// `delete_orphans` is set, also pages through `target` and deletes any
/// resource whose natural key was not seen in the source sweep.
pub fn run_sync(
    log: &Logger,
    source: &SyncClient,
    target: &SyncClient,
    resource_type: SyncResourceType,
    delete_orphans: bool,
) -> anyhow::Result<SyncReport> {
    let source_resources = source.list_all(resource_type)?;

    let mut report = SyncReport::default();
    let mut seen_keys = HashSet::new();

    for resource in source_resources {
        let Some(key) = resource_type.natural_key(&resource) else {
            warn!(
                log, "skipping source resource with no natural key";
                "resource_type" => resource_type.endpoint(),
            );
            report.skipped += 1;
            continue;
        };
        seen_keys.insert(key.clone());

        let body = strip_server_controlled(resource);
        match target.find_by_natural_key(resource_type, &key)? {
            Some(existing) => {
                let id = existing
                    .get("id")
                    .and_then(Value::as_str)
                    .context("target resource missing id")?;
                target.replace(resource_type, id, &body)?;
                info!(log, "updated"; "resource_type" => resource_type.endpoint(), "key" => &key);
                report.updated += 1;
            }
            None => {
                target.create(resource_type, &body)?;
                info!(log, "created"; "resource_type" => resource_type.endpoint(), "key" => &key);
                report.created += 1;
            }
        }
    }

    if delete_orphans {
        for resource in target.list_all(resource_type)? {
            let Some(key) = resource_type.natural_key(&resource) else {
                continue;
            };
            if seen_keys.contains(&key) {
                continue;
            }
            let Some(id) = resource.get("id").and_then(Value::as_str) else {
                continue;
            };
            target.delete(resource_type, id)?;
            info!(log, "deleted orphan"; "resource_type" => resource_type.endpoint(), "key" => &key);
            report.deleted += 1;
        }
    }

    Ok(report)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
}
