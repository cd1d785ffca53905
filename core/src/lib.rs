// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! This crate implements System for Cross-domain Identity Management
//! version 2.0 (SCIM), RFC 7643 (schema) and RFC 7644 (protocol), as a
//! storage-agnostic protocol engine: filter parsing and evaluation, PATCH
//! semantics, and resource CRUD/query/bulk operations are all implemented
//! against an `Adapter` trait rather than a specific backing store.

mod adapter;
mod bulk;
mod config;
mod eval;
mod filter;
mod group;
mod in_memory_provider_store;
mod meta;
mod patch;
mod query_params;
mod resource;
mod response;
mod service;
mod urn;
mod user;
mod utils;

pub use adapter::Adapter;
pub use adapter::AdapterError;
pub use adapter::AdapterPage;
pub use adapter::ResourceQuery;
pub use bulk::BulkDispatcher;
pub use bulk::BulkOperation;
pub use bulk::BulkRequest;
pub use bulk::BulkResponse;
pub use bulk::BulkResponseOperation;
pub use bulk::DEFAULT_MAX_BULK_OPERATIONS;
pub use config::AuthenticationScheme;
pub use config::BulkSupport;
pub use config::ConfigService;
pub use config::FeatureSupport;
pub use config::FilterSupport;
pub use config::ResourceTypeDocument;
pub use config::SchemaAttribute;
pub use config::SchemaDocument;
pub use config::SchemaExtensionRef;
pub use config::ServiceProviderConfig;
pub use eval::paginate;
pub use eval::project;
pub use filter::AttrPath;
pub use filter::CompareOp;
pub use filter::Filter;
pub use filter::FilterParseError;
pub use filter::FilterValue;
pub use filter::parse_filter;
pub use group::CreateGroupRequest;
pub use group::Group;
pub use group::GroupMember;
pub use in_memory_provider_store::InMemoryProviderStore;
pub use in_memory_provider_store::InMemoryProviderStoreState;
pub use meta::Meta;
pub use meta::StoredMeta;
pub use meta::StoredParts;
pub use patch::PatchOp;
pub use patch::PatchRequest;
pub use patch::PatchRequestError;
pub use query_params::QueryParams;
pub use resource::Resource;
pub use resource::ResourceType;
pub use response::Error;
pub use response::ErrorType;
pub use response::ListResponse;
pub use response::SingleResourceResponse;
pub use response::deleted_http_response;
pub use response::value_to_http_response;
pub use service::DeleteOutcome;
pub use service::ResourceService;
pub use service::ValidateCreate;
pub use user::CreateUserRequest;
pub use user::User;
pub use user::UserGroup;
pub use user::UserGroupType;
