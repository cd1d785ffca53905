// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The Config Service: serves ServiceProviderConfig, ResourceTypes, and
//! Schemas discovery documents that reflect the running service's actual
//! feature toggles, rather than static JSON with `bulk.supported`/`filter.
//! supported`/`sort.supported` hardcoded regardless of what the service
//! actually does. Document *content* — the attribute catalog a schema
//! lists — is standardized by RFC 7643; only delivery mechanics and the
//! feature-reflecting fields are modeled in depth here, so the attribute
//! lists below are a representative subset, not an exhaustive transcription
//! of RFC 7643 §4.

use schemars::JsonSchema;
use serde::Serialize;

use crate::urn;

#[derive(Serialize, JsonSchema, Debug, Clone)]
pub struct FeatureSupport {
    pub supported: bool,
}

#[derive(Serialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BulkSupport {
    pub supported: bool,
    pub max_operations: usize,
    pub max_payload_size: usize,
}

#[derive(Serialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FilterSupport {
    pub supported: bool,
    pub max_results: usize,
}

#[derive(Serialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationScheme {
    pub name: String,
    pub description: String,
    #[serde(rename = "specUri", skip_serializing_if = "Option::is_none")]
    pub spec_uri: Option<String>,
    #[serde(rename = "type")]
    pub scheme_type: String,
    pub primary: bool,
}

impl AuthenticationScheme {
    fn oauth_bearer() -> Self {
        Self {
            name: "OAuth Bearer Token".to_string(),
            description: "Authentication scheme using the OAuth Bearer \
                          Token Standard"
                .to_string(),
            spec_uri: Some(
                "https://www.rfc-editor.org/info/rfc6750".to_string(),
            ),
            scheme_type: "oauthbearertoken".to_string(),
            primary: true,
        }
    }
}

/// RFC 7644 §5: reflects the running service's actual feature toggles, not
/// a static document.
#[derive(Serialize, JsonSchema, Debug, Clone)]
pub struct ServiceProviderConfig {
    pub schemas: Vec<String>,
    pub patch: FeatureSupport,
    pub bulk: BulkSupport,
    pub filter: FilterSupport,
    #[serde(rename = "changePassword")]
    pub change_password: FeatureSupport,
    pub sort: FeatureSupport,
    pub etag: FeatureSupport,
    #[serde(rename = "authenticationSchemes")]
    pub authentication_schemes: Vec<AuthenticationScheme>,
}

#[derive(Serialize, JsonSchema, Debug, Clone)]
pub struct SchemaExtensionRef {
    pub schema: String,
    pub required: bool,
}

/// RFC 7644 §6: one entry per resource type the service actually exposes.
#[derive(Serialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTypeDocument {
    pub schemas: Vec<String>,
    pub id: String,
    pub name: String,
    pub endpoint: String,
    pub description: String,
    pub schema: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub schema_extensions: Vec<SchemaExtensionRef>,
}

#[derive(Serialize, JsonSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SchemaAttribute {
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: String,
    pub multi_valued: bool,
}

impl SchemaAttribute {
    fn simple(name: &str, attr_type: &str) -> Self {
        Self {
            name: name.to_string(),
            attr_type: attr_type.to_string(),
            multi_valued: false,
        }
    }

    fn multi(name: &str, attr_type: &str) -> Self {
        Self {
            name: name.to_string(),
            attr_type: attr_type.to_string(),
            multi_valued: true,
        }
    }
}

/// RFC 7644 §7: one entry per schema (core or extension) the service
/// understands.
#[derive(Serialize, JsonSchema, Debug, Clone)]
pub struct SchemaDocument {
    pub schemas: Vec<String>,
    pub id: String,
    pub name: String,
    pub attributes: Vec<SchemaAttribute>,
}

/// Serves the three discovery documents, populated from the
/// service's actual construction-time options rather than static constants.
pub struct ConfigService {
    max_filter_results: usize,
    enable_bulk: bool,
    max_bulk_operations: usize,
    max_bulk_payload_size: usize,
    groups_enabled: bool,
}

impl ConfigService {
    pub fn new(
        max_filter_results: usize,
        enable_bulk: bool,
        max_bulk_operations: usize,
        max_bulk_payload_size: usize,
        groups_enabled: bool,
    ) -> Self {
        Self {
            max_filter_results,
            enable_bulk,
            max_bulk_operations,
            max_bulk_payload_size,
            groups_enabled,
        }
    }

    pub fn service_provider_config(&self) -> ServiceProviderConfig {
        ServiceProviderConfig {
            schemas: vec![String::from(urn::SERVICE_PROVIDER_CONFIG_URN)],
            patch: FeatureSupport { supported: true },
            bulk: BulkSupport {
                supported: self.enable_bulk,
                max_operations: if self.enable_bulk {
                    self.max_bulk_operations
                } else {
                    0
                },
                max_payload_size: if self.enable_bulk {
                    self.max_bulk_payload_size
                } else {
                    0
                },
            },
            filter: FilterSupport {
                supported: true,
                max_results: self.max_filter_results,
            },
            change_password: FeatureSupport { supported: false },
            sort: FeatureSupport { supported: true },
            etag: FeatureSupport { supported: false },
            authentication_schemes: vec![AuthenticationScheme::oauth_bearer()],
        }
    }

    pub fn resource_types(&self) -> Vec<ResourceTypeDocument> {
        let mut types = vec![ResourceTypeDocument {
            schemas: vec![String::from(urn::RESOURCETYPE_URN)],
            id: "User".to_string(),
            name: "User".to_string(),
            endpoint: "/Users".to_string(),
            description: "User Account".to_string(),
            schema: String::from(urn::USER_URN),
            schema_extensions: vec![SchemaExtensionRef {
                schema: String::from(urn::ENTERPRISE_USER_URN),
                required: false,
            }],
        }];

        if self.groups_enabled {
            types.push(ResourceTypeDocument {
                schemas: vec![String::from(urn::RESOURCETYPE_URN)],
                id: "Group".to_string(),
                name: "Group".to_string(),
                endpoint: "/Groups".to_string(),
                description: "Group".to_string(),
                schema: String::from(urn::GROUP_URN),
                schema_extensions: vec![],
            });
        }

        types
    }

    pub fn resource_type(&self, id: &str) -> Option<ResourceTypeDocument> {
        self.resource_types().into_iter().find(|rt| rt.id == id)
    }

    pub fn schemas(&self) -> Vec<SchemaDocument> {
        let mut schemas = vec![
            SchemaDocument {
                schemas: vec![String::from(urn::SCHEMA_URN)],
                id: String::from(urn::CORE_URN),
                name: "Core".to_string(),
                attributes: vec![
                    SchemaAttribute::multi("schemas", "string"),
                    SchemaAttribute::simple("id", "string"),
                    SchemaAttribute::simple("externalId", "string"),
                    SchemaAttribute::simple("meta", "complex"),
                ],
            },
            SchemaDocument {
                schemas: vec![String::from(urn::SCHEMA_URN)],
                id: String::from(urn::USER_URN),
                name: "User".to_string(),
                attributes: vec![
                    SchemaAttribute::simple("userName", "string"),
                    SchemaAttribute::simple("name", "complex"),
                    SchemaAttribute::simple("displayName", "string"),
                    SchemaAttribute::simple("active", "boolean"),
                    SchemaAttribute::multi("emails", "complex"),
                    SchemaAttribute::multi("addresses", "complex"),
                    SchemaAttribute::multi("phoneNumbers", "complex"),
                    SchemaAttribute::multi("groups", "complex"),
                ],
            },
        ];

        if self.groups_enabled {
            schemas.push(SchemaDocument {
                schemas: vec![String::from(urn::SCHEMA_URN)],
                id: String::from(urn::ENTERPRISE_USER_URN),
                name: "EnterpriseUser".to_string(),
                attributes: vec![
                    SchemaAttribute::simple("employeeNumber", "string"),
                    SchemaAttribute::simple("costCenter", "string"),
                    SchemaAttribute::simple("organization", "string"),
                    SchemaAttribute::simple("division", "string"),
                    SchemaAttribute::simple("department", "string"),
                    SchemaAttribute::simple("manager", "complex"),
                ],
            });
            schemas.push(SchemaDocument {
                schemas: vec![String::from(urn::SCHEMA_URN)],
                id: String::from(urn::GROUP_URN),
                name: "Group".to_string(),
                attributes: vec![
                    SchemaAttribute::simple("displayName", "string"),
                    SchemaAttribute::multi("members", "complex"),
                ],
            });
        }

        schemas
    }

    pub fn schema(&self, id: &str) -> Option<SchemaDocument> {
        self.schemas().into_iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bulk_support_reflects_disabled_toggle() {
        let config = ConfigService::new(200, false, 100, 1_048_576, true);
        let doc = config.service_provider_config();
        assert!(!doc.bulk.supported);
        assert_eq!(doc.bulk.max_operations, 0);
    }

    #[test]
    fn bulk_support_reflects_enabled_toggle() {
        let config = ConfigService::new(200, true, 50, 2048, true);
        let doc = config.service_provider_config();
        assert!(doc.bulk.supported);
        assert_eq!(doc.bulk.max_operations, 50);
        assert_eq!(doc.bulk.max_payload_size, 2048);
    }

    #[test]
    fn group_resource_type_absent_when_groups_disabled() {
        let config = ConfigService::new(200, false, 100, 1_048_576, false);
        assert!(config.resource_type("Group").is_none());
        assert!(config.resource_type("User").is_some());
        assert!(config.schema(urn::GROUP_URN).is_none());
    }

    #[test]
    fn schema_lookup_by_uri_succeeds_and_404s_on_unknown() {
        let config = ConfigService::new(200, true, 100, 1_048_576, true);
        assert!(config.schema(urn::USER_URN).is_some());
        assert!(config.schema("urn:example:bogus").is_none());
    }
}
