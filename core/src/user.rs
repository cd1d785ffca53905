// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::*;

/// A single element of a multi-valued complex attribute (emails,
/// phoneNumbers, ims, photos, entitlements, roles, x509Certificates).
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MultiValuedAttr {
    pub value: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub attr_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub attr_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub honorific_prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub honorific_suffix: Option<String>,
}

/// A read-only reference to a Group this User belongs to. Computed by the
/// host collaborator (the adapter or service layer), never set by clients:
/// the core library itself always leaves this `None` on a freshly
/// constructed `User`.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserGroup {
    pub value: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub group_type: Option<UserGroupType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum UserGroupType {
    Direct,
    Indirect,
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Manager {
    pub value: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "$ref")]
    pub reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// The `urn:ietf:params:scim:schemas:extension:enterprise:2.0:User` schema
/// extension.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnterpriseUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_center: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<Manager>,
}

impl EnterpriseUser {
    pub fn is_empty(&self) -> bool {
        self == &EnterpriseUser::default()
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(rename = "userName")]
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    /// An identifier for the resource as defined by the provisioning client
    #[serde(default)]
    pub external_id: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub nick_name: Option<String>,

    #[serde(default)]
    pub profile_url: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub user_type: Option<String>,

    #[serde(default)]
    pub preferred_language: Option<String>,

    #[serde(default)]
    pub locale: Option<String>,

    #[serde(default)]
    pub timezone: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default, rename = "name")]
    pub name_detail: Option<Name>,

    #[serde(default)]
    pub emails: Option<Vec<MultiValuedAttr>>,

    #[serde(default)]
    pub phone_numbers: Option<Vec<MultiValuedAttr>>,

    #[serde(default)]
    pub ims: Option<Vec<MultiValuedAttr>>,

    #[serde(default)]
    pub photos: Option<Vec<MultiValuedAttr>>,

    #[serde(default)]
    pub entitlements: Option<Vec<MultiValuedAttr>>,

    #[serde(default)]
    pub roles: Option<Vec<MultiValuedAttr>>,

    #[serde(default)]
    pub x509_certificates: Option<Vec<MultiValuedAttr>>,

    #[serde(default)]
    pub addresses: Option<Vec<Address>>,

    /// `groups` is a readOnly attribute; a non-empty value here is rejected
    /// by the service layer on create.
    #[serde(default)]
    pub groups: Option<Vec<UserGroup>>,

    #[serde(default, rename = "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User")]
    pub enterprise: Option<EnterpriseUser>,
}

#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    #[serde(rename = "userName")]
    pub name: String,

    pub active: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "name")]
    pub name_detail: Option<Name>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nick_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// Write-only: never serialized back to a client (an explicit
    /// Question). Still deserializable so create/replace/patch requests can
    /// set it.
    #[serde(skip_serializing, default)]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "crate::utils::skip_serializing_list")]
    #[serde(default)]
    pub emails: Option<Vec<MultiValuedAttr>>,

    #[serde(skip_serializing_if = "crate::utils::skip_serializing_list")]
    #[serde(default)]
    pub phone_numbers: Option<Vec<MultiValuedAttr>>,

    #[serde(skip_serializing_if = "crate::utils::skip_serializing_list")]
    #[serde(default)]
    pub ims: Option<Vec<MultiValuedAttr>>,

    #[serde(skip_serializing_if = "crate::utils::skip_serializing_list")]
    #[serde(default)]
    pub photos: Option<Vec<MultiValuedAttr>>,

    #[serde(skip_serializing_if = "crate::utils::skip_serializing_list")]
    #[serde(default)]
    pub entitlements: Option<Vec<MultiValuedAttr>>,

    #[serde(skip_serializing_if = "crate::utils::skip_serializing_list")]
    #[serde(default)]
    pub roles: Option<Vec<MultiValuedAttr>>,

    #[serde(skip_serializing_if = "crate::utils::skip_serializing_list")]
    #[serde(default)]
    pub x509_certificates: Option<Vec<MultiValuedAttr>>,

    #[serde(skip_serializing_if = "crate::utils::skip_serializing_list")]
    #[serde(default)]
    pub addresses: Option<Vec<Address>>,

    /// Read-only, computed: see [`UserGroup`].
    #[serde(skip_serializing_if = "crate::utils::skip_serializing_list")]
    #[serde(default)]
    pub groups: Option<Vec<UserGroup>>,

    #[serde(
        skip_serializing_if = "Option::is_none",
        default,
        rename = "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User"
    )]
    pub enterprise: Option<EnterpriseUser>,
}

impl Resource for User {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn schema() -> String {
        String::from(crate::urn::USER_URN)
    }

    fn resource_type() -> ResourceType {
        ResourceType::User
    }
}

/// A StoredUser combines the fields in User and StoredMeta, the shape an
/// adapter's backing storage naturally produces before it's wrapped as a
/// `StoredParts<User>`.
#[derive(Clone)]
pub struct StoredUser {
    pub user: User,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub version: String,
}

impl From<StoredUser> for StoredParts<User> {
    fn from(u: StoredUser) -> StoredParts<User> {
        let meta = StoredMeta {
            created: u.created,
            last_modified: u.last_modified,
            version: u.version,
        };

        StoredParts { resource: u.user, meta }
    }
}

impl crate::service::ValidateCreate for CreateUserRequest {
    fn validate(&self) -> Result<(), crate::response::Error> {
        // `groups` is readOnly: clients cannot add a user to groups by
        // creating or replacing it with a non-empty `groups` array.
        if let Some(groups) = &self.groups {
            if !groups.is_empty() {
                return Err(crate::response::Error::mutability(
                    "attribute groups is readOnly".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl From<CreateUserRequest> for User {
    fn from(req: CreateUserRequest) -> User {
        User {
            id: String::new(),
            name: req.name,
            active: req.active.unwrap_or(true),
            external_id: req.external_id,
            name_detail: req.name_detail,
            display_name: req.display_name,
            nick_name: req.nick_name,
            profile_url: req.profile_url,
            title: req.title,
            user_type: req.user_type,
            preferred_language: req.preferred_language,
            locale: req.locale,
            timezone: req.timezone,
            password: req.password,
            emails: req.emails,
            phone_numbers: req.phone_numbers,
            ims: req.ims,
            photos: req.photos,
            entitlements: req.entitlements,
            roles: req.roles,
            x509_certificates: req.x509_certificates,
            addresses: req.addresses,
            groups: None,
            enterprise: req.enterprise.filter(|e| !e.is_empty()),
        }
    }
}
