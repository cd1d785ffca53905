pub const CORE_URN: &str = "urn:ietf:params:scim:schemas:core:2.0:Core";
pub const ERROR_URN: &str = "urn:ietf:params:scim:api:messages:2.0:Error";
pub const GROUP_URN: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";
pub const LISTRESPONSE_URN: &str =
    "urn:ietf:params:scim:api:messages:2.0:ListResponse";
pub const PATCHOP_URN: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";
pub const RESOURCETYPE_URN: &str =
    "urn:ietf:params:scim:schemas:core:2.0:ResourceType";
pub const USER_URN: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
pub const ENTERPRISE_USER_URN: &str =
    "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";
pub const SERVICE_PROVIDER_CONFIG_URN: &str =
    "urn:ietf:params:scim:schemas:core:2.0:ServiceProviderConfig";
pub const SCHEMA_URN: &str = "urn:ietf:params:scim:schemas:core:2.0:Schema";
pub const BULK_REQUEST_URN: &str =
    "urn:ietf:params:scim:api:messages:2.0:BulkRequest";
pub const BULK_RESPONSE_URN: &str =
    "urn:ietf:params:scim:api:messages:2.0:BulkResponse";
