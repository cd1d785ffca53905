// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::*;

#[endpoint {
    method = GET,
    path = "/v2/ResourceTypes"
}]
pub async fn get_resource_types(
    rqctx: RequestContext<Arc<ServerContext>>,
) -> Result<Response<Body>, HttpError> {
    let apictx = rqctx.context();
    let types = apictx.config.resource_types();

    scim2_rs::value_to_http_response(
        StatusCode::OK,
        &types,
        "serializing resource types failed",
    )
    .map_err(HttpError::from)
}

#[derive(Deserialize, JsonSchema)]
pub struct ResourceTypePathParam {
    id: String,
}

#[endpoint {
    method = GET,
    path = "/v2/ResourceTypes/{id}"
}]
pub async fn get_resource_type_by_id(
    rqctx: RequestContext<Arc<ServerContext>>,
    path_param: Path<ResourceTypePathParam>,
) -> Result<Response<Body>, HttpError> {
    let apictx = rqctx.context();
    let id = path_param.into_inner().id;

    let result = match apictx.config.resource_type(&id) {
        Some(resource_type) => scim2_rs::value_to_http_response(
            StatusCode::OK,
            &resource_type,
            "serializing resource type failed",
        ),
        None => scim2_rs::Error::not_found(id).to_http_response(),
    };

    result.map_err(HttpError::from)
}

#[endpoint {
    method = GET,
    path = "/v2/Schemas"
}]
pub async fn get_schemas(
    rqctx: RequestContext<Arc<ServerContext>>,
) -> Result<Response<Body>, HttpError> {
    let apictx = rqctx.context();
    let schemas = apictx.config.schemas();

    scim2_rs::value_to_http_response(
        StatusCode::OK,
        &schemas,
        "serializing schemas failed",
    )
    .map_err(HttpError::from)
}

#[derive(Deserialize, JsonSchema)]
pub struct SchemaPathParam {
    urn: String,
}

#[endpoint {
    method = GET,
    path = "/v2/Schemas/{urn}"
}]
pub async fn get_schema_by_urn(
    rqctx: RequestContext<Arc<ServerContext>>,
    path_param: Path<SchemaPathParam>,
) -> Result<Response<Body>, HttpError> {
    let apictx = rqctx.context();
    let urn = path_param.into_inner().urn;

    let result = match apictx.config.schema(&urn) {
        Some(schema) => scim2_rs::value_to_http_response(
            StatusCode::OK,
            &schema,
            "serializing schema failed",
        ),
        None => scim2_rs::Error::not_found(urn).to_http_response(),
    };

    result.map_err(HttpError::from)
}

#[endpoint {
    method = GET,
    path = "/v2/ServiceProviderConfig"
}]
pub async fn get_service_provider_config(
    rqctx: RequestContext<Arc<ServerContext>>,
) -> Result<Response<Body>, HttpError> {
    let apictx = rqctx.context();
    let config = apictx.config.service_provider_config();

    scim2_rs::value_to_http_response(
        StatusCode::OK,
        &config,
        "serializing service provider config failed",
    )
    .map_err(HttpError::from)
}
