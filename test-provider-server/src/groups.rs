// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::*;

#[endpoint {
    method = GET,
    path = "/v2/Groups"
}]
pub async fn list_groups(
    rqctx: RequestContext<Arc<ServerContext>>,
    query_params: Query<scim2_rs::QueryParams>,
) -> Result<Response<Body>, HttpError> {
    let apictx = rqctx.context();
    let query_params = query_params.into_inner();

    let result: Result<Response<Body>, http::Error> =
        match apictx.groups.query(&query_params).await {
            Ok(response) => response.to_http_response(),
            Err(error) => error.to_http_response(),
        };

    result.map_err(HttpError::from)
}

#[derive(Deserialize, JsonSchema)]
pub struct GetGroupPathParam {
    group_id: String,
}

#[endpoint {
    method = GET,
    path = "/v2/Groups/{group_id}"
}]
pub async fn get_group(
    rqctx: RequestContext<Arc<ServerContext>>,
    path_param: Path<GetGroupPathParam>,
    query_params: Query<scim2_rs::QueryParams>,
) -> Result<Response<Body>, HttpError> {
    let apictx = rqctx.context();
    let query_params = query_params.into_inner();
    let path_param = path_param.into_inner();

    let result: Result<Response<Body>, http::Error> = match apictx
        .groups
        .get(&query_params, &path_param.group_id)
        .await
    {
        Ok(response) => response.to_http_response(StatusCode::OK),
        Err(error) => error.to_http_response(),
    };

    result.map_err(HttpError::from)
}

#[endpoint {
    method = POST,
    path = "/v2/Groups",
}]
pub async fn create_group(
    rqctx: RequestContext<Arc<ServerContext>>,
    body: TypedBody<scim2_rs::CreateGroupRequest>,
) -> Result<Response<Body>, HttpError> {
    let apictx = rqctx.context();
    let request = body.into_inner();

    let result: Result<Response<Body>, http::Error> =
        match apictx.groups.create(request).await {
            Ok(response) => response.to_http_response(StatusCode::CREATED),
            Err(error) => error.to_http_response(),
        };

    result.map_err(HttpError::from)
}

#[derive(Deserialize, JsonSchema)]
pub struct PutGroupPathParam {
    group_id: String,
}

#[endpoint {
    method = PUT,
    path = "/v2/Groups/{group_id}"
}]
pub async fn put_group(
    rqctx: RequestContext<Arc<ServerContext>>,
    path_param: Path<PutGroupPathParam>,
    body: TypedBody<scim2_rs::CreateGroupRequest>,
) -> Result<Response<Body>, HttpError> {
    let apictx = rqctx.context();
    let path_param = path_param.into_inner();
    let request = body.into_inner();

    let result: Result<Response<Body>, http::Error> = match apictx
        .groups
        .replace(&path_param.group_id, request)
        .await
    {
        Ok(response) => response.to_http_response(StatusCode::OK),
        Err(error) => error.to_http_response(),
    };

    result.map_err(HttpError::from)
}

#[derive(Deserialize, JsonSchema)]
pub struct DeleteGroupPathParam {
    group_id: String,
}

#[endpoint {
    method = DELETE,
    path = "/v2/Groups/{group_id}"
}]
pub async fn delete_group(
    rqctx: RequestContext<Arc<ServerContext>>,
    path_param: Path<DeleteGroupPathParam>,
) -> Result<Response<Body>, HttpError> {
    let apictx = rqctx.context();
    let path_param = path_param.into_inner();

    let result: Result<Response<Body>, http::Error> =
        match apictx.groups.delete(&path_param.group_id).await {
            Ok(response) => Ok(response),
            Err(error) => error.to_http_response(),
        };

    result.map_err(HttpError::from)
}

#[derive(Deserialize, JsonSchema)]
pub struct PatchGroupPathParam {
    group_id: String,
}

#[endpoint {
    method = PATCH,
    path = "/v2/Groups/{group_id}"
}]
pub async fn patch_group(
    rqctx: RequestContext<Arc<ServerContext>>,
    path_param: Path<PatchGroupPathParam>,
    body: TypedBody<scim2_rs::PatchRequest>,
) -> Result<Response<Body>, HttpError> {
    let apictx = rqctx.context();
    let path_param = path_param.into_inner();

    let result: Result<Response<Body>, http::Error> = match apictx
        .groups
        .patch(&path_param.group_id, body.into_inner())
        .await
    {
        Ok(response) => response.to_http_response(StatusCode::OK),
        Err(error) => error.to_http_response(),
    };

    result.map_err(HttpError::from)
}
