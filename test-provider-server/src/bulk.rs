// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::*;

#[endpoint {
    method = POST,
    path = "/v2/Bulk",
}]
pub async fn post_bulk(
    rqctx: RequestContext<Arc<ServerContext>>,
    body: TypedBody<scim2_rs::BulkRequest>,
) -> Result<Response<Body>, HttpError> {
    let apictx = rqctx.context();
    let request = body.into_inner();

    let Some(dispatcher) = apictx.bulk_dispatcher() else {
        return scim2_rs::Error::not_implemented(
            "bulk operations are not enabled on this server".to_string(),
        )
        .to_http_response()
        .map_err(HttpError::from);
    };

    let result = match dispatcher.dispatch(request).await {
        Ok(response) => scim2_rs::value_to_http_response(
            StatusCode::OK,
            &response,
            "serializing bulk response failed",
        ),
        Err(error) => error.to_http_response(),
    };

    result.map_err(HttpError::from)
}
