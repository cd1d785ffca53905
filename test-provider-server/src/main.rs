// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use clap::Parser;
use dropshot::ApiDescription;
use dropshot::Body;
use dropshot::ConfigDropshot;
use dropshot::HttpError;
use dropshot::HttpResponseOk;
use dropshot::HttpServerStarter;
use dropshot::Path;
use dropshot::Query;
use dropshot::RequestContext;
use dropshot::TypedBody;
use dropshot::endpoint;
use http::Response;
use http::StatusCode;
use schemars::JsonSchema;
use serde::Deserialize;
use slog::Drain;
use std::net::SocketAddr;
use std::sync::Arc;

use scim2_rs::{
    BulkDispatcher, ConfigService, Group, InMemoryProviderStore,
    ResourceService, User,
};

mod bulk;
mod groups;
mod server;
mod users;

pub struct ServerContext {
    store: Arc<InMemoryProviderStore>,
    users: ResourceService<User, Arc<InMemoryProviderStore>>,
    groups: ResourceService<Group, Arc<InMemoryProviderStore>>,
    config: ConfigService,
    enable_bulk: bool,
    max_bulk_operations: usize,
}

impl ServerContext {
    fn bulk_dispatcher(&self) -> Option<BulkDispatcher<'_, Arc<InMemoryProviderStore>>> {
        self.enable_bulk.then(|| {
            BulkDispatcher::new(
                &self.users,
                Some(&self.groups),
                self.max_bulk_operations,
            )
        })
    }
}

fn register_endpoints(
    api_description: &mut ApiDescription<Arc<ServerContext>>,
) -> Result<(), anyhow::Error> {
    // RFC 7644, section 3.2: SCIM Endpoints and HTTP Methods

    api_description.register(users::list_users)?;
    api_description.register(users::get_user)?;
    api_description.register(users::create_user)?;
    api_description.register(users::put_user)?;
    api_description.register(users::delete_user)?;
    api_description.register(users::patch_user)?;

    api_description.register(groups::list_groups)?;
    api_description.register(groups::get_group)?;
    api_description.register(groups::create_group)?;
    api_description.register(groups::put_group)?;
    api_description.register(groups::delete_group)?;
    api_description.register(groups::patch_group)?;

    api_description.register(server::get_resource_types)?;
    api_description.register(server::get_resource_type_by_id)?;
    api_description.register(server::get_schemas)?;
    api_description.register(server::get_schema_by_urn)?;
    api_description.register(server::get_service_provider_config)?;

    api_description.register(bulk::post_bulk)?;

    api_description.register(state)?;

    Ok(())
}

#[endpoint {
    method = GET,
    path = "/state"
}]
pub async fn state(
    rqctx: RequestContext<Arc<ServerContext>>,
) -> Result<HttpResponseOk<scim2_rs::InMemoryProviderStoreState>, HttpError> {
    let apictx = rqctx.context();
    Ok(HttpResponseOk(apictx.store.state()))
}

#[derive(Debug, Parser)]
#[clap(about = "SCIM 2 provider server")]
struct Args {
    #[clap(long, default_value = "127.0.0.1:4567")]
    bind_addr: SocketAddr,

    /// Enable the /Bulk endpoint.
    #[clap(long)]
    enable_bulk: bool,

    #[clap(long, default_value_t = scim2_rs::DEFAULT_MAX_BULK_OPERATIONS)]
    max_bulk_operations: usize,

    #[clap(long, default_value_t = 1_048_576)]
    max_bulk_payload_size: usize,

    /// Ceiling applied to a query's `count`, independent of what the
    /// client asked for.
    #[clap(long, default_value_t = 200)]
    max_filter_results: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt: Args = Args::try_parse()?;

    // from https://docs.rs/slog/latest/slog/ - terminal out
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    let log = slog::Logger::root(drain, slog::o!());

    let config =
        ConfigDropshot { bind_address: opt.bind_addr, ..Default::default() };

    let mut api_description = ApiDescription::<Arc<ServerContext>>::new();

    if let Err(s) = register_endpoints(&mut api_description) {
        anyhow::bail!("Error from register_endpoints: {}", s);
    }

    let store = Arc::new(InMemoryProviderStore::new());
    let location_base = format!("http://{}/v2", opt.bind_addr);

    let ctx = Arc::new(ServerContext {
        store: Arc::clone(&store),
        users: ResourceService::new(
            log.clone(),
            Arc::clone(&store),
            location_base.clone(),
            opt.max_filter_results,
        ),
        groups: ResourceService::new(
            log.clone(),
            Arc::clone(&store),
            location_base,
            opt.max_filter_results,
        ),
        config: ConfigService::new(
            opt.max_filter_results,
            opt.enable_bulk,
            opt.max_bulk_operations,
            opt.max_bulk_payload_size,
            true,
        ),
        enable_bulk: opt.enable_bulk,
        max_bulk_operations: opt.max_bulk_operations,
    });

    let http_server = HttpServerStarter::new(
        &config,
        api_description,
        Arc::clone(&ctx),
        &log,
    );

    if let Err(e) = http_server {
        anyhow::bail!("Error from HttpServerStarter::new: {:?}", e);
    }

    if let Err(s) = http_server.unwrap().start().await {
        anyhow::bail!("Error from start(): {}", s);
    }

    Ok(())
}
