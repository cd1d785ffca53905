// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use clap::{Parser, ValueEnum};
use scim2_test_client::{SyncClient, SyncResourceType, run_sync};
use slog::Drain;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResourceArg {
    Users,
    Groups,
    Both,
}

#[derive(Debug, Parser)]
#[clap(about = "SCIM 2 sync utility: paged copy/upsert between two APIs")]
struct Args {
    #[clap(long)]
    source_url: String,

    #[clap(long)]
    target_url: String,

    /// A Bearer token for the source API.
    #[clap(long)]
    source_bearer: Option<String>,

    /// A Bearer token for the target API.
    #[clap(long)]
    target_bearer: Option<String>,

    #[clap(long, value_enum, default_value_t = ResourceArg::Both)]
    resource: ResourceArg,

    /// Delete target resources whose natural key is absent from the
    /// source's full paged sweep.
    #[clap(long)]
    delete_orphans: bool,
}

fn main() -> anyhow::Result<()> {
    let opt: Args = Args::try_parse()?;

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let log = slog::Logger::root(drain, slog::o!());

    let source = match &opt.source_bearer {
        Some(bearer) => {
            SyncClient::new_with_bearer_auth(opt.source_url, bearer.clone())?
        }
        None => SyncClient::new(opt.source_url),
    };
    let target = match &opt.target_bearer {
        Some(bearer) => {
            SyncClient::new_with_bearer_auth(opt.target_url, bearer.clone())?
        }
        None => SyncClient::new(opt.target_url),
    };

    let resource_types = match opt.resource {
        ResourceArg::Users => vec![SyncResourceType::Users],
        ResourceArg::Groups => vec![SyncResourceType::Groups],
        ResourceArg::Both => {
            vec![SyncResourceType::Users, SyncResourceType::Groups]
        }
    };

    for resource_type in resource_types {
        let report =
            run_sync(&log, &source, &target, resource_type, opt.delete_orphans)?;
        slog::info!(
            log, "sync complete";
            "resource_type" => resource_type.endpoint(),
            "created" => report.created,
            "updated" => report.updated,
            "deleted" => report.deleted,
            "skipped" => report.skipped,
        );
    }

    Ok(())
}
