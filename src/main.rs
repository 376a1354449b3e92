use std::process::ExitCode;
use std::sync::atomic::{AtomicU32, Ordering};

use clap::Parser;
use mutuals::config::{Cli, Command};
use mutuals::usecases::user::RepairPolicy;
use tracing_subscriber::EnvFilter;

async fn async_main(cli: Cli) -> anyhow::Result<ExitCode> {
    let controller = mutuals::mongo(&cli.store).await?;

    let (edges, code) = match cli.command {
        Command::Audit => {
            let edges = controller.audit().await?;
            let code = match edges.is_empty() {
                true => ExitCode::SUCCESS,
                false => ExitCode::FAILURE,
            };
            (edges, code)
        },
        Command::Repair { drop } => {
            let policy = match drop {
                true => RepairPolicy::Drop,
                false => RepairPolicy::Restore,
            };
            (controller.repair(policy).await?, ExitCode::SUCCESS)
        },
    };

    for edge in &edges {
        println!("{}", serde_json::to_string(edge)?);
    }
    tracing::info!("{} edge(s) reported", edges.len());

    Ok(code)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name_fn(|| {
            let num = NUM.fetch_add(1, Ordering::SeqCst);
            format!("mutuals-worker-{}", num)
        })
        .build()
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("cannot build runtime: {}", e);
            return ExitCode::FAILURE;
        },
    };

    match rt.block_on(async_main(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        },
    }
}

static NUM: AtomicU32 = AtomicU32::new(0);
