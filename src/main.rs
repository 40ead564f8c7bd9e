pub mod config;
pub mod entities;
pub mod ingestion;
pub mod provisioning;
pub mod publishing;
pub mod readiness;

use aws_config::BehaviorVersion;
use aws_types::region::Region;
use clap::Parser;
use config::Config;
use ingestion::{remote::FilteredStream, start_stream};
use provisioning::delivery::remote::FirehoseStreams;
use provisioning::function::{remote::LambdaFunctions, FunctionPackage};
use provisioning::identity::remote::IamRoles;
use provisioning::storage::remote::S3Buckets;
use provisioning::{converge_topology, Services};
use publishing::RecordPublisher;
use readiness::await_stream_active;
use simple_error::simple_error;
use std::error::Error;
use tracing::{event, Level};

type BoxError = Box<dyn Error + Send + Sync>;

/// Stand up the delivery pipeline and stream matching posts into it.
#[derive(Parser, Debug)]
#[command(name = "streamer", version)]
struct Cli {
    /// Language code of the posts to keep, e.g. `en`
    language: String,
    /// Hashtag to filter on, with or without the leading `#`
    hashtag: String,
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: Level,
}

async fn run(cli: Cli) -> Result<(), BoxError> {
    let config = Config::from_env().map_err(|e| Box::new(simple_error!(format!("{:?}", e))))?;
    let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let region = aws_config
        .region()
        .map(Region::to_string)
        .ok_or_else(|| Box::new(simple_error!("No AWS region configured.")))?;

    let services = Services {
        identity: IamRoles::new(aws_sdk_iam::Client::new(&aws_config)),
        storage: S3Buckets::new(aws_sdk_s3::Client::new(&aws_config)),
        functions: LambdaFunctions::new(aws_sdk_lambda::Client::new(&aws_config)),
        streams: FirehoseStreams::new(aws_sdk_firehose::Client::new(&aws_config)),
    };
    let package = FunctionPackage::load(&config.function_package).await?;
    let topology = converge_topology(&config.descriptor, &services, &region, &package).await?;
    event!(Level::INFO, ?topology, "Topology converged.");

    let active = await_stream_active(
        &services.streams,
        &config.descriptor.stream_name,
        &config.wait_policy,
    )
    .await?;
    event!(
        Level::INFO,
        stream = active.stream_name(),
        arn = active.stream_arn(),
        "Delivery stream is ACTIVE."
    );

    let publisher = RecordPublisher::new(active, services.streams);
    let source = FilteredStream::new(&config.firehose_endpoint, &config.bearer_token);
    let stats = start_stream(&source, &cli.language, &cli.hashtag, &publisher).await?;
    event!(
        Level::INFO,
        forwarded = stats.forwarded,
        malformed = stats.malformed,
        failed = stats.failed,
        "Firehose disconnected."
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        // disable printing the name of the module in every log line.
        .with_target(false)
        .init();
    run(cli).await.map_err(|e| {
        event!(Level::ERROR, error = %e, "Streamer stopped.");
        e
    })
}
