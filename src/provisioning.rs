pub mod delivery;
pub mod function;
pub mod identity;
pub mod storage;
#[cfg(test)]
pub(crate) mod test_support;

use crate::entities::{Topology, TopologyDescriptor};
use delivery::{ensure_delivery_stream, DeliveryStreamService};
use function::{ensure_function, FunctionPackage, FunctionService};
use identity::{ensure_role, trust_policy, AccessScope, IdentityService};
use std::fmt;
use storage::{bucket_arn, ensure_bucket, StorageService};
use tracing::{event, Level};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResourceKind {
    Role,
    Bucket,
    Function,
    DeliveryStream,
}

#[derive(Debug)]
pub struct ProvisioningError {
    pub resource: ResourceKind,
    pub cause: String,
}

impl fmt::Display for ProvisioningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to provision {:?}: {}", self.resource, self.cause)
    }
}

impl std::error::Error for ProvisioningError {}

/// Client handles for every service the topology spans. Built once and
/// borrowed by each provisioner.
pub struct Services<I, S, F, D> {
    pub identity: I,
    pub storage: S,
    pub functions: F,
    pub streams: D,
}

/// Brings the topology described by `descriptor` into existence, reusing
/// whatever already exists. Every step is create-or-reuse, so after a
/// failure the whole run can simply be repeated.
///
/// The returned stream is not necessarily active yet; see
/// [`crate::readiness::await_active`].
pub async fn converge_topology<I, S, F, D>(
    descriptor: &TopologyDescriptor,
    services: &Services<I, S, F, D>,
    region: &str,
    package: &FunctionPackage,
) -> Result<Topology, ProvisioningError>
where
    I: IdentityService,
    S: StorageService,
    F: FunctionService,
    D: DeliveryStreamService,
{
    let bucket_name = descriptor.bucket_name();
    let planned_bucket_arn = bucket_arn(&bucket_name);
    let scope = AccessScope {
        bucket_arn: &planned_bucket_arn,
        region,
        function_name: &descriptor.function_name,
    };
    event!(Level::INFO, role = descriptor.role_name.as_str(), "Using iam role.");
    let role_arn = ensure_role(
        &services.identity,
        &descriptor.role_name,
        &trust_policy().to_string(),
        &scope,
    )
    .await?;
    let bucket_arn = ensure_bucket(&services.storage, &bucket_name, region).await?;
    let function_arn = ensure_function(
        &services.functions,
        &descriptor.function_name,
        package,
        &role_arn,
    )
    .await?;
    let stream_arn = ensure_delivery_stream(
        &services.streams,
        descriptor,
        &bucket_arn,
        &role_arn,
        &function_arn,
    )
    .await?;
    Ok(Topology {
        role_arn,
        bucket_arn,
        function_arn,
        stream_arn,
    })
}
