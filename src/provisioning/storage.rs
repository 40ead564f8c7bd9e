pub mod remote;

use super::{ProvisioningError, ResourceKind};
use crate::entities::CreateOutcome;
use async_trait::async_trait;
use tracing::{event, Level};

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates a private bucket constrained to `region`.
    async fn create_bucket(&self, bucket_name: &str, region: &str) -> CreateOutcome<()>;
}

pub fn bucket_arn(bucket_name: &str) -> String {
    format!("arn:aws:s3:::{}", bucket_name)
}

/// Makes sure the bucket exists and returns its ARN. A bucket already owned
/// by the caller counts as success; anything else stops the run, since
/// delivering into unconfirmed storage would lose data silently.
pub async fn ensure_bucket<S: StorageService>(
    storage: &S,
    bucket_name: &str,
    region: &str,
) -> Result<String, ProvisioningError> {
    event!(Level::INFO, bucket = bucket_name, "Creating a bucket...");
    match storage.create_bucket(bucket_name, region).await {
        CreateOutcome::Created(()) => Ok(bucket_arn(bucket_name)),
        CreateOutcome::AlreadyExists => {
            event!(Level::INFO, bucket = bucket_name, "Bucket already exists. Skipping.");
            Ok(bucket_arn(bucket_name))
        }
        CreateOutcome::Failed(cause) => Err(ProvisioningError {
            resource: ResourceKind::Bucket,
            cause,
        }),
    }
}
