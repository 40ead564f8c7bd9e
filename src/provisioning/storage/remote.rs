use super::StorageService;
use crate::entities::CreateOutcome;
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::types::{BucketCannedAcl, BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;

// S3 rejects an explicit location constraint for its default region.
const DEFAULT_S3_REGION: &str = "us-east-1";

#[derive(Clone)]
pub struct S3Buckets {
    client: Client,
}

impl S3Buckets {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StorageService for S3Buckets {
    async fn create_bucket(&self, bucket_name: &str, region: &str) -> CreateOutcome<()> {
        let mut request = self
            .client
            .create_bucket()
            .bucket(bucket_name)
            .acl(BucketCannedAcl::Private);
        if region != DEFAULT_S3_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        match request.send().await {
            Ok(_) => CreateOutcome::Created(()),
            Err(error) => match error.as_service_error() {
                Some(CreateBucketError::BucketAlreadyOwnedByYou(_)) => {
                    CreateOutcome::AlreadyExists
                }
                _ => CreateOutcome::Failed(format!(
                    "Failed to create bucket {}:\n{}",
                    bucket_name,
                    DisplayErrorContext(&error)
                )),
            },
        }
    }
}
