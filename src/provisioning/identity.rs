mod policies;
pub mod remote;

use super::{ProvisioningError, ResourceKind};
use crate::entities::CreateOutcome;
use async_trait::async_trait;
use policies::{
    account_id_from_arn, bucket_access_policy, stack_policy, BUCKET_POLICY_NAME,
    STACK_POLICY_NAME,
};
use tracing::{event, Level};

pub use policies::trust_policy;

#[async_trait]
pub trait IdentityService: Send + Sync {
    /// ARN of the role, `None` when no role has that name.
    async fn get_role(&self, role_name: &str) -> Result<Option<String>, String>;

    async fn create_role(&self, role_name: &str, trust_policy: &str) -> CreateOutcome<String>;

    async fn update_trust_policy(&self, role_name: &str, trust_policy: &str)
        -> Result<(), String>;

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), String>;
}

/// What the role's inline access policies are scoped to.
pub struct AccessScope<'a> {
    pub bucket_arn: &'a str,
    pub region: &'a str,
    pub function_name: &'a str,
}

fn role_error(cause: String) -> ProvisioningError {
    ProvisioningError {
        resource: ResourceKind::Role,
        cause,
    }
}

async fn create_or_adopt_role<I: IdentityService>(
    identity: &I,
    role_name: &str,
    trust_policy: &str,
) -> Result<String, ProvisioningError> {
    match identity.create_role(role_name, trust_policy).await {
        CreateOutcome::Created(role_arn) => {
            event!(Level::INFO, role = role_name, "Created iam role.");
            Ok(role_arn)
        }
        // somebody else created it between our lookup and create
        CreateOutcome::AlreadyExists => {
            identity
                .update_trust_policy(role_name, trust_policy)
                .await
                .map_err(role_error)?;
            identity
                .get_role(role_name)
                .await
                .map_err(role_error)?
                .ok_or_else(|| {
                    role_error(format!(
                        "Role {} reported as existing but could not be fetched.",
                        role_name
                    ))
                })
        }
        CreateOutcome::Failed(cause) => Err(role_error(cause)),
    }
}

/// Makes sure `role_name` exists with the given trust policy and the
/// pipeline's access policies, returning the role ARN. Both inline policies
/// are written on every run so a reused role converges to the same state as
/// a fresh one.
pub async fn ensure_role<I: IdentityService>(
    identity: &I,
    role_name: &str,
    trust_policy: &str,
    scope: &AccessScope<'_>,
) -> Result<String, ProvisioningError> {
    let role_arn = match identity.get_role(role_name).await.map_err(role_error)? {
        Some(role_arn) => {
            event!(Level::INFO, role = role_name, "Reusing existing iam role.");
            identity
                .update_trust_policy(role_name, trust_policy)
                .await
                .map_err(role_error)?;
            role_arn
        }
        None => create_or_adopt_role(identity, role_name, trust_policy).await?,
    };
    let account_id = account_id_from_arn(&role_arn)
        .ok_or_else(|| role_error(format!("Cannot read account id from role arn {}", role_arn)))?;
    let documents = [
        (
            BUCKET_POLICY_NAME,
            bucket_access_policy(scope.bucket_arn).to_string(),
        ),
        (
            STACK_POLICY_NAME,
            stack_policy(scope.region, account_id, scope.function_name).to_string(),
        ),
    ];
    for (policy_name, document) in &documents {
        identity
            .put_role_policy(role_name, policy_name, document)
            .await
            .map_err(|cause| {
                role_error(format!("Failed to put policy {}:\n{}", policy_name, cause))
            })?;
    }
    Ok(role_arn)
}
