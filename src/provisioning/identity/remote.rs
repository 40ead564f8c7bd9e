use super::IdentityService;
use crate::entities::CreateOutcome;
use async_trait::async_trait;
use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_iam::operation::{create_role::CreateRoleError, get_role::GetRoleError};
use aws_sdk_iam::Client;

/// Identity boundary backed by IAM.
#[derive(Clone)]
pub struct IamRoles {
    client: Client,
}

impl IamRoles {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityService for IamRoles {
    async fn get_role(&self, role_name: &str) -> Result<Option<String>, String> {
        match self.client.get_role().role_name(role_name).send().await {
            Ok(output) => match output.role() {
                Some(role) => Ok(Some(role.arn().to_string())),
                None => Err(format!("Role {} returned without a description.", role_name)),
            },
            Err(error) => match error.as_service_error() {
                Some(GetRoleError::NoSuchEntityException(_)) => Ok(None),
                _ => Err(format!(
                    "Failed to look up role {}:\n{}",
                    role_name,
                    DisplayErrorContext(&error)
                )),
            },
        }
    }

    async fn create_role(&self, role_name: &str, trust_policy: &str) -> CreateOutcome<String> {
        let result_future = self
            .client
            .create_role()
            .role_name(role_name)
            .assume_role_policy_document(trust_policy)
            .send();
        match result_future.await {
            Ok(output) => match output.role() {
                Some(role) => CreateOutcome::Created(role.arn().to_string()),
                None => CreateOutcome::Failed(format!(
                    "Role {} created but no arn returned.",
                    role_name
                )),
            },
            Err(error) => match error.as_service_error() {
                Some(CreateRoleError::EntityAlreadyExistsException(_)) => {
                    CreateOutcome::AlreadyExists
                }
                _ => CreateOutcome::Failed(format!("{}", DisplayErrorContext(&error))),
            },
        }
    }

    async fn update_trust_policy(
        &self,
        role_name: &str,
        trust_policy: &str,
    ) -> Result<(), String> {
        self.client
            .update_assume_role_policy()
            .role_name(role_name)
            .policy_document(trust_policy)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                format!(
                    "Failed to update trust policy of {}:\n{}",
                    role_name,
                    DisplayErrorContext(&error)
                )
            })
    }

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), String> {
        self.client
            .put_role_policy()
            .role_name(role_name)
            .policy_name(policy_name)
            .policy_document(policy_document)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| format!("{}", DisplayErrorContext(&error)))
    }
}
