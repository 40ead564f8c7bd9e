pub mod remote;

use super::{ProvisioningError, ResourceKind};
use crate::entities::CreateOutcome;
use async_trait::async_trait;
use std::path::Path;
use tracing::{event, Level};

pub const FUNCTION_RUNTIME: &str = "provided.al2023";
pub const FUNCTION_HANDLER: &str = "bootstrap";

/// A deployable archive of the transformation function.
#[derive(Debug, Clone)]
pub struct FunctionPackage {
    pub code: Vec<u8>,
    pub runtime: String,
    pub handler: String,
}

impl FunctionPackage {
    pub fn new(code: Vec<u8>) -> Self {
        Self {
            code,
            runtime: String::from(FUNCTION_RUNTIME),
            handler: String::from(FUNCTION_HANDLER),
        }
    }

    /// Loads the zip produced by the lambda build of `process_stream_data`.
    pub async fn load(path: &Path) -> Result<Self, ProvisioningError> {
        let code = tokio::fs::read(path).await.map_err(|e| ProvisioningError {
            resource: ResourceKind::Function,
            cause: format!("Failed to read function package {}:\n{}", path.display(), e),
        })?;
        Ok(Self::new(code))
    }
}

#[async_trait]
pub trait FunctionService: Send + Sync {
    async fn create_function(
        &self,
        function_name: &str,
        package: &FunctionPackage,
        role_arn: &str,
    ) -> CreateOutcome<String>;

    async fn update_function_code(
        &self,
        function_name: &str,
        package: &FunctionPackage,
    ) -> Result<String, String>;
}

fn function_error(cause: String) -> ProvisioningError {
    ProvisioningError {
        resource: ResourceKind::Function,
        cause,
    }
}

/// Registers the function, or replaces the code of the one already
/// registered under that name. Returns the function ARN.
pub async fn ensure_function<F: FunctionService>(
    functions: &F,
    function_name: &str,
    package: &FunctionPackage,
    role_arn: &str,
) -> Result<String, ProvisioningError> {
    event!(
        Level::INFO,
        function = function_name,
        role = role_arn,
        "Upserting transformation function."
    );
    match functions
        .create_function(function_name, package, role_arn)
        .await
    {
        CreateOutcome::Created(function_arn) => Ok(function_arn),
        CreateOutcome::AlreadyExists => {
            event!(
                Level::INFO,
                function = function_name,
                "Function already registered, updating its code."
            );
            functions
                .update_function_code(function_name, package)
                .await
                .map_err(function_error)
        }
        CreateOutcome::Failed(cause) => Err(function_error(cause)),
    }
}
