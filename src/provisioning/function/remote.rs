use super::{FunctionPackage, FunctionService};
use crate::entities::CreateOutcome;
use async_trait::async_trait;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::operation::create_function::CreateFunctionError;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{FunctionCode, Runtime};
use aws_sdk_lambda::Client;

#[derive(Clone)]
pub struct LambdaFunctions {
    client: Client,
}

impl LambdaFunctions {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FunctionService for LambdaFunctions {
    async fn create_function(
        &self,
        function_name: &str,
        package: &FunctionPackage,
        role_arn: &str,
    ) -> CreateOutcome<String> {
        let code = FunctionCode::builder()
            .zip_file(Blob::new(package.code.clone()))
            .build();
        let result_future = self
            .client
            .create_function()
            .function_name(function_name)
            .runtime(Runtime::from(package.runtime.as_str()))
            .role(role_arn)
            .handler(&package.handler)
            .code(code)
            .send();
        match result_future.await {
            Ok(output) => match output.function_arn() {
                Some(function_arn) => CreateOutcome::Created(function_arn.to_string()),
                None => CreateOutcome::Failed(format!(
                    "Function {} created but no arn returned.",
                    function_name
                )),
            },
            Err(error) => match error.as_service_error() {
                Some(CreateFunctionError::ResourceConflictException(_)) => {
                    CreateOutcome::AlreadyExists
                }
                _ => CreateOutcome::Failed(format!(
                    "Failed to create function {}:\n{}",
                    function_name,
                    DisplayErrorContext(&error)
                )),
            },
        }
    }

    async fn update_function_code(
        &self,
        function_name: &str,
        package: &FunctionPackage,
    ) -> Result<String, String> {
        let output = self
            .client
            .update_function_code()
            .function_name(function_name)
            .zip_file(Blob::new(package.code.clone()))
            .send()
            .await
            .map_err(|error| {
                format!(
                    "Failed to update code of function {}:\n{}",
                    function_name,
                    DisplayErrorContext(&error)
                )
            })?;
        output
            .function_arn()
            .map(String::from)
            .ok_or_else(|| format!("Function {} updated but no arn returned.", function_name))
    }
}
