use super::delivery::{DeliveryStreamRequest, DeliveryStreamService, StreamDescription};
use super::function::{FunctionPackage, FunctionService};
use super::identity::IdentityService;
use super::storage::StorageService;
use super::Services;
use crate::entities::{CreateOutcome, StreamStatus};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

pub const ACCOUNT_ID: &str = "123456789012";
pub const REGION: &str = "eu-west-1";

#[derive(Default)]
pub struct FakeState {
    pub roles: HashMap<String, String>,
    pub trust_policies: HashMap<String, String>,
    pub role_policies: HashMap<(String, String), String>,
    pub buckets: HashSet<String>,
    pub functions: HashMap<String, (String, Vec<u8>)>,
    pub streams: HashMap<String, (String, DeliveryStreamRequest)>,
    /// Statuses handed out by describe, in order; ACTIVE once drained.
    pub statuses: VecDeque<StreamStatus>,
    pub records: Vec<(String, Vec<u8>)>,
    /// Operations that fail with a provider error.
    pub failing: HashSet<&'static str>,
    pub calls: Vec<String>,
}

/// In-memory stand-in for all four services, sharing one state so a test
/// can inspect everything the provisioners did.
#[derive(Clone, Default)]
pub struct FakeCloud {
    state: Arc<Mutex<FakeState>>,
}

impl FakeCloud {
    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn services(&self) -> Services<FakeCloud, FakeCloud, FakeCloud, FakeCloud> {
        Services {
            identity: self.clone(),
            storage: self.clone(),
            functions: self.clone(),
            streams: self.clone(),
        }
    }

    pub fn fail(&self, operation: &'static str) {
        self.state().failing.insert(operation);
    }

    pub fn script_statuses(&self, statuses: &[StreamStatus]) {
        self.state().statuses = statuses.iter().cloned().collect();
    }

    pub fn add_role(&self, role_name: &str) -> String {
        let role_arn = role_arn(role_name);
        self.state()
            .roles
            .insert(role_name.to_string(), role_arn.clone());
        role_arn
    }

    pub fn add_bucket(&self, bucket_name: &str) {
        self.state().buckets.insert(bucket_name.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn count_calls(&self, operation: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.split(' ').next() == Some(operation))
            .count()
    }

    // records the call and reports whether it should fail
    fn enter(&self, operation: &'static str, target: &str) -> bool {
        let mut state = self.state();
        state.calls.push(format!("{} {}", operation, target));
        state.failing.contains(operation)
    }
}

pub fn role_arn(role_name: &str) -> String {
    format!("arn:aws:iam::{}:role/{}", ACCOUNT_ID, role_name)
}

pub fn function_arn(function_name: &str) -> String {
    format!("arn:aws:lambda:{}:{}:function:{}", REGION, ACCOUNT_ID, function_name)
}

pub fn stream_arn(stream_name: &str) -> String {
    format!(
        "arn:aws:firehose:{}:{}:deliverystream/{}",
        REGION, ACCOUNT_ID, stream_name
    )
}

#[async_trait]
impl IdentityService for FakeCloud {
    async fn get_role(&self, role_name: &str) -> Result<Option<String>, String> {
        if self.enter("get_role", role_name) {
            return Err(String::from("ServiceFailure"));
        }
        Ok(self.state().roles.get(role_name).cloned())
    }

    async fn create_role(&self, role_name: &str, trust_policy: &str) -> CreateOutcome<String> {
        if self.enter("create_role", role_name) {
            return CreateOutcome::Failed(String::from("LimitExceeded"));
        }
        let mut state = self.state();
        if state.roles.contains_key(role_name) {
            return CreateOutcome::AlreadyExists;
        }
        let role_arn = role_arn(role_name);
        state.roles.insert(role_name.to_string(), role_arn.clone());
        state
            .trust_policies
            .insert(role_name.to_string(), trust_policy.to_string());
        CreateOutcome::Created(role_arn)
    }

    async fn update_trust_policy(
        &self,
        role_name: &str,
        trust_policy: &str,
    ) -> Result<(), String> {
        if self.enter("update_trust_policy", role_name) {
            return Err(String::from("MalformedPolicyDocument"));
        }
        self.state()
            .trust_policies
            .insert(role_name.to_string(), trust_policy.to_string());
        Ok(())
    }

    async fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), String> {
        if self.enter("put_role_policy", &format!("{} {}", role_name, policy_name)) {
            return Err(String::from("MalformedPolicyDocument"));
        }
        self.state().role_policies.insert(
            (role_name.to_string(), policy_name.to_string()),
            policy_document.to_string(),
        );
        Ok(())
    }
}

#[async_trait]
impl StorageService for FakeCloud {
    async fn create_bucket(&self, bucket_name: &str, _region: &str) -> CreateOutcome<()> {
        if self.enter("create_bucket", bucket_name) {
            return CreateOutcome::Failed(String::from("BucketAlreadyExists"));
        }
        if self.state().buckets.insert(bucket_name.to_string()) {
            CreateOutcome::Created(())
        } else {
            CreateOutcome::AlreadyExists
        }
    }
}

#[async_trait]
impl FunctionService for FakeCloud {
    async fn create_function(
        &self,
        function_name: &str,
        package: &FunctionPackage,
        _role_arn: &str,
    ) -> CreateOutcome<String> {
        if self.enter("create_function", function_name) {
            return CreateOutcome::Failed(String::from("InvalidParameterValueException"));
        }
        let mut state = self.state();
        if state.functions.contains_key(function_name) {
            return CreateOutcome::AlreadyExists;
        }
        let function_arn = function_arn(function_name);
        state.functions.insert(
            function_name.to_string(),
            (function_arn.clone(), package.code.clone()),
        );
        CreateOutcome::Created(function_arn)
    }

    async fn update_function_code(
        &self,
        function_name: &str,
        package: &FunctionPackage,
    ) -> Result<String, String> {
        if self.enter("update_function_code", function_name) {
            return Err(String::from("CodeStorageExceededException"));
        }
        match self.state().functions.get_mut(function_name) {
            Some((function_arn, code)) => {
                *code = package.code.clone();
                Ok(function_arn.clone())
            }
            None => Err(String::from("ResourceNotFoundException")),
        }
    }
}

#[async_trait]
impl DeliveryStreamService for FakeCloud {
    async fn create_delivery_stream(
        &self,
        request: &DeliveryStreamRequest,
    ) -> CreateOutcome<String> {
        if self.enter("create_delivery_stream", &request.stream_name) {
            return CreateOutcome::Failed(String::from("InvalidArgumentException"));
        }
        let mut state = self.state();
        if state.streams.contains_key(&request.stream_name) {
            return CreateOutcome::AlreadyExists;
        }
        let stream_arn = stream_arn(&request.stream_name);
        state.streams.insert(
            request.stream_name.clone(),
            (stream_arn.clone(), request.clone()),
        );
        CreateOutcome::Created(stream_arn)
    }

    async fn describe_delivery_stream(
        &self,
        stream_name: &str,
    ) -> Result<StreamDescription, String> {
        if self.enter("describe_delivery_stream", stream_name) {
            return Err(String::from("ServiceUnavailable"));
        }
        let mut state = self.state();
        let stream_arn = match state.streams.get(stream_name) {
            Some((stream_arn, _)) => stream_arn.clone(),
            None => return Err(String::from("ResourceNotFoundException")),
        };
        let status = state.statuses.pop_front().unwrap_or(StreamStatus::Active);
        Ok(StreamDescription { stream_arn, status })
    }

    async fn put_record(&self, stream_name: &str, payload: &[u8]) -> Result<(), String> {
        if self.enter("put_record", stream_name) {
            return Err(String::from("ServiceUnavailableException"));
        }
        self.state()
            .records
            .push((stream_name.to_string(), payload.to_vec()));
        Ok(())
    }
}
