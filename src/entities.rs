use std::fmt;

pub const DEFAULT_ROLE_NAME: &str = "streamer_dev";
pub const DEFAULT_FUNCTION_NAME: &str = "ProcessStreamData";

/// Where the delivery stream takes its records from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceMode {
    /// Records are pushed explicitly with put-record.
    DirectPut,
    /// Records are consumed from an upstream managed stream.
    UpstreamStream { stream_arn: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BufferingHints {
    pub interval_secs: i32,
    pub size_mbs: Option<i32>,
}

/// Parameters of the transformation stage; these are handed to the
/// processor and may differ from the destination's own buffering hints.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingParameters {
    pub retries: u32,
    pub buffer_size_mbs: u32,
    pub buffer_interval_secs: u32,
}

/// The desired end state of the pipeline. Built once, never mutated while
/// converging.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyDescriptor {
    pub stream_name: String,
    pub storage_name: String,
    pub role_name: String,
    pub function_name: String,
    pub source: SourceMode,
    pub buffering: BufferingHints,
    pub processing: ProcessingParameters,
}

impl TopologyDescriptor {
    pub fn new(stream_name: &str, storage_name: &str) -> TopologyDescriptor {
        TopologyDescriptor {
            stream_name: String::from(stream_name),
            storage_name: String::from(storage_name),
            role_name: String::from(DEFAULT_ROLE_NAME),
            function_name: String::from(DEFAULT_FUNCTION_NAME),
            source: SourceMode::DirectPut,
            buffering: BufferingHints {
                interval_secs: 60,
                size_mbs: None,
            },
            processing: ProcessingParameters {
                retries: 1,
                buffer_size_mbs: 3,
                buffer_interval_secs: 60,
            },
        }
    }

    pub fn bucket_name(&self) -> String {
        format!("{}-{}", self.storage_name, self.stream_name)
    }
}

/// Result of a create call against an external service. A conflict with an
/// existing resource is an ordinary branch, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome<T> {
    Created(T),
    AlreadyExists,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamStatus {
    Creating,
    Active,
    Deleting,
    CreatingFailed,
    DeletingFailed,
    Suspended,
    Other(String),
}

impl StreamStatus {
    /// Statuses from which the stream will never become active on its own.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            StreamStatus::Deleting
                | StreamStatus::CreatingFailed
                | StreamStatus::DeletingFailed
                | StreamStatus::Suspended
        )
    }
}

impl From<&str> for StreamStatus {
    fn from(status: &str) -> StreamStatus {
        match status {
            "CREATING" => StreamStatus::Creating,
            "ACTIVE" => StreamStatus::Active,
            "DELETING" => StreamStatus::Deleting,
            "CREATING_FAILED" => StreamStatus::CreatingFailed,
            "DELETING_FAILED" => StreamStatus::DeletingFailed,
            "SUSPENDED" => StreamStatus::Suspended,
            other => StreamStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StreamStatus::Creating => "CREATING",
            StreamStatus::Active => "ACTIVE",
            StreamStatus::Deleting => "DELETING",
            StreamStatus::CreatingFailed => "CREATING_FAILED",
            StreamStatus::DeletingFailed => "DELETING_FAILED",
            StreamStatus::Suspended => "SUSPENDED",
            StreamStatus::Other(other) => other.as_str(),
        };
        f.write_str(text)
    }
}

/// Resource identifiers resolved by a convergence run.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    pub role_arn: String,
    pub bucket_arn: String,
    pub function_arn: String,
    pub stream_arn: String,
}
