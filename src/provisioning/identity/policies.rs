use serde_json::{json, Value};

pub const BUCKET_POLICY_NAME: &str = "firehose_s3_access";
pub const STACK_POLICY_NAME: &str = "stack_policy";

/// Who may assume the pipeline role: the delivery service and the function
/// runtime.
pub fn trust_policy() -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Sid": "",
                "Effect": "Allow",
                "Principal": { "Service": "firehose.amazonaws.com" },
                "Action": "sts:AssumeRole"
            },
            {
                "Effect": "Allow",
                "Principal": { "Service": "lambda.amazonaws.com" },
                "Action": "sts:AssumeRole"
            }
        ]
    })
}

pub fn bucket_access_policy(bucket_arn: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Sid": "",
                "Effect": "Allow",
                "Action": [
                    "s3:AbortMultipartUpload",
                    "s3:GetBucketLocation",
                    "s3:GetObject",
                    "s3:ListBucket",
                    "s3:ListBucketMultipartUploads",
                    "s3:PutObject"
                ],
                "Resource": [format!("{}/*", bucket_arn), bucket_arn]
            }
        ]
    })
}

/// Permissions the transformation function needs at run time: sentiment
/// analysis, its own log group and being invoked by the delivery stream.
pub fn stack_policy(region: &str, account_id: &str, function_name: &str) -> Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Action": [
                    "comprehend:*",
                    "s3:ListAllMyBuckets",
                    "s3:ListBucket",
                    "s3:GetBucketLocation",
                    "iam:ListRoles",
                    "iam:GetRole"
                ],
                "Effect": "Allow",
                "Resource": "*"
            },
            {
                "Effect": "Allow",
                "Action": "logs:CreateLogGroup",
                "Resource": format!("arn:aws:logs:{}:{}:*", region, account_id)
            },
            {
                "Effect": "Allow",
                "Action": ["logs:CreateLogStream", "logs:PutLogEvents"],
                "Resource": [format!(
                    "arn:aws:logs:{}:{}:log-group:/aws/lambda/{}:*",
                    region, account_id, function_name
                )]
            },
            {
                "Effect": "Allow",
                "Action": ["lambda:InvokeFunction", "lambda:GetFunctionConfiguration"],
                "Resource": [
                    format!("arn:aws:lambda:{}:{}:function:{}", region, account_id, function_name),
                    format!("arn:aws:lambda:{}:{}:function:{}:*", region, account_id, function_name)
                ]
            }
        ]
    })
}

/// Account id is the fifth field of an ARN:
/// `arn:aws:iam::123456789012:role/streamer_dev`.
pub fn account_id_from_arn(arn: &str) -> Option<&str> {
    arn.split(':').nth(4).filter(|account| !account.is_empty())
}
