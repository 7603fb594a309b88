//! AWS-backed collaborators
//!
//! - [`S3ObjectStore`]: source objects (S3)
//! - [`ElasticTranscoder`]: MP3 transcode jobs (Elastic Transcoder)
//! - [`DynamoViewStore`]: view tables (DynamoDB)
//!
//! Clients are built once per process from a shared `SdkConfig`.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{FetchError, StoreError, TranscodeSubmitError};
use crate::store::{Item, JobHandle, ListAppend, ObjectStore, TranscodeJob, Transcoder, ViewStore};

/// Object storage backed by S3
#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::from_client(aws_sdk_s3::Client::new(sdk_config))
    }

    /// Create from a pre-built client
    pub fn from_client(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|se| se.is_no_such_key()).unwrap_or(false) {
                    FetchError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    FetchError::Unreadable {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                        reason: aws_sdk_s3::error::DisplayErrorContext(&e).to_string(),
                    }
                }
            })?;

        // Tag parsing needs the whole file
        let collected = response.body.collect().await.map_err(|e| FetchError::Unreadable {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        Ok(collected.into_bytes().to_vec())
    }
}

/// Transcoder backed by Elastic Transcoder
#[derive(Clone, Debug)]
pub struct ElasticTranscoder {
    client: aws_sdk_elastictranscoder::Client,
}

impl ElasticTranscoder {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::from_client(aws_sdk_elastictranscoder::Client::new(sdk_config))
    }

    pub fn from_client(client: aws_sdk_elastictranscoder::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transcoder for ElasticTranscoder {
    async fn create_job(&self, job: &TranscodeJob) -> Result<JobHandle, TranscodeSubmitError> {
        use aws_sdk_elastictranscoder::types::{CreateJobOutput, JobInput};

        let input = JobInput::builder()
            .key(&job.input_key)
            .container(&job.input_container)
            .build();
        let output = CreateJobOutput::builder()
            .key(&job.output_key)
            .preset_id(&job.preset_id)
            .build();

        let mut request = self
            .client
            .create_job()
            .pipeline_id(&job.pipeline_id)
            .input(input)
            .output(output);
        for (name, value) in &job.user_metadata {
            request = request.user_metadata(name, value);
        }

        let response = request.send().await.map_err(|e| {
            TranscodeSubmitError(aws_sdk_elastictranscoder::error::DisplayErrorContext(&e).to_string())
        })?;

        let id = response
            .job()
            .and_then(|j| j.id())
            .unwrap_or_default()
            .to_string();
        Ok(JobHandle { id })
    }
}

/// View store backed by DynamoDB
///
/// Items are JSON documents; album appends use a single `UpdateItem` with
/// `list_append(if_not_exists(...))`, which DynamoDB applies atomically.
#[derive(Clone, Debug)]
pub struct DynamoViewStore {
    client: aws_sdk_dynamodb::Client,
}

impl DynamoViewStore {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::from_client(aws_sdk_dynamodb::Client::new(sdk_config))
    }

    pub fn from_client(client: aws_sdk_dynamodb::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ViewStore for DynamoViewStore {
    async fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item_to_attributes(&item)))
            .send()
            .await
            .map_err(|e| {
                StoreError::Backend(aws_sdk_dynamodb::error::DisplayErrorContext(&e).to_string())
            })?;
        Ok(())
    }

    async fn append_to_list(&self, table: &str, update: ListAppend) -> Result<(), StoreError> {
        let expression = append_expression(&update);

        let mut request = self
            .client
            .update_item()
            .table_name(table)
            .set_key(Some(item_to_attributes(&update.key)))
            .update_expression(expression.update)
            .expression_attribute_values(":entry", AttributeValue::L(vec![json_to_attribute(&update.entry)]))
            .expression_attribute_values(":empty", AttributeValue::L(Vec::new()));
        for (placeholder, name) in expression.names {
            request = request.expression_attribute_names(placeholder, name);
        }
        for (placeholder, value) in expression.values {
            request = request.expression_attribute_values(placeholder, json_to_attribute(&value));
        }

        request.send().await.map_err(|e| {
            StoreError::Backend(aws_sdk_dynamodb::error::DisplayErrorContext(&e).to_string())
        })?;
        Ok(())
    }
}

/// Update expression pieces for a [`ListAppend`]
#[derive(Debug, PartialEq)]
struct AppendExpression {
    update: String,
    names: Vec<(String, String)>,
    values: Vec<(String, Value)>,
}

/// `SET #list = list_append(if_not_exists(#list, :empty), :entry), #s0 = :s0, ...`
///
/// Attribute names always go through placeholders so reserved words are safe.
fn append_expression(update: &ListAppend) -> AppendExpression {
    let mut clauses = vec!["#list = list_append(if_not_exists(#list, :empty), :entry)".to_string()];
    let mut names = vec![("#list".to_string(), update.list_attribute.clone())];
    let mut values = Vec::new();

    for (index, (name, value)) in update.set.iter().enumerate() {
        clauses.push(format!("#s{index} = :s{index}"));
        names.push((format!("#s{index}"), name.clone()));
        values.push((format!(":s{index}"), value.clone()));
    }

    AppendExpression {
        update: format!("SET {}", clauses.join(", ")),
        names,
        values,
    }
}

fn item_to_attributes(item: &Item) -> HashMap<String, AttributeValue> {
    item.iter()
        .map(|(name, value)| (name.clone(), json_to_attribute(value)))
        .collect()
}

/// Convert a JSON value to a DynamoDB attribute
fn json_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(list) => AttributeValue::L(list.iter().map(json_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(item_to_attributes(map)),
    }
}
