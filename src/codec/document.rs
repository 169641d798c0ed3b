//! The declarative pipeline document

use crate::core::{
    error::{PipelineError, Result},
    handler::Parameters,
};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Key naming the action of a record
pub const ACTION_NAME_KEY: &str = "action_name";

/// One action of a document: its name plus the parameters handed to it
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    pub action_name: String,
    /// Never contains [`ACTION_NAME_KEY`]
    pub parameters: Parameters,
}

impl ActionRecord {
    /// Build a record; a parameter named `action_name` is dropped
    pub fn new(action_name: impl Into<String>, mut parameters: Parameters) -> Self {
        parameters.remove(ACTION_NAME_KEY);
        Self {
            action_name: action_name.into(),
            parameters,
        }
    }

    /// Flat form: `action_name` first, then the parameters
    pub fn to_map(&self) -> Parameters {
        let mut record = Parameters::with_capacity(self.parameters.len() + 1);
        record.insert(ACTION_NAME_KEY.to_string(), Value::String(self.action_name.clone()));
        for (key, value) in &self.parameters {
            record.insert(key.clone(), value.clone());
        }
        record
    }

    fn from_value(index: usize, value: Value) -> Result<Self> {
        let Value::Object(mut record) = value else {
            return Err(PipelineError::MalformedDocument(format!(
                "record #{} is not an object",
                index
            )));
        };
        let action_name = match record.remove(ACTION_NAME_KEY) {
            Some(Value::String(name)) => name,
            Some(_) => {
                return Err(PipelineError::MalformedDocument(format!(
                    "record #{} has a non-string 'action_name'",
                    index
                )))
            }
            None => {
                return Err(PipelineError::MalformedDocument(format!(
                    "record #{} has no 'action_name'",
                    index
                )))
            }
        };
        Ok(Self {
            action_name,
            parameters: record,
        })
    }
}

impl Serialize for ActionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// `{ "actions": [ { "action_name": ..., <field>: <value>, ... }, ... ] }`
///
/// A bare array of records is accepted on input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct PipelineDocument {
    pub actions: Vec<ActionRecord>,
}

impl PipelineDocument {
    pub fn new(actions: Vec<ActionRecord>) -> Self {
        Self { actions }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| PipelineError::MalformedDocument(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(yaml)
            .map_err(|e| PipelineError::MalformedDocument(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let records = match value {
            Value::Array(records) => records,
            Value::Object(mut document) => match document.remove("actions") {
                Some(Value::Array(records)) => records,
                Some(_) => {
                    return Err(PipelineError::MalformedDocument(
                        "'actions' is not a list".to_string(),
                    ))
                }
                None => {
                    return Err(PipelineError::MalformedDocument(
                        "document has no 'actions' list".to_string(),
                    ))
                }
            },
            _ => {
                return Err(PipelineError::MalformedDocument(
                    "expected an object or a list of records".to_string(),
                ))
            }
        };

        let actions = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| ActionRecord::from_value(index, record))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { actions })
    }

    pub fn to_value(&self) -> Value {
        let actions = self
            .actions
            .iter()
            .map(|record| Value::Object(record.to_map()))
            .collect();
        let mut document = serde_json::Map::new();
        document.insert("actions".to_string(), Value::Array(actions));
        Value::Object(document)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PipelineError::MalformedDocument(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl TryFrom<Value> for PipelineDocument {
    type Error = PipelineError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}
