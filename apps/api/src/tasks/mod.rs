//! Task orchestrators: prompt → completion → extraction → typed record.
//!
//! Every orchestrator returns a `TaskOutcome`. A failed completion call or an
//! unreadable reply degrades to the task's fallback record; neither is an error.

pub mod interview;
pub mod jobs;
pub mod learning;
pub mod quiz;
pub mod resume;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::llm_client::extract::try_extract_json;
use crate::llm_client::{ChatCompletion, LlmError};
use crate::prompts::{PromptBuilder, TaskKind, TaskPrompt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The completion call failed (transport, status, or empty reply).
    CompletionUnavailable,
    /// The reply had no recoverable JSON of the expected shape.
    ExtractionFailed,
}

/// Orchestrator result with provenance. Both arms carry a valid `T`.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<T> {
    Generated(T),
    Fallback { value: T, reason: FallbackReason },
}

impl<T> TaskOutcome<T> {
    pub fn into_inner(self) -> T {
        match self {
            TaskOutcome::Generated(value) | TaskOutcome::Fallback { value, .. } => value,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TaskOutcome<U> {
        match self {
            TaskOutcome::Generated(value) => TaskOutcome::Generated(f(value)),
            TaskOutcome::Fallback { value, reason } => TaskOutcome::Fallback {
                value: f(value),
                reason,
            },
        }
    }

    fn fallback(kind: TaskKind, value: T, reason: FallbackReason) -> Self {
        warn!("{kind}: returning fallback record ({reason:?})");
        TaskOutcome::Fallback { value, reason }
    }
}

// Provenance is logged where the fallback is taken; callers only read it in tests.
#[cfg(test)]
impl<T> TaskOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            TaskOutcome::Generated(value) | TaskOutcome::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, TaskOutcome::Fallback { .. })
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            TaskOutcome::Generated(_) => None,
            TaskOutcome::Fallback { reason, .. } => Some(*reason),
        }
    }
}

/// One completion round trip for a task.
pub(crate) async fn complete_text(
    llm: &dyn ChatCompletion,
    prompts: &PromptBuilder,
    task: &TaskPrompt<'_>,
) -> Result<String, LlmError> {
    llm.complete(prompts.request(task)).await.map_err(|e| {
        warn!("{}: completion failed: {e}", task.kind());
        e
    })
}

/// Runs a task whose reply is a single JSON object.
pub(crate) async fn run_record<T>(
    llm: &dyn ChatCompletion,
    prompts: &PromptBuilder,
    task: &TaskPrompt<'_>,
    fallback: T,
) -> TaskOutcome<T>
where
    T: Serialize + DeserializeOwned,
{
    let kind = task.kind();
    let text = match complete_text(llm, prompts, task).await {
        Ok(text) => text,
        Err(_) => {
            return TaskOutcome::fallback(kind, fallback, FallbackReason::CompletionUnavailable)
        }
    };

    match try_extract_json(&text).and_then(|v| conform_record(v, &fallback)) {
        Some(record) => TaskOutcome::Generated(record),
        None => TaskOutcome::fallback(kind, fallback, FallbackReason::ExtractionFailed),
    }
}

/// Runs a task whose reply is a list of items.
pub(crate) async fn run_list<I>(
    llm: &dyn ChatCompletion,
    prompts: &PromptBuilder,
    task: &TaskPrompt<'_>,
    fallback: Vec<I>,
) -> TaskOutcome<Vec<I>>
where
    I: Serialize + DeserializeOwned,
{
    let kind = task.kind();
    let text = match complete_text(llm, prompts, task).await {
        Ok(text) => text,
        Err(_) => {
            return TaskOutcome::fallback(kind, fallback, FallbackReason::CompletionUnavailable)
        }
    };

    match try_extract_json(&text).and_then(conform_list) {
        Some(items) => TaskOutcome::Generated(items),
        None => TaskOutcome::fallback(kind, fallback, FallbackReason::ExtractionFailed),
    }
}

/// Overlays the fields of an extracted object onto the fallback record.
///
/// Missing fields and fields whose value does not fit the record's type keep the
/// fallback's value. Returns `None` when `extracted` is not an object.
pub(crate) fn conform_record<T>(extracted: Value, fallback: &T) -> Option<T>
where
    T: Serialize + DeserializeOwned,
{
    let Value::Object(fields) = extracted else {
        return None;
    };
    let Ok(Value::Object(mut merged)) = serde_json::to_value(fallback) else {
        return None;
    };

    for (key, value) in fields {
        if !merged.contains_key(&key) {
            continue;
        }
        let previous = merged.insert(key.clone(), value);
        if serde_json::from_value::<T>(Value::Object(merged.clone())).is_err() {
            if let Some(previous) = previous {
                merged.insert(key, previous);
            }
        }
    }

    serde_json::from_value(Value::Object(merged)).ok()
}

/// Reads a list from a bare array, or from an object wrapping one array
/// (`{"questions": [...]}`). Unreadable items are skipped. An empty result is `None`.
pub(crate) fn conform_list<I>(extracted: Value) -> Option<Vec<I>>
where
    I: Serialize + DeserializeOwned,
{
    let items = match extracted {
        Value::Array(items) => items,
        Value::Object(map) => wrapped_array(map)?,
        _ => return None,
    };

    let conformed: Vec<I> = items.into_iter().filter_map(conform_item).collect();

    (!conformed.is_empty()).then_some(conformed)
}

/// Reads one list item. An object item keeps the fields that fit the item type and
/// drops the rest, so a single mistyped field leaves that field at its default.
/// An object with no usable field is skipped.
fn conform_item<I>(item: Value) -> Option<I>
where
    I: Serialize + DeserializeOwned,
{
    let fields = match item {
        Value::Object(fields) => fields,
        other => return serde_json::from_value(other).ok(),
    };
    if let Ok(parsed) = serde_json::from_value(Value::Object(fields.clone())) {
        return Some(parsed);
    }

    let blank = serde_json::from_value::<I>(Value::Object(Map::new()))
        .ok()
        .and_then(|b| serde_json::to_value(b).ok())?;
    let usable: Map<String, Value> = fields
        .into_iter()
        .filter(|(key, value)| {
            let mut single = Map::new();
            single.insert(key.clone(), value.clone());
            serde_json::from_value::<I>(Value::Object(single))
                .ok()
                .and_then(|one| serde_json::to_value(one).ok())
                .is_some_and(|one| one != blank)
        })
        .collect();
    if usable.is_empty() {
        return None;
    }
    serde_json::from_value(Value::Object(usable)).ok()
}

fn wrapped_array(map: Map<String, Value>) -> Option<Vec<Value>> {
    map.into_iter().find_map(|(_, v)| match v {
        Value::Array(items) => Some(items),
        _ => None,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::llm_client::{ChatCompletion, CompletionRequest, LlmError};
    use crate::market::context::MarketContext;
    use crate::prompts::PromptBuilder;

    /// Replays canned replies in order; `None` simulates a failed call.
    #[derive(Default)]
    pub struct ScriptedCompletion {
        replies: Mutex<VecDeque<Option<String>>>,
        pub requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedCompletion {
        pub fn replying(reply: &str) -> Self {
            Self::script([Some(reply)])
        }

        pub fn failing() -> Self {
            Self::script([None])
        }

        pub fn script<'a>(replies: impl IntoIterator<Item = Option<&'a str>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(str::to_string))
                        .collect(),
                ),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatCompletion for ScriptedCompletion {
        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
            self.requests.lock().unwrap().push(request);
            match self.replies.lock().unwrap().pop_front().flatten() {
                Some(text) => Ok(text),
                None => Err(LlmError::Api {
                    status: 503,
                    message: "scripted failure".to_string(),
                }),
            }
        }
    }

    pub fn prompt_builder() -> PromptBuilder {
        PromptBuilder::new(Arc::new(MarketContext::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        score: u32,
        label: String,
        tags: Vec<String>,
    }

    fn sample_fallback() -> Sample {
        Sample {
            score: 50,
            label: "fallback".to_string(),
            tags: vec![],
        }
    }

    #[test]
    fn test_conform_record_overlays_fields() {
        let conformed = conform_record(json!({"score": 90}), &sample_fallback()).unwrap();
        assert_eq!(conformed.score, 90);
        assert_eq!(conformed.label, "fallback");
    }

    #[test]
    fn test_conform_record_keeps_fallback_for_mistyped_field() {
        let conformed = conform_record(
            json!({"score": "ninety", "label": "ok", "extra": true}),
            &sample_fallback(),
        )
        .unwrap();
        assert_eq!(conformed.score, 50);
        assert_eq!(conformed.label, "ok");
    }

    #[test]
    fn test_conform_record_rejects_non_object() {
        assert!(conform_record(json!([1, 2]), &sample_fallback()).is_none());
        assert!(conform_record(json!("text"), &sample_fallback()).is_none());
    }

    #[test]
    fn test_conform_list_bare_and_wrapped() {
        let bare: Vec<u32> = conform_list(json!([1, 2, 3])).unwrap();
        assert_eq!(bare, vec![1, 2, 3]);

        let wrapped: Vec<u32> = conform_list(json!({"items": [4, 5]})).unwrap();
        assert_eq!(wrapped, vec![4, 5]);
    }

    #[test]
    fn test_conform_list_skips_bad_items() {
        let items: Vec<u32> = conform_list(json!([1, "two", 3])).unwrap();
        assert_eq!(items, vec![1, 3]);
    }

    #[test]
    fn test_conform_list_empty_is_none() {
        assert!(conform_list::<u32>(json!([])).is_none());
        assert!(conform_list::<u32>(json!({"a": 1})).is_none());
        assert!(conform_list::<u32>(json!(["x"])).is_none());
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Listing {
        title: String,
        #[serde(alias = "pct")]
        percent: u32,
    }

    #[test]
    fn test_conform_list_defaults_mistyped_item_fields() {
        let items: Vec<Listing> = conform_list(json!([
            {"title": "Data Engineer", "percent": 72.5},
            {"title": "Analyst", "pct": 40},
            {"unknown": true, "percent": "high"}
        ]))
        .unwrap();
        assert_eq!(
            items,
            vec![
                Listing { title: "Data Engineer".to_string(), percent: 0 },
                Listing { title: "Analyst".to_string(), percent: 40 },
            ]
        );
    }

    #[test]
    fn test_outcome_accessors() {
        let generated = TaskOutcome::Generated(1);
        assert!(!generated.is_fallback());
        assert_eq!(generated.fallback_reason(), None);

        let fallback = TaskOutcome::Fallback {
            value: 2,
            reason: FallbackReason::ExtractionFailed,
        };
        assert!(fallback.is_fallback());
        assert_eq!(*fallback.value(), 2);
        assert_eq!(fallback.map(|v| v * 10).into_inner(), 20);
    }
}
