//! Example extraction for prefilling request bodies.

use crate::types::{Example, MediaTypeExamples, OperationDescriptor};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Examples declared for one response status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseExamples {
    pub status: String,
    pub media_types: MediaTypeExamples,
    /// The status declares headers but no body examples
    pub only_headers: bool,
}

/// A request example picked for "try it", with the media type it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedExample {
    pub media_type: String,
    pub example: Example,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExampleSelector;

impl ExampleSelector {
    pub fn new() -> Self {
        Self
    }

    /// Request body examples by media type; media types without examples are dropped.
    pub fn request_examples(&self, operation: &OperationDescriptor) -> MediaTypeExamples {
        operation
            .request_body
            .as_ref()
            .map(|body| non_empty(&body.examples))
            .unwrap_or_default()
    }

    /// Response examples by status, in declaration order.
    ///
    /// A status with neither examples nor headers is left out.
    pub fn response_examples(
        &self,
        operation: &OperationDescriptor,
    ) -> IndexMap<String, ResponseExamples> {
        operation
            .responses
            .iter()
            .filter_map(|response| {
                let media_types = non_empty(&response.examples);
                if media_types.is_empty() && !response.has_headers {
                    return None;
                }
                let only_headers = media_types.is_empty();
                Some((
                    response.status.clone(),
                    ResponseExamples {
                        status: response.status.clone(),
                        media_types,
                        only_headers,
                    },
                ))
            })
            .collect()
    }

    /// Pick a request example by media type (first one with examples when `None`) and position.
    pub fn select_request_example(
        &self,
        operation: &OperationDescriptor,
        media_type: Option<&str>,
        index: usize,
    ) -> Option<SelectedExample> {
        let examples = self.request_examples(operation);
        let (media_type, candidates) = match media_type {
            Some(media_type) => examples.get_key_value(media_type)?,
            None => examples.first()?,
        };
        candidates.get(index).map(|example| SelectedExample {
            media_type: media_type.clone(),
            example: example.clone(),
        })
    }
}

fn non_empty(examples: &MediaTypeExamples) -> MediaTypeExamples {
    examples
        .iter()
        .filter(|(_, examples)| !examples.is_empty())
        .map(|(media_type, examples)| (media_type.clone(), examples.clone()))
        .collect()
}
