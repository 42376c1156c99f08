//! Scripted model and a small indexed catalog for engine tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use courseclaw_core::error::{CourseClawError, Result};
use courseclaw_core::traits::Embedder;
use courseclaw_core::traits::Provider;
use courseclaw_core::traits::provider::GenerateParams;
use courseclaw_core::types::{Message, ProviderResponse, ToolCall, ToolDefinition, Usage};
use courseclaw_knowledge::{RecordStore, Retriever};
use courseclaw_tools::{SearchCoursesTool, ToolRegistry};

/// One request as seen by the provider.
#[derive(Debug, Clone)]
pub struct Request {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
}

/// Replays canned responses in order and records every request.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<ProviderResponse>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn text(content: &str) -> ProviderResponse {
        ProviderResponse {
            content: Some(content.into()),
            finish_reason: Some("stop".into()),
            usage: Some(usage()),
            ..Default::default()
        }
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> ProviderResponse {
        ProviderResponse {
            tool_calls: calls,
            finish_reason: Some("tool_calls".into()),
            usage: Some(usage()),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> Request {
        self.requests.lock().unwrap()[index].clone()
    }
}

fn usage() -> Usage {
    Usage {
        prompt_tokens: 7,
        completion_tokens: 3,
        total_tokens: 10,
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        _params: &GenerateParams,
    ) -> Result<ProviderResponse> {
        self.requests.lock().unwrap().push(Request {
            messages: messages.to_vec(),
            tools: tools.to_vec(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CourseClawError::ModelCall("script exhausted".into()))
    }
}

const VOCAB: [&str; 6] = ["peterson", "choong", "software", "rhetoric", "guitar", "ethics"];

/// Bag-of-words over a tiny vocabulary.
struct VocabEmbedder;

impl VocabEmbedder {
    fn vectorize(text: &str) -> Vec<f32> {
        let text = text.to_lowercase();
        VOCAB
            .iter()
            .map(|w| if text.contains(w) { 1.0 } else { 0.0 })
            .collect()
    }
}

#[async_trait]
impl Embedder for VocabEmbedder {
    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }
}

const COURSES: [&str; 3] = [
    "SUBJ:CS Number:272 Section:01 Title:Software Development Instructor:Phil Peterson \
     Email:phpeterson@usfca.edu Days:TR Time:0955-1140 Building:LS Room:G12",
    "SUBJ:RHET Number:103 Section:02 Title:Public Speaking (Rhetoric) Instructor:Phil Choong \
     Email:pchoong@usfca.edu Days:MWF Time:1045-1150 Building:KA Room:211",
    "SUBJ:PHIL Number:240 Section:01 Title:Ethics Instructor:Ana Lopez \
     Email:alopez@usfca.edu Days:MW Time:1330-1515 Building:LM Room:345",
];

/// A registry holding `search_courses` over a three-course catalog.
pub fn search_tools() -> ToolRegistry {
    let store = Arc::new(RecordStore::open_in_memory(VOCAB.len()).unwrap());
    for (i, line) in COURSES.iter().enumerate() {
        store
            .put(i as i64 + 1, line, &VocabEmbedder::vectorize(line))
            .unwrap();
    }

    let retriever = Arc::new(Retriever::new(store, Arc::new(VocabEmbedder)));
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(SearchCoursesTool::new(retriever)));
    registry
}
