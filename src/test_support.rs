use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::LayerResult;
use crate::transport::{Request, Transport};

/// Transport spy recording every request and answering with queued responses. Once the queue is
/// drained every request receives an empty body.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<Request>>,
    responses: Mutex<VecDeque<LayerResult<String>>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_responses<I>(responses: I) -> Arc<Self>
    where
        I: IntoIterator<Item = LayerResult<String>>,
    {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(responses.into_iter().collect()),
        })
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for RecordingTransport {
    fn execute(&self, request: &Request) -> LayerResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}
