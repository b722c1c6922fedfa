use crate::document::{Document, DocumentId, DocumentStatus};
use crate::engine::SearchEngine;
use crate::error::Result;
use std::collections::VecDeque;

/// Trailing window, in logical ticks, over which requests are remembered
pub const REQUEST_WINDOW: u64 = 1440;

/// Routes queries through the engine and tracks, over the trailing
/// `REQUEST_WINDOW` of ticks, how many of them came back empty. Each
/// request advances the logical clock by one tick.
pub struct RequestHistory<'a> {
    engine: &'a SearchEngine,
    requests: VecDeque<RequestRecord>,
    clock: u64,
    no_result_count: usize,
}

#[derive(Debug, Clone, Copy)]
struct RequestRecord {
    tick: u64,
    was_empty: bool,
}

impl<'a> RequestHistory<'a> {
    pub fn new(engine: &'a SearchEngine) -> Self {
        Self {
            engine,
            requests: VecDeque::new(),
            clock: 0,
            no_result_count: 0,
        }
    }

    /// Query with the default Active-status filter
    pub fn add_request(&mut self, raw_query: &str) -> Result<Vec<Document>> {
        let result = self.engine.find_top_documents(raw_query)?;
        self.record(result.is_empty());
        Ok(result)
    }

    pub fn add_request_by_status(
        &mut self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        let result = self.engine.find_top_documents_by_status(raw_query, status)?;
        self.record(result.is_empty());
        Ok(result)
    }

    pub fn add_request_filtered<P>(&mut self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocumentId, DocumentStatus, i32) -> bool + Sync,
    {
        let result = self.engine.find_top_documents_filtered(raw_query, predicate)?;
        self.record(result.is_empty());
        Ok(result)
    }

    /// Requests still inside the window that returned nothing
    pub fn no_result_requests(&self) -> usize {
        self.no_result_count
    }

    fn record(&mut self, was_empty: bool) {
        self.clock += 1;
        while let Some(front) = self.requests.front() {
            if self.clock - front.tick < REQUEST_WINDOW {
                break;
            }
            if front.was_empty {
                self.no_result_count -= 1;
            }
            self.requests.pop_front();
        }
        if was_empty {
            self.no_result_count += 1;
        }
        self.requests.push_back(RequestRecord {
            tick: self.clock,
            was_empty,
        });
    }
}
