#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use tracelink::client::TrackerClient;
use tracelink::errors::{ImportError, Result};
use tracelink::types::{ItemRef, RelationshipType, SearchQuery};

/// Scripted outcome for a `create_relationship` call.
pub enum CreateOutcome {
    Duplicate,
    Fail(String),
}

/// In-memory stand-in for the remote service.
///
/// Search results and create outcomes are scripted up front; every call is
/// recorded so tests can assert call counts and submission order.
#[derive(Default)]
pub struct MockTracker {
    search_results: HashMap<String, Vec<ItemRef>>,
    relationship_types: Vec<RelationshipType>,
    create_outcomes: HashMap<(i64, i64), CreateOutcome>,
    fail_type_fetch: bool,
    fail_search: bool,
    state: RefCell<State>,
}

#[derive(Default)]
struct State {
    search_calls: Vec<String>,
    created: Vec<(i64, i64, i64)>,
    next_id: i64,
}

impl MockTracker {
    pub fn new() -> Self {
        MockTracker::default()
    }

    /// Registers the items a search for `filter` returns. The filter is the
    /// query's document key, or its `field:"value"` contains expression.
    pub fn add_search_result(&mut self, filter: &str, ids: &[i64]) {
        let items = ids
            .iter()
            .map(|&id| ItemRef {
                id,
                document_key: None,
            })
            .collect();
        self.search_results.insert(filter.to_string(), items);
    }

    pub fn add_relationship_type(&mut self, id: i64, name: &str) {
        self.relationship_types.push(RelationshipType {
            id,
            name: name.to_string(),
        });
    }

    pub fn set_create_outcome(&mut self, from_item: i64, to_item: i64, outcome: CreateOutcome) {
        self.create_outcomes.insert((from_item, to_item), outcome);
    }

    /// Makes `list_relationship_types` fail, for fatal-path tests.
    pub fn fail_type_fetch(&mut self) {
        self.fail_type_fetch = true;
    }

    /// Makes every search fail, simulating transport trouble.
    pub fn fail_search(&mut self) {
        self.fail_search = true;
    }

    pub fn search_call_count(&self) -> usize {
        self.state.borrow().search_calls.len()
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.state.borrow().search_calls.clone()
    }

    /// Relationships created so far, as `(from, to, type)` in call order.
    pub fn created(&self) -> Vec<(i64, i64, i64)> {
        self.state.borrow().created.clone()
    }
}

impl TrackerClient for MockTracker {
    fn search(&self, query: &SearchQuery) -> Result<Vec<ItemRef>> {
        let filter = query
            .document_key
            .clone()
            .or_else(|| query.contains.clone())
            .unwrap_or_default();
        self.state.borrow_mut().search_calls.push(filter.clone());

        if self.fail_search {
            return Err(ImportError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(self.search_results.get(&filter).cloned().unwrap_or_default())
    }

    fn list_relationship_types(&self) -> Result<Vec<RelationshipType>> {
        if self.fail_type_fetch {
            return Err(ImportError::Api {
                status: 401,
                message: "unauthorized".to_string(),
            });
        }
        Ok(self.relationship_types.clone())
    }

    fn create_relationship(
        &self,
        from_item: i64,
        to_item: i64,
        relationship_type: i64,
    ) -> Result<i64> {
        match self.create_outcomes.get(&(from_item, to_item)) {
            Some(CreateOutcome::Duplicate) => Err(ImportError::Duplicate { from_item, to_item }),
            Some(CreateOutcome::Fail(message)) => Err(ImportError::Submission {
                from_item,
                to_item,
                message: message.clone(),
            }),
            None => {
                let mut state = self.state.borrow_mut();
                state.created.push((from_item, to_item, relationship_type));
                state.next_id += 1;
                Ok(100 + state.next_id)
            }
        }
    }
}
