//! UI-agnostic conversation types
//!
//! These are shared by every front end and don't depend on any UI framework.

use serde::{Deserialize, Serialize};

/// One completed question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub response: String,
}

impl Exchange {
    pub fn new(question: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            response: response.into(),
        }
    }
}

/// Ordered, append-only list of exchanges.
///
/// Only the session controller can append; everything else gets read access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    exchanges: Vec<Exchange>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, exchange: Exchange) {
        self.exchanges.push(exchange);
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn last(&self) -> Option<&Exchange> {
        self.exchanges.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Exchange> {
        self.exchanges.iter()
    }

    pub fn as_slice(&self) -> &[Exchange] {
        &self.exchanges
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Exchange;
    type IntoIter = std::slice::Iter<'a, Exchange>;

    fn into_iter(self) -> Self::IntoIter {
        self.exchanges.iter()
    }
}
