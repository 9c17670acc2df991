//! Pacing and rate-limit retry around any [`ClassificationBackend`].

use async_trait::async_trait;

use gleaner_core::{
    CategorizedBundle, ClassificationBackend, ParsedTask, ResilientCaller, Result, RetryPolicy,
};

pub struct ResilientClassifier<C> {
    inner: C,
    caller: ResilientCaller,
}

impl<C: ClassificationBackend> ResilientClassifier<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self {
            inner,
            caller: ResilientCaller::new(policy),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: ClassificationBackend> ClassificationBackend for ResilientClassifier<C> {
    async fn categorize(&self, bullets: &[String]) -> Result<CategorizedBundle> {
        self.caller
            .call("categorize", || self.inner.categorize(bullets))
            .await
    }

    async fn parse_tasks(&self, text: &str) -> Result<Vec<ParsedTask>> {
        self.caller
            .call("parse_tasks", || self.inner.parse_tasks(text))
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
