use std::collections::HashMap;

use crate::llm::{LlmClient, LlmRequest};
use crate::stage::Role;

/// Working state for one crew run: the model client and each stage's output.
pub struct Ctx {
    llm: LlmClient,
    outputs: HashMap<Role, String>,
}

impl Ctx {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            outputs: HashMap::new(),
        }
    }

    /// Start a model request.
    pub fn llm(&self) -> LlmRequest<'_> {
        self.llm.request()
    }

    pub fn record(&mut self, role: Role, output: impl Into<String>) {
        self.outputs.insert(role, output.into());
    }

    pub fn output(&self, role: Role) -> Option<&str> {
        self.outputs.get(&role).map(|s| s.as_str())
    }

    /// Output of the stage that runs before `role`, if it has run.
    pub fn previous_output(&self, role: Role) -> Option<&str> {
        let idx = Role::ALL.iter().position(|r| *r == role)?;
        let prev = Role::ALL.get(idx.checked_sub(1)?)?;
        self.output(*prev)
    }
}
