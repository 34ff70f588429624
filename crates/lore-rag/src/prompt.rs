//! Prompt assembly for grounded answers

/// Builder for the user-side RAG prompt
pub struct PromptBuilder {
    preamble: String,
    context_sections: Vec<String>,
    question: String,
    closing: String,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new() -> Self {
        Self {
            preamble: String::new(),
            context_sections: Vec::new(),
            question: String::new(),
            closing: String::new(),
        }
    }

    /// Opening line placed before the documents
    pub fn preamble(mut self, text: impl Into<String>) -> Self {
        self.preamble = text.into();
        self
    }

    /// Add one context passage
    pub fn add_context(mut self, context: impl Into<String>) -> Self {
        self.context_sections.push(context.into());
        self
    }

    /// Add several context passages in order
    pub fn contexts<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context_sections
            .extend(contexts.into_iter().map(Into::into));
        self
    }

    /// Set the question
    pub fn question(mut self, q: impl Into<String>) -> Self {
        self.question = q.into();
        self
    }

    /// Instruction placed after the question
    pub fn closing(mut self, text: impl Into<String>) -> Self {
        self.closing = text.into();
        self
    }

    /// Build the final prompt
    pub fn build(self) -> String {
        let mut prompt = String::new();

        if !self.preamble.is_empty() {
            prompt.push_str(&self.preamble);
            prompt.push('\n');
        }

        prompt.push_str("Documents:\n");
        prompt.push_str(&self.context_sections.join("\n"));
        prompt.push('\n');

        prompt.push_str("Question: ");
        prompt.push_str(&self.question);
        prompt.push('\n');

        if !self.closing.is_empty() {
            prompt.push_str(&self.closing);
            prompt.push('\n');
        }

        prompt
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// System instruction: persona plus the grounding rule
pub fn system_prompt(assistant_name: &str) -> String {
    format!(
        "Your name is {assistant_name}. Answer only from the documents provided in the \
         user message. If they do not contain the answer, say that you don't know."
    )
}

/// User prompt embedding the newline-joined context and the query
pub fn user_prompt(query: &str, context: &[String]) -> String {
    PromptBuilder::new()
        .preamble("You are a helpful assistant. Answer the question using the documents below.")
        .contexts(context.iter().cloned())
        .question(query)
        .closing("Answer concisely, based on the documents:")
        .build()
}
