use serde::{Deserialize, Serialize};

/// One interview question as produced by a question generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Short headline shown to the candidate; also the "previous question" context
    /// for the next generation call.
    pub title: String,
    /// Full question text.
    pub description: String,
    /// Example input, or `text` for verbal questions.
    pub input_format: String,
    /// Example output, or `text` for verbal questions.
    pub output_format: String,
}

impl Question {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        input_format: impl Into<String>,
        output_format: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            input_format: input_format.into(),
            output_format: output_format.into(),
        }
    }

    /// A question is well formed when both its title and description carry text.
    pub fn is_well_formed(&self) -> bool {
        !self.title.trim().is_empty() && !self.description.trim().is_empty()
    }
}
