use std::fmt;

use serde::Serialize;

use crate::models::Example;

pub const DEFAULT_INSTRUCTIONS: &str = "You are an expert in converting English questions to SQL queries!";

const EXAMPLES_HEADER: &str =
    "Please provide only SQL queries without any extra explanation.\nHere are some examples:";

const OUTPUT_RULE: &str =
    "Please provide only SQL queries without any additional formatting or words.";

/// What the generator receives. The grounding text and the live question are kept
/// apart so backends can send them as separate turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub grounding: String,
    pub question: String,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\nQuestion: {}", self.grounding, self.question)
    }
}

#[derive(Debug, Clone)]
pub struct PromptAssembler {
    instructions: String,
    schema: String,
}

impl PromptAssembler {
    pub fn new(instructions: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            schema: schema.into(),
        }
    }

    pub fn assemble(&self, examples: &[Example], question: &str) -> Prompt {
        assemble(&self.instructions, &self.schema, examples, question)
    }
}

/// Build the grounding text from instructions, schema and examples (in the given order)
/// and pair it with the untouched question.
pub fn assemble(instructions: &str, schema: &str, examples: &[Example], question: &str) -> Prompt {
    let mut grounding = String::new();
    grounding.push_str(instructions.trim_end());
    grounding.push_str("\nThe SQL database has the following tables:\n");
    grounding.push_str(schema.trim_end());
    grounding.push_str("\n\n");
    grounding.push_str(EXAMPLES_HEADER);
    grounding.push_str("\n\n");
    for example in examples {
        grounding.push_str(&format!("- {}\n  SQL: {}\n\n", example.question, example.sql));
    }
    grounding.push_str(OUTPUT_RULE);

    Prompt {
        grounding,
        question: question.to_string(),
    }
}
