//! MCP tool implementations.
//!
//! Provides the tool handler for the Model Context Protocol. The registry
//! holds a single tool, `sequentialthinking`, backed by a shared
//! [`ThoughtTracker`].

use crate::models::ThoughtRecord;
use crate::tracker::ThoughtTracker;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the sequential thinking tool.
pub const TOOL_NAME: &str = "sequentialthinking";

const TOOL_DESCRIPTION: &str = "\
A detailed tool for dynamic and reflective problem-solving through thoughts.
This tool helps analyze problems through a flexible thinking process that can adapt and evolve.
Each thought can build on, question, or revise previous insights as understanding deepens.

When to use this tool:
- Breaking down complex problems into steps
- Planning and design with room for revision
- Analysis that might need course correction
- Problems where the full scope might not be clear initially
- Problems that require a multi-step solution
- Tasks that need to maintain context over multiple steps
- Situations where irrelevant information needs to be filtered out

Key features:
- You can adjust total_thoughts up or down as you progress
- You can question or revise previous thoughts
- You can add more thoughts even after reaching what seemed like the end
- You can express uncertainty and explore alternative approaches
- Not every thought needs to build linearly - you can branch or backtrack
- Generates a solution hypothesis
- Verifies the hypothesis based on the Chain of Thought steps
- Repeats the process until satisfied
- Provides a correct answer

Parameters explained:
- thought (string): Required. Your current thinking step, which can include:
  * Regular analytical steps
  * Revisions of previous thoughts
  * Questions about previous decisions
  * Realizations about needing more analysis
  * Changes in approach
  * Hypothesis generation
  * Hypothesis verification
- nextThoughtNeeded (boolean): Required. True if you need more thinking, even if at what seemed like the end
- thoughtNumber (integer): Required. Current number in sequence (can go beyond initial total if needed)
- totalThoughts (integer): Required. Current estimate of thoughts needed (can be adjusted up/down)
- isRevision (boolean): Optional. A boolean indicating if this thought revises previous thinking
- revisesThought (integer): Optional. If is_revision is true, which thought number is being reconsidered
- branchFromThought (integer): Optional. If branching, which thought number is the branching point
- branchId (string): Optional. Identifier for the current branch (if any)
- needsMoreThoughts (boolean): Optional. If reaching end but realizing more thoughts needed

You should:
1. Start with an initial estimate of needed thoughts, but be ready to adjust
2. Feel free to question or revise previous thoughts
3. Don't hesitate to add more thoughts if needed, even at the \"end\"
4. Express uncertainty when present
5. Mark thoughts that revise previous thinking or branch into new paths
6. Ignore information that is irrelevant to the current step
7. Generate a solution hypothesis when appropriate
8. Verify the hypothesis based on the Chain of Thought steps
9. Repeat the process until satisfied with the solution
10. Provide a single, ideally correct answer as the final output
11. Only set nextThoughtNeeded to false when truly done and a satisfactory answer is reached";

/// Registry of MCP tools.
pub struct ToolRegistry {
    /// Available tools.
    tools: HashMap<String, ToolDefinition>,
    /// Shared thought-tracking state.
    tracker: Arc<ThoughtTracker>,
}

impl ToolRegistry {
    /// Creates a registry serving the sequential thinking tool backed by
    /// `tracker`.
    #[must_use]
    pub fn new(tracker: Arc<ThoughtTracker>) -> Self {
        let mut tools = HashMap::new();

        tools.insert(
            TOOL_NAME.to_string(),
            ToolDefinition {
                name: TOOL_NAME.to_string(),
                description: TOOL_DESCRIPTION.to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "thought": {
                            "type": "string",
                            "description": "Your current thinking step"
                        },
                        "nextThoughtNeeded": {
                            "type": "boolean",
                            "description": "Whether another thought step is needed"
                        },
                        "thoughtNumber": {
                            "type": "integer",
                            "description": "Current thought number (numeric value, e.g., 1, 2, 3)",
                            "minimum": 1
                        },
                        "totalThoughts": {
                            "type": "integer",
                            "description": "Estimated total thoughts needed (numeric value, e.g., 5, 10)",
                            "minimum": 1
                        },
                        "isRevision": {
                            "type": "boolean",
                            "description": "Whether this revises previous thinking"
                        },
                        "revisesThought": {
                            "type": "integer",
                            "description": "Which thought is being reconsidered",
                            "minimum": 1
                        },
                        "branchFromThought": {
                            "type": "integer",
                            "description": "Branching point thought number",
                            "minimum": 1
                        },
                        "branchId": {
                            "type": "string",
                            "description": "Branch identifier"
                        },
                        "needsMoreThoughts": {
                            "type": "boolean",
                            "description": "If more thoughts are needed"
                        }
                    },
                    "required": ["thought", "nextThoughtNeeded", "thoughtNumber", "totalThoughts"]
                }),
                output_schema: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "thoughtNumber": { "type": "integer" },
                        "totalThoughts": { "type": "integer" },
                        "nextThoughtNeeded": { "type": "boolean" },
                        "branches": {
                            "type": "array",
                            "items": { "type": "string" }
                        },
                        "thoughtHistoryLength": { "type": "integer" }
                    },
                    "required": ["thoughtNumber", "totalThoughts", "nextThoughtNeeded", "thoughtHistoryLength"]
                })),
            },
        );

        Self { tools, tracker }
    }

    /// Returns all tool definitions.
    #[must_use]
    pub fn list_tools(&self) -> Vec<&ToolDefinition> {
        self.tools.values().collect()
    }

    /// Gets a tool definition by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// The tracker backing this registry.
    #[must_use]
    pub fn tracker(&self) -> &Arc<ThoughtTracker> {
        &self.tracker
    }

    /// Executes a tool with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool is unknown, the arguments do not
    /// deserialize, or the submission fails validation.
    pub fn execute(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        match name {
            TOOL_NAME => self.execute_think(arguments),
            _ => Err(Error::InvalidInput(format!("Unknown tool: {name}"))),
        }
    }

    /// Executes the sequential thinking tool.
    fn execute_think(&self, arguments: Value) -> Result<ToolResult> {
        let record: ThoughtRecord =
            serde_json::from_value(arguments).map_err(|e| Error::InvalidInput(e.to_string()))?;

        let snapshot = self.tracker.submit(&record)?;

        let text = serde_json::to_string(&snapshot).map_err(|e| Error::OperationFailed {
            operation: "serialize_snapshot".to_string(),
            cause: e.to_string(),
        })?;

        Ok(ToolResult {
            content: vec![ToolContent::Text { text }],
            is_error: false,
        })
    }
}

/// Definition of an MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for input validation.
    pub input_schema: Value,
    /// JSON Schema for the tool's structured output, if declared.
    pub output_schema: Option<Value>,
}

/// Result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the result represents an error.
    #[serde(default)]
    pub is_error: bool,
}

/// Content types that can be returned by tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}
