//! Prompt construction for the query agent.

use super::tools::Tool;

/// Behavioural guidance given to the agent before anything else.
pub const PREFIX: &str = "You are a highly skilled database assistant with full SQL privileges. \
Your primary function is to provide accurate, concise, and timely answers to user queries related to the database. \
You may execute SQL queries as needed, but the user should only see the final, processed results. \
Avoid displaying intermediate steps, unnecessary technical details, or sensitive information unless explicitly requested. \
If the user requests an update or change to the database, provide a clear and explicit confirmation statement before proceeding, \
including the scope of changes, potential effects, and any necessary warnings or caveats. \
Always prioritize data accuracy, integrity, security, and consistency in your responses, \
and adhere to best practices for data protection, backups, and recovery. \
If you're unsure about the user's intent, request clarification or additional information before proceeding. \
Provide clear and concise explanations for any errors, exceptions, or unexpected results, \
and offer suggestions for alternative queries or approaches as needed. \
Maintain a professional tone, use proper SQL syntax and terminology, \
and ensure that your responses are easy to understand and follow.";

/// Database-specific guidance appended to the prefix.
const SQL_GUIDANCE: &str = "The database is PostgreSQL. \
Unless the user asks for a specific number of results, limit SELECT queries to at most {top_k} rows. \
Only ask for the columns relevant to the question. \
Always look at the tables in the database first, then query the schema of the most relevant tables. \
Double check a query with sql_db_query_checker before running it with sql_db_query.";

const FORMAT_INSTRUCTIONS: &str = "Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question";

/// Stop sequence that keeps the model from inventing observations.
pub const STOP_SEQUENCE: &str = "\nObservation:";

/// Corrective observation sent after an unparseable reply.
pub const FORMAT_REMINDER: &str = "Invalid or incomplete response. \
Reply with either `Action:` followed by `Action Input:`, or with `Final Answer:`.";

/// Builds the system prompt: prefix, tool list and format description.
pub fn system_prompt(tools: &[Tool], top_k: usize) -> String {
    let tool_lines = tools
        .iter()
        .map(|tool| format!("{}: {}", tool.name(), tool.description()))
        .collect::<Vec<_>>()
        .join("\n");

    let tool_names = tools
        .iter()
        .map(|tool| tool.name())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{PREFIX}\n\n{}\n\nYou have access to the following tools:\n\n{tool_lines}\n\n{}\n\nBegin!",
        SQL_GUIDANCE.replace("{top_k}", &top_k.to_string()),
        FORMAT_INSTRUCTIONS.replace("{tool_names}", &tool_names),
    )
}

/// Formats the opening user turn.
pub fn question(text: &str) -> String {
    format!("Question: {text}")
}

/// Formats a tool result fed back to the model.
pub fn observation(text: &str) -> String {
    format!("Observation: {text}")
}
