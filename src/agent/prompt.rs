//! Prompt text for the SQL agent.

use crate::db::DatabaseBackend;
use crate::llm::Message;
use crate::session::{Turn, TurnRole};

/// Assistant message placed after the question to steer the first step.
pub const FIRST_STEP_HINT: &str = "I should look at the tables in the database to see what I can \
query. Then I should query the schema of the most relevant tables.";

/// Builds the fixed instructional prefix for an agent on `backend`.
pub fn build_prefix(backend: DatabaseBackend, top_k: usize) -> String {
    format!(
        "You are an agent designed to interact with a SQL database. \
         Given an input question, create a syntactically correct {dialect} query, \
         run it, and return the answer. Use 'sql_db_schema' tool to see the schema.\n\
         Unless the user asks for a specific number of rows, limit your query to at most \
         {top_k} results.",
        dialect = backend.dialect(),
    )
}

/// Builds the checker prompt asking the model to review `query`.
///
/// `diagnostics` is the local parser's verdict, passed along so the model
/// does not have to guess at syntax errors.
pub fn build_checker_prompt(query: &str, backend: DatabaseBackend, diagnostics: &str) -> String {
    format!(
        "```sql\n{query}\n```\n\
         Double check the {dialect} query above for common mistakes, including:\n\
         - Using NOT IN with NULL values\n\
         - Using UNION when UNION ALL should have been used\n\
         - Using BETWEEN for exclusive ranges\n\
         - Data type mismatch in predicates\n\
         - Properly quoting identifiers\n\
         - Using the correct number of arguments for functions\n\
         - Casting to the correct data type\n\
         - Using the proper columns for joins\n\n\
         Parser check: {diagnostics}\n\n\
         If there are any of the above mistakes, rewrite the query. \
         If there are no mistakes, just reproduce the original query.\n\n\
         Output the final SQL query only.",
        dialect = backend.dialect(),
    )
}

/// Assembles the opening messages for one question.
///
/// Prior turns become user/assistant messages between the prefix and the
/// new question.
pub fn build_messages(prefix: &str, history: &[Turn], input: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 3);
    messages.push(Message::system(prefix));
    messages.extend(history.iter().map(|turn| match turn.role {
        TurnRole::Human => Message::user(turn.content.clone()),
        TurnRole::Ai => Message::assistant(turn.content.clone()),
    }));
    messages.push(Message::user(input));
    messages.push(Message::assistant(FIRST_STEP_HINT));
    messages
}
