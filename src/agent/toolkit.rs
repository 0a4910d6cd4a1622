//! The SQL toolkit: the four database tools the agent can call.
//!
//! Tool failures that the model can act on (bad SQL, unknown tables) come
//! back as observation text. Only malformed calls and LLM failures surface
//! as [`ToolError`].

use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;
use sqlparser::dialect::{Dialect, MySqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;
use thiserror::Error;
use tracing::{debug, warn};

use super::prompt;
use crate::config::AgentConfig;
use crate::db::{DatabaseBackend, DatabaseClient, QueryResult};
use crate::error::ChatError;
use crate::llm::{LlmClient, Message, ToolCall, ToolDefinition};

pub const LIST_TABLES: &str = "sql_db_list_tables";
pub const SCHEMA: &str = "sql_db_schema";
pub const QUERY: &str = "sql_db_query";
pub const QUERY_CHECKER: &str = "sql_db_query_checker";

/// Why a tool call could not be run.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The model named a tool that does not exist.
    #[error("{name} is not a valid tool, try one of [{available}].")]
    UnknownTool { name: String, available: String },

    /// The arguments were not the JSON object the tool expects.
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// A failure the agent cannot recover from (e.g. the LLM is unreachable).
    #[error(transparent)]
    Fatal(#[from] ChatError),
}

impl ToolError {
    /// True for errors caused by malformed model output.
    pub fn is_parse_error(&self) -> bool {
        !matches!(self, Self::Fatal(_))
    }
}

#[derive(Debug, Deserialize)]
struct TableNamesArgs {
    table_names: String,
}

#[derive(Debug, Deserialize)]
struct QueryArgs {
    query: String,
}

/// Database tools bound to one handle and one LLM client.
pub struct SqlToolkit {
    db: Box<dyn DatabaseClient>,
    llm: Arc<dyn LlmClient>,
    sample_rows: usize,
    max_value_length: usize,
}

impl SqlToolkit {
    pub fn new(db: Box<dyn DatabaseClient>, llm: Arc<dyn LlmClient>, config: &AgentConfig) -> Self {
        Self {
            db,
            llm,
            sample_rows: config.sample_rows,
            max_value_length: config.max_value_length,
        }
    }

    /// Backend of the bound handle.
    pub fn backend(&self) -> DatabaseBackend {
        self.db.backend()
    }

    /// The bound database handle.
    pub fn db(&self) -> &dyn DatabaseClient {
        self.db.as_ref()
    }

    /// Tool definitions offered to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::single_string_arg(
                QUERY,
                "Input to this tool is a detailed and correct SQL query, output is a result \
                 from the database. If the query is not correct, an error message will be \
                 returned. If an error is returned, rewrite the query, check the query, and \
                 try again. If you encounter an unknown column error, use sql_db_schema to \
                 look up the correct table fields.",
                "query",
                "A detailed and correct SQL query.",
            ),
            ToolDefinition::single_string_arg(
                SCHEMA,
                "Input to this tool is a comma-separated list of tables, output is the schema \
                 and sample rows for those tables. Be sure that the tables actually exist by \
                 calling sql_db_list_tables first! Example Input: table1, table2, table3",
                "table_names",
                "A comma-separated list of the table names for which to return the schema.",
            ),
            ToolDefinition::no_args(
                LIST_TABLES,
                "Input is an empty string, output is a comma-separated list of tables in the \
                 database.",
            ),
            ToolDefinition::single_string_arg(
                QUERY_CHECKER,
                "Use this tool to double check if your query is correct before executing it. \
                 Always use this tool before executing a query with sql_db_query!",
                "query",
                "A detailed and SQL query to be checked.",
            ),
        ]
    }

    /// Runs one tool call and returns the observation for the model.
    pub async fn run(&self, call: &ToolCall) -> Result<String, ToolError> {
        debug!(tool = %call.name, arguments = %call.arguments, "Running tool");

        match call.name.as_str() {
            LIST_TABLES => Ok(self.list_tables().await),
            SCHEMA => {
                let args: TableNamesArgs = parse_args(call)?;
                Ok(self.schema(&args.table_names).await)
            }
            QUERY => {
                let args: QueryArgs = parse_args(call)?;
                Ok(self.query(&args.query).await)
            }
            QUERY_CHECKER => {
                let args: QueryArgs = parse_args(call)?;
                Ok(self.check_query(&args.query).await?)
            }
            other => Err(ToolError::UnknownTool {
                name: other.to_string(),
                available: [QUERY, SCHEMA, LIST_TABLES, QUERY_CHECKER].join(", "),
            }),
        }
    }

    /// Comma-separated table names.
    pub async fn list_tables(&self) -> String {
        match self.db.list_tables().await {
            Ok(tables) => tables.join(", "),
            Err(e) => format!("Error: {}", error_detail(&e)),
        }
    }

    /// DDL and sample rows for each requested table.
    pub async fn schema(&self, table_names: &str) -> String {
        let requested: Vec<&str> = table_names
            .split(',')
            .map(|t| t.trim().trim_matches(|c| c == '"' || c == '`' || c == '\''))
            .filter(|t| !t.is_empty())
            .collect();

        let schema = match self.db.introspect_schema().await {
            Ok(schema) => schema,
            Err(e) => return format!("Error: {}", error_detail(&e)),
        };

        let missing: Vec<&str> = requested
            .iter()
            .copied()
            .filter(|name| schema.table(name).is_none())
            .collect();
        if requested.is_empty() || !missing.is_empty() {
            return format!(
                "Error: table_names {{{}}} not found in database",
                missing
                    .iter()
                    .map(|m| format!("'{m}'"))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        let mut sections = Vec::with_capacity(requested.len());
        for name in requested {
            let Some(table) = schema.table(name) else {
                continue;
            };
            let mut section = schema.create_table_statement(table, self.backend());
            if self.sample_rows > 0 {
                section.push_str("\n\n");
                section.push_str(&self.sample_rows_block(name).await);
            }
            sections.push(section);
        }

        sections.join("\n\n")
    }

    async fn sample_rows_block(&self, table: &str) -> String {
        let sql = format!(
            "SELECT * FROM {} LIMIT {}",
            self.backend().quote_identifier(table),
            self.sample_rows
        );

        match self.db.execute_query(&sql).await {
            Ok(result) => format!(
                "/*\n{} rows from {} table:\n{}\n*/",
                self.sample_rows,
                table,
                format_sample_rows(&result, self.max_value_length)
            ),
            Err(e) => {
                warn!(table, error = %e, "Failed to fetch sample rows");
                format!("/*\nSample rows unavailable: {}\n*/", error_detail(&e))
            }
        }
    }

    /// Executes `sql`; errors become text for the model to react to.
    pub async fn query(&self, sql: &str) -> String {
        match self.db.execute_query(sql).await {
            Ok(result) => {
                debug!(rows = result.row_count, "Tool query succeeded");
                result.format_for_llm(self.max_value_length)
            }
            Err(e) => {
                debug!(error = %e, "Tool query failed");
                format!("Error: {}", error_detail(&e))
            }
        }
    }

    /// Asks the LLM to review `sql` and returns its corrected query.
    pub async fn check_query(&self, sql: &str) -> Result<String, ChatError> {
        let diagnostics = parser_diagnostics(sql, self.backend());
        let prompt = prompt::build_checker_prompt(sql, self.backend(), &diagnostics);

        let reply = self.llm.complete(&[Message::user(prompt)]).await?;
        Ok(strip_code_fences(&reply))
    }

    /// Closes the bound handle.
    pub async fn close(&self) -> Result<(), ChatError> {
        self.db.close().await
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(call: &ToolCall) -> Result<T, ToolError> {
    let raw = if call.arguments.trim().is_empty() {
        "{}"
    } else {
        call.arguments.as_str()
    };
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments {
        tool: call.name.clone(),
        reason: e.to_string(),
    })
}

/// The message inside a ChatError, without its category prefix.
fn error_detail(error: &ChatError) -> String {
    match error {
        ChatError::Config(m)
        | ChatError::Connection(m)
        | ChatError::Query(m)
        | ChatError::Llm(m)
        | ChatError::Agent(m)
        | ChatError::Internal(m) => m.clone(),
        ChatError::NotConnected => error.to_string(),
    }
}

/// Runs the statement through sqlparser for the backend's dialect.
fn parser_diagnostics(sql: &str, backend: DatabaseBackend) -> String {
    let dialect: Box<dyn Dialect> = match backend {
        DatabaseBackend::Sqlite => Box::new(SQLiteDialect {}),
        DatabaseBackend::MySql => Box::new(MySqlDialect {}),
    };
    match Parser::parse_sql(dialect.as_ref(), sql) {
        Ok(_) => "OK".to_string(),
        Err(e) => e.to_string(),
    }
}

/// Returns the first fenced code block in model output, or the whole
/// output when there is none. Prose around the fence is dropped.
fn strip_code_fences(text: &str) -> String {
    Regex::new(r"(?s)```(?:[a-zA-Z]*[ \t]*\n)?(.*?)```")
        .ok()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| text.trim().to_string())
}

/// Tab-separated header and rows, as shown in schema tool output.
fn format_sample_rows(result: &QueryResult, max_value_length: usize) -> String {
    let header = result
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join("\t");

    let rows = result.rows.iter().map(|row| {
        row.iter()
            .map(|v| {
                let text = v.to_display_string();
                match text.char_indices().nth(max_value_length.min(100)) {
                    Some((idx, _)) => text[..idx].to_string(),
                    None => text,
                }
            })
            .collect::<Vec<_>>()
            .join("\t")
    });

    std::iter::once(header)
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}
