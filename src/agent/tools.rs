//! SQL tools the agent can call.
//!
//! Tool failures are returned as observation text so the model can correct
//! itself; they never abort the reasoning loop.

use crate::db::{DatabaseClient, Schema};
use crate::safety::{check_sql, classify_sql, Classification, SqlCheck};
use tracing::debug;

/// Rows rendered from a `sql_db_query` result.
pub const MAX_RESULT_ROWS: usize = 50;

/// Sample rows shown per table by `sql_db_schema`.
pub const SAMPLE_ROWS: usize = 3;

/// The tools offered to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Query,
    Schema,
    ListTables,
    QueryChecker,
}

impl Tool {
    pub const ALL: &'static [Tool] = &[
        Tool::Query,
        Tool::Schema,
        Tool::ListTables,
        Tool::QueryChecker,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Query => "sql_db_query",
            Self::Schema => "sql_db_schema",
            Self::ListTables => "sql_db_list_tables",
            Self::QueryChecker => "sql_db_query_checker",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Query => {
                "Input is a detailed and correct SQL query, output is a result from the database. \
                 If the query is not correct, an error message is returned. If an error is returned, \
                 rewrite the query, check it, and try again. If a column is unknown, use \
                 sql_db_schema to look up the correct table fields."
            }
            Self::Schema => {
                "Input is a comma-separated list of tables, output is the schema and sample rows \
                 for those tables. Make sure the tables exist by calling sql_db_list_tables first! \
                 Example Input: table1, table2, table3"
            }
            Self::ListTables => {
                "Input is an empty string, output is a comma-separated list of tables in the database."
            }
            Self::QueryChecker => {
                "Use this tool to double check that a query is valid SQL before executing it. \
                 Output is the normalized query and its safety level, or the syntax error. \
                 Always use this tool before executing a query with sql_db_query!"
            }
        }
    }

    /// Looks a tool up by the name the model used.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().trim_matches('`');
        Self::ALL.iter().copied().find(|tool| tool.name() == name)
    }

    /// Observation for a tool name the model made up.
    pub fn unknown(name: &str) -> String {
        let names = Self::ALL
            .iter()
            .map(Tool::name)
            .collect::<Vec<_>>()
            .join(", ");
        format!("{name} is not a valid tool, try one of [{names}].")
    }
}

/// What running a tool produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// Text to feed back to the model.
    Observation(String),
    /// A data-modifying statement that was held back for confirmation.
    HeldForConfirmation {
        sql: String,
        classification: Classification,
    },
}

/// Comma-separated table names.
pub fn list_tables(schema: &Schema) -> String {
    let names = schema.table_names();
    if names.is_empty() {
        "No tables found in the database.".to_string()
    } else {
        names.join(", ")
    }
}

/// DDL and sample rows for the requested tables.
pub async fn describe_tables(db: &dyn DatabaseClient, schema: &Schema, input: &str) -> String {
    let requested: Vec<&str> = input
        .split(',')
        .map(|name| name.trim().trim_matches('"'))
        .filter(|name| !name.is_empty())
        .collect();

    if requested.is_empty() {
        return "Error: provide at least one table name.".to_string();
    }

    let missing: Vec<&str> = requested
        .iter()
        .copied()
        .filter(|name| schema.find_table(name).is_none())
        .collect();
    if !missing.is_empty() {
        return format!(
            "Error: tables not found in database: {}",
            missing.join(", ")
        );
    }

    let mut sections = Vec::with_capacity(requested.len());
    for name in requested {
        let Some(table) = schema.find_table(name) else {
            continue;
        };

        let sample_sql = format!("SELECT * FROM \"{}\" LIMIT {SAMPLE_ROWS}", table.name);
        let samples = match db.execute_query(&sample_sql).await {
            Ok(result) => result.render_text(SAMPLE_ROWS),
            Err(e) => format!("(sample rows unavailable: {e})"),
        };

        sections.push(format!(
            "{}\n\n/*\n{SAMPLE_ROWS} rows from {} table:\n{samples}\n*/",
            schema.create_statement(table),
            table.name
        ));
    }

    sections.join("\n\n")
}

/// Runs a query, unless it modifies data and writes must be confirmed.
pub async fn run_query(db: &dyn DatabaseClient, sql: &str, confirm_writes: bool) -> ToolOutcome {
    let classification = classify_sql(sql);

    if confirm_writes && classification.requires_confirmation() {
        debug!(
            "Holding {} statement for confirmation",
            classification.statement_type
        );
        return ToolOutcome::HeldForConfirmation {
            sql: sql.to_string(),
            classification,
        };
    }

    ToolOutcome::Observation(match db.execute_query(sql).await {
        Ok(result) => {
            debug!(
                "Query returned {} row(s) in {:?}",
                result.row_count(),
                result.execution_time
            );
            result.render_text(MAX_RESULT_ROWS)
        }
        Err(e) => format!("Error: {e}"),
    })
}

/// Syntax check without execution.
pub fn check_query(sql: &str) -> String {
    match check_sql(sql) {
        SqlCheck::Valid {
            normalized,
            classification,
        } => {
            let mut text = format!(
                "The query is valid {} SQL (safety: {}).\n{normalized}",
                classification.statement_type, classification.level
            );
            if classification.requires_confirmation() {
                text.push_str("\nThis statement modifies the database and needs user confirmation.");
            }
            text
        }
        SqlCheck::Invalid(message) => format!("Syntax error: {message}"),
    }
}
