//! SQL parsing and classification.
//!
//! Uses sqlparser with the PostgreSQL dialect. Nothing here executes SQL.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use super::{Classification, SafetyLevel, StatementType};

type Verdict = (SafetyLevel, StatementType);

/// Outcome of a syntax check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlCheck {
    /// Parsed; holds the normalized SQL and its classification.
    Valid {
        normalized: String,
        classification: Classification,
    },
    /// Failed to parse; holds the parser message.
    Invalid(String),
}

/// Classifies a SQL string.
///
/// SQL that cannot be parsed is treated as destructive.
pub fn classify_sql(sql: &str) -> Classification {
    match Parser::parse_sql(&PostgreSqlDialect {}, sql) {
        Ok(statements) => classify_statements(&statements),
        Err(_) => Classification::with_warning(
            SafetyLevel::Destructive,
            StatementType::Unknown,
            "Could not parse SQL. Please review carefully.",
        ),
    }
}

/// Parses SQL and reports syntax errors without executing anything.
pub fn check_sql(sql: &str) -> SqlCheck {
    match Parser::parse_sql(&PostgreSqlDialect {}, sql) {
        Ok(statements) if statements.is_empty() => {
            SqlCheck::Invalid("Empty SQL statement".to_string())
        }
        Ok(statements) => SqlCheck::Valid {
            normalized: statements
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(";\n"),
            classification: classify_statements(&statements),
        },
        Err(e) => SqlCheck::Invalid(e.to_string()),
    }
}

fn classify_statements(statements: &[Statement]) -> Classification {
    match statements {
        [] => Classification::with_warning(
            SafetyLevel::Destructive,
            StatementType::Unknown,
            "Empty SQL statement",
        ),
        [single] => {
            let (level, statement_type) = classify_statement(single);
            Classification::new(level, statement_type)
        }
        many => {
            let (level, statement_type) = many
                .iter()
                .map(classify_statement)
                .fold((SafetyLevel::Safe, StatementType::Select), worst);
            Classification::new(level, StatementType::Multiple(Box::new(statement_type)))
        }
    }
}

/// Keeps the more dangerous verdict; ties keep the first.
fn worst(a: Verdict, b: Verdict) -> Verdict {
    if b.0 > a.0 {
        b
    } else {
        a
    }
}

fn classify_statement(statement: &Statement) -> Verdict {
    match statement {
        // May contain data-modifying CTEs
        Statement::Query(query) => classify_query(query),
        Statement::Explain {
            analyze, statement, ..
        } => {
            if *analyze {
                // EXPLAIN ANALYZE runs the statement
                (classify_statement(statement).0, StatementType::Explain)
            } else {
                (SafetyLevel::Safe, StatementType::Explain)
            }
        }
        Statement::ShowVariable { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowCreate { .. }
        | Statement::ShowFunctions { .. } => (SafetyLevel::Safe, StatementType::Show),

        Statement::Insert { .. } => (SafetyLevel::Mutating, StatementType::Insert),
        Statement::Update { .. } => (SafetyLevel::Mutating, StatementType::Update),
        Statement::Merge { .. } => (SafetyLevel::Mutating, StatementType::Merge),

        Statement::Delete { .. } => (SafetyLevel::Destructive, StatementType::Delete),
        Statement::Drop { .. } => (SafetyLevel::Destructive, StatementType::Drop),
        Statement::Truncate { .. } => (SafetyLevel::Destructive, StatementType::Truncate),
        Statement::AlterTable { .. }
        | Statement::AlterIndex { .. }
        | Statement::AlterView { .. }
        | Statement::AlterRole { .. } => (SafetyLevel::Destructive, StatementType::Alter),
        Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. }
        | Statement::CreateSchema { .. }
        | Statement::CreateDatabase { .. }
        | Statement::CreateFunction { .. }
        | Statement::CreateRole { .. }
        | Statement::CreateSequence { .. }
        | Statement::CreateType { .. } => (SafetyLevel::Destructive, StatementType::Create),
        Statement::Grant { .. } => (SafetyLevel::Destructive, StatementType::Grant),
        Statement::Revoke { .. } => (SafetyLevel::Destructive, StatementType::Revoke),

        _ => (SafetyLevel::Destructive, StatementType::Unknown),
    }
}

fn classify_query(query: &Query) -> Verdict {
    let ctes = query
        .with
        .iter()
        .flat_map(|with| with.cte_tables.iter())
        .map(|cte| classify_query(&cte.query));

    ctes.chain(std::iter::once(classify_set_expr(&query.body)))
        .fold((SafetyLevel::Safe, StatementType::Select), worst)
}

fn classify_set_expr(set_expr: &SetExpr) -> Verdict {
    match set_expr {
        SetExpr::Insert(stmt) | SetExpr::Update(stmt) => classify_statement(stmt),
        SetExpr::Query(query) => classify_query(query),
        SetExpr::Select(select) => classify_select(select),
        SetExpr::SetOperation { left, right, .. } => {
            worst(classify_set_expr(left), classify_set_expr(right))
        }
        SetExpr::Values(_) | SetExpr::Table(_) => (SafetyLevel::Safe, StatementType::Select),
        #[allow(unreachable_patterns)]
        _ => (SafetyLevel::Destructive, StatementType::Unknown),
    }
}

fn classify_select(select: &Select) -> Verdict {
    select
        .from
        .iter()
        .map(classify_table_with_joins)
        .fold((SafetyLevel::Safe, StatementType::Select), worst)
}

fn classify_table_with_joins(twj: &TableWithJoins) -> Verdict {
    std::iter::once(&twj.relation)
        .chain(twj.joins.iter().map(|join| &join.relation))
        .map(classify_table_factor)
        .fold((SafetyLevel::Safe, StatementType::Select), worst)
}

fn classify_table_factor(factor: &TableFactor) -> Verdict {
    match factor {
        TableFactor::Derived { subquery, .. } => classify_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => classify_table_with_joins(table_with_joins),
        _ => (SafetyLevel::Safe, StatementType::Select),
    }
}
