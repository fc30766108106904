//! SQL parsing and classification logic.
//!
//! Uses sqlparser-rs with the SQLite dialect to parse SQL and classify
//! statements by their safety level.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use tracing::debug;

use crate::error::{ParleyError, Result};
use crate::llm::REFUSAL_MESSAGE;

use super::{ClassificationResult, SafetyLevel, StatementType};

/// SQL classifier that parses and classifies SQL queries.
#[derive(Debug)]
pub struct SqlClassifier {
    dialect: SQLiteDialect,
}

impl Default for SqlClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlClassifier {
    /// Creates a new SQL classifier.
    pub fn new() -> Self {
        Self {
            dialect: SQLiteDialect {},
        }
    }

    /// Classifies a SQL string and returns the classification result.
    ///
    /// SQLite syntax the parser does not know (GLOB, `IS NOT`, INDEXED BY)
    /// falls back to a keyword scan; see [`classify_unparsed`].
    pub fn classify(&self, sql: &str) -> ClassificationResult {
        let statements = match Parser::parse_sql(&self.dialect, sql) {
            Ok(statements) => statements,
            Err(e) => return classify_unparsed(sql, &e.to_string()),
        };

        match statements.as_slice() {
            [] => ClassificationResult::with_warning(
                SafetyLevel::Destructive,
                StatementType::Unknown,
                "Empty SQL statement",
            ),
            [statement] => {
                let (level, stmt_type) = classify_statement(statement);
                ClassificationResult::new(level, stmt_type)
            }
            _ => {
                // Multiple statements: report the most dangerous one
                let (level, stmt_type) = statements
                    .iter()
                    .map(classify_statement)
                    .max_by_key(|(level, _)| *level)
                    .unwrap_or((SafetyLevel::Destructive, StatementType::Unknown));
                ClassificationResult::new(level, StatementType::Multiple(Box::new(stmt_type)))
            }
        }
    }
}

/// Convenience function to classify SQL without creating a classifier instance.
pub fn classify_sql(sql: &str) -> ClassificationResult {
    SqlClassifier::new().classify(sql)
}

/// What the guard decided about a piece of SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardVerdict {
    /// Exactly one read-only statement.
    Allowed(ClassificationResult),
    /// The text is the model's refusal phrase, not SQL.
    Refused,
    /// Anything else; nothing may run.
    Rejected(ClassificationResult),
}

/// Runs the read-only guard over `sql`.
pub fn check_read_only(sql: &str) -> GuardVerdict {
    if is_refusal(sql) {
        return GuardVerdict::Refused;
    }

    let classification = classify_sql(sql);
    if classification.is_read_only() {
        GuardVerdict::Allowed(classification)
    } else {
        GuardVerdict::Rejected(classification)
    }
}

/// Accepts exactly one read-only statement.
///
/// Returns the classification on success and a `Query` error naming the
/// reason otherwise. The model's refusal phrase is reported as such.
pub fn ensure_read_only(sql: &str) -> Result<ClassificationResult> {
    match check_read_only(sql) {
        GuardVerdict::Allowed(classification) => Ok(classification),
        GuardVerdict::Refused => Err(refusal_error()),
        GuardVerdict::Rejected(classification) => {
            Err(ParleyError::query(classification.rejection_reason()))
        }
    }
}

/// The error reported when the model declined to write a query.
pub fn refusal_error() -> ParleyError {
    ParleyError::query(format!(
        "The model declined to write a query: {REFUSAL_MESSAGE}"
    ))
}

/// True when the whole text is the refusal phrase, optionally quoted.
fn is_refusal(sql: &str) -> bool {
    sql.trim().trim_matches('"').trim() == REFUSAL_MESSAGE
}

/// Statements that may open a read-only query.
const READ_KEYWORDS: &[&str] = &["SELECT", "WITH", "VALUES"];

/// Words that never belong in a read-only query, even inside a CTE.
const WRITE_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "ATTACH", "DETACH", "PRAGMA",
    "VACUUM", "REINDEX",
];

/// Classifies text the parser rejected by its leading keyword.
///
/// Accepts one statement that opens with SELECT, WITH or VALUES and has no
/// write keyword outside literals and comments. Everything else keeps the
/// parse error as its reason. The read-only connection still refuses any
/// write that slips through.
pub fn classify_unparsed(sql: &str, parse_error: &str) -> ClassificationResult {
    let unparsed = || {
        ClassificationResult::with_warning(
            SafetyLevel::Destructive,
            StatementType::Unknown,
            format!("Could not parse SQL: {parse_error}"),
        )
    };

    let tokens = lex(sql);
    let Some(Token::Word(first)) = tokens.first() else {
        return unparsed();
    };
    if !READ_KEYWORDS.contains(&first.as_str()) {
        return unparsed();
    }

    let mut statements = tokens.split(|t| *t == Token::Semicolon);
    let body = statements.next().unwrap_or_default();
    if statements.any(|rest| !rest.is_empty()) {
        return ClassificationResult::new(
            SafetyLevel::Destructive,
            StatementType::Multiple(Box::new(StatementType::Unknown)),
        );
    }

    let writes = body.iter().any(|t| match t {
        Token::Word(word) => WRITE_KEYWORDS.contains(&word.as_str()),
        _ => false,
    });
    if writes {
        return unparsed();
    }

    debug!(error = parse_error, "Accepted SQL by leading keyword");
    ClassificationResult::new(SafetyLevel::Safe, StatementType::Select)
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    /// Bare word, uppercased.
    Word(String),
    Semicolon,
    Other,
}

/// Splits SQL into bare words, semicolons and everything else. String
/// literals, quoted identifiers and comments are skipped.
fn lex(sql: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            ';' => tokens.push(Token::Semicolon),
            '\'' | '"' | '`' => {
                // A doubled quote inside a literal is an escaped quote
                while let Some(next) = chars.next() {
                    if next == c && chars.next_if_eq(&c).is_none() {
                        break;
                    }
                }
                tokens.push(Token::Other);
            }
            '[' => {
                chars.by_ref().find(|&next| next == ']');
                tokens.push(Token::Other);
            }
            '-' if chars.next_if_eq(&'-').is_some() => {
                chars.by_ref().find(|&next| next == '\n');
            }
            '/' if chars.next_if_eq(&'*').is_some() => {
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut word = c.to_uppercase().collect::<String>();
                while let Some(next) = chars.next_if(|n| n.is_alphanumeric() || *n == '_') {
                    word.extend(next.to_uppercase());
                }
                tokens.push(Token::Word(word));
            }
            _ => tokens.push(Token::Other),
        }
    }
    tokens
}

/// Classifies a single parsed statement.
fn classify_statement(statement: &Statement) -> (SafetyLevel, StatementType) {
    match statement {
        // Query: recurse into CTEs, set operations and derived tables
        Statement::Query(query) => classify_query(query),

        // SQLite never executes the explained statement, but we still only
        // accept plans of statements that would themselves be allowed.
        Statement::Explain { statement, .. } => {
            let (inner_level, _) = classify_statement(statement);
            (inner_level, StatementType::Explain)
        }

        // Mutating: data modification
        Statement::Insert(_) => (SafetyLevel::Mutating, StatementType::Insert),
        Statement::Update { .. } => (SafetyLevel::Mutating, StatementType::Update),
        Statement::Merge { .. } => (SafetyLevel::Mutating, StatementType::Merge),

        // Destructive: data loss, schema or connection changes
        Statement::Delete(_) => (SafetyLevel::Destructive, StatementType::Delete),
        Statement::Drop { .. } => (SafetyLevel::Destructive, StatementType::Drop),
        Statement::Truncate { .. } => (SafetyLevel::Destructive, StatementType::Truncate),
        Statement::AlterTable { .. } => (SafetyLevel::Destructive, StatementType::Alter),
        Statement::CreateTable(_) => (SafetyLevel::Destructive, StatementType::Create),
        Statement::CreateIndex(_) => (SafetyLevel::Destructive, StatementType::Create),
        Statement::CreateView { .. } => (SafetyLevel::Destructive, StatementType::Create),
        Statement::CreateTrigger { .. } => (SafetyLevel::Destructive, StatementType::Create),
        Statement::Pragma { .. } => (SafetyLevel::Destructive, StatementType::Pragma),
        Statement::AttachDatabase { .. } => (SafetyLevel::Destructive, StatementType::Attach),

        // Conservative default: treat unknown statements as destructive
        _ => (SafetyLevel::Destructive, StatementType::Unknown),
    }
}

/// Classifies a Query by recursively inspecting for data-modifying operations.
/// Returns the most dangerous (SafetyLevel, StatementType) found.
fn classify_query(query: &Query) -> (SafetyLevel, StatementType) {
    let ctes = query
        .with
        .iter()
        .flat_map(|with| with.cte_tables.iter())
        .map(|cte| classify_query(&cte.query));

    most_dangerous(
        std::iter::once(classify_set_expr(&query.body)).chain(ctes),
    )
}

/// Classifies a SetExpr, detecting mutations and recursing into nested queries.
fn classify_set_expr(set_expr: &SetExpr) -> (SafetyLevel, StatementType) {
    match set_expr {
        SetExpr::Insert(stmt) | SetExpr::Update(stmt) => classify_statement(stmt),
        SetExpr::Query(query) => classify_query(query),
        SetExpr::Select(select) => classify_select(select),
        SetExpr::SetOperation { left, right, .. } => {
            most_dangerous([classify_set_expr(left), classify_set_expr(right)])
        }
        SetExpr::Values(_) | SetExpr::Table(_) => (SafetyLevel::Safe, StatementType::Select),
        #[allow(unreachable_patterns)]
        _ => (SafetyLevel::Destructive, StatementType::Unknown),
    }
}

/// Classifies a Select by checking its FROM clause for subqueries.
fn classify_select(select: &Select) -> (SafetyLevel, StatementType) {
    most_dangerous(select.from.iter().map(classify_table_with_joins))
}

/// Classifies a TableWithJoins, checking the main relation and all joins.
fn classify_table_with_joins(twj: &TableWithJoins) -> (SafetyLevel, StatementType) {
    most_dangerous(
        std::iter::once(&twj.relation)
            .chain(twj.joins.iter().map(|join| &join.relation))
            .map(classify_table_factor),
    )
}

/// Classifies a TableFactor, recursing into derived tables (subqueries).
fn classify_table_factor(factor: &TableFactor) -> (SafetyLevel, StatementType) {
    match factor {
        TableFactor::Derived { subquery, .. } => classify_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => classify_table_with_joins(table_with_joins),
        // Other variants (Table, TableFunction, etc.) are safe
        _ => (SafetyLevel::Safe, StatementType::Select),
    }
}

/// Picks the highest level; the first one wins on ties. Empty input is a
/// plain SELECT.
fn most_dangerous(
    items: impl IntoIterator<Item = (SafetyLevel, StatementType)>,
) -> (SafetyLevel, StatementType) {
    items
        .into_iter()
        .fold((SafetyLevel::Safe, StatementType::Select), |max, item| {
            if item.0 > max.0 {
                item
            } else {
                max
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_classification(sql: &str, expected_level: SafetyLevel, expected_type: StatementType) {
        let result = classify_sql(sql);
        assert_eq!(
            result.level, expected_level,
            "SQL: '{}' - expected level {:?}, got {:?}",
            sql, expected_level, result.level
        );
        assert_eq!(
            result.statement_type, expected_type,
            "SQL: '{}' - expected type {:?}, got {:?}",
            sql, expected_type, result.statement_type
        );
    }

    // Safe queries
    #[test]
    fn test_select_is_safe() {
        assert_classification("SELECT * FROM orders", SafetyLevel::Safe, StatementType::Select);
    }

    #[test]
    fn test_select_with_join_is_safe() {
        assert_classification(
            "SELECT c.name, o.amount FROM customers c JOIN orders o ON c.id = o.customer_id",
            SafetyLevel::Safe,
            StatementType::Select,
        );
    }

    #[test]
    fn test_select_with_subquery_is_safe() {
        assert_classification(
            "SELECT * FROM (SELECT id FROM orders) AS sub WHERE id IN (SELECT id FROM orders)",
            SafetyLevel::Safe,
            StatementType::Select,
        );
    }

    #[test]
    fn test_cte_select_is_safe() {
        assert_classification(
            "WITH big AS (SELECT * FROM orders WHERE amount > 10) SELECT COUNT(*) FROM big",
            SafetyLevel::Safe,
            StatementType::Select,
        );
    }

    #[test]
    fn test_union_is_safe() {
        assert_classification(
            "SELECT id FROM orders UNION ALL SELECT id FROM refunds",
            SafetyLevel::Safe,
            StatementType::Select,
        );
    }

    #[test]
    fn test_values_is_safe() {
        assert_classification("VALUES (1, 'a'), (2, 'b')", SafetyLevel::Safe, StatementType::Select);
    }

    #[test]
    fn test_explain_query_plan_select_is_safe() {
        assert_classification(
            "EXPLAIN QUERY PLAN SELECT * FROM orders",
            SafetyLevel::Safe,
            StatementType::Explain,
        );
    }

    #[test]
    fn test_trailing_semicolon_is_single_statement() {
        assert_classification("SELECT 1;", SafetyLevel::Safe, StatementType::Select);
    }

    #[test]
    fn test_case_insensitive() {
        assert_classification("select * from orders", SafetyLevel::Safe, StatementType::Select);
        assert_classification("delete from orders", SafetyLevel::Destructive, StatementType::Delete);
    }

    // Mutating and destructive
    #[test]
    fn test_insert_is_mutating() {
        assert_classification(
            "INSERT INTO orders (id, amount) VALUES (4, 1.5)",
            SafetyLevel::Mutating,
            StatementType::Insert,
        );
    }

    #[test]
    fn test_update_is_mutating() {
        assert_classification(
            "UPDATE orders SET amount = 0 WHERE id = 1",
            SafetyLevel::Mutating,
            StatementType::Update,
        );
    }

    #[test]
    fn test_delete_is_destructive() {
        assert_classification("DELETE FROM orders", SafetyLevel::Destructive, StatementType::Delete);
    }

    #[test]
    fn test_drop_table_is_destructive() {
        assert_classification(
            "DROP TABLE IF EXISTS orders",
            SafetyLevel::Destructive,
            StatementType::Drop,
        );
    }

    #[test]
    fn test_alter_and_create_are_destructive() {
        assert_classification(
            "ALTER TABLE orders ADD COLUMN note TEXT",
            SafetyLevel::Destructive,
            StatementType::Alter,
        );
        assert_classification(
            "CREATE TABLE t (a INTEGER)",
            SafetyLevel::Destructive,
            StatementType::Create,
        );
        assert_classification(
            "CREATE INDEX idx_amount ON orders (amount)",
            SafetyLevel::Destructive,
            StatementType::Create,
        );
    }

    #[test]
    fn test_pragma_is_destructive() {
        assert_classification(
            "PRAGMA journal_mode = DELETE",
            SafetyLevel::Destructive,
            StatementType::Pragma,
        );
        assert_classification(
            "PRAGMA table_info(orders)",
            SafetyLevel::Destructive,
            StatementType::Pragma,
        );
    }

    #[test]
    fn test_attach_is_destructive() {
        assert_classification(
            "ATTACH DATABASE 'other.db' AS other",
            SafetyLevel::Destructive,
            StatementType::Attach,
        );
    }

    #[test]
    fn test_explain_of_delete_is_rejected() {
        assert_classification(
            "EXPLAIN DELETE FROM orders",
            SafetyLevel::Destructive,
            StatementType::Explain,
        );
    }

    // Multiple statements
    #[test]
    fn test_multi_statement_uses_most_dangerous() {
        assert_classification(
            "SELECT 1; DROP TABLE orders",
            SafetyLevel::Destructive,
            StatementType::Multiple(Box::new(StatementType::Drop)),
        );
    }

    #[test]
    fn test_multi_statement_all_safe_is_not_read_only() {
        let result = classify_sql("SELECT 1; SELECT 2");
        assert_eq!(result.level, SafetyLevel::Safe);
        assert!(!result.is_read_only());
    }

    // Edge cases
    #[test]
    fn test_parse_failure_is_destructive() {
        let result = classify_sql("SELEC * FORM orders");
        assert_eq!(result.level, SafetyLevel::Destructive);
        assert_eq!(result.statement_type, StatementType::Unknown);
        assert!(result.warning.unwrap().contains("Could not parse SQL"));
    }

    #[test]
    fn test_empty_sql_is_destructive() {
        for sql in ["", "   ", "-- just a comment"] {
            let result = classify_sql(sql);
            assert_eq!(result.level, SafetyLevel::Destructive, "SQL: {sql:?}");
            assert!(!result.is_read_only());
        }
    }

    #[test]
    fn test_classifier_default() {
        let classifier = SqlClassifier::default();
        assert!(classifier.classify("SELECT 1").is_read_only());
    }

    // Guard
    #[test]
    fn test_ensure_read_only_accepts_select() {
        let result = ensure_read_only("SELECT * FROM orders").unwrap();
        assert_eq!(result.statement_type, StatementType::Select);
    }

    #[test]
    fn test_ensure_read_only_rejects_mutations() {
        for sql in [
            "DELETE FROM orders",
            "INSERT INTO orders VALUES (1, 2.0)",
            "UPDATE orders SET amount = 1",
            "DROP TABLE orders",
            "PRAGMA writable_schema = ON",
            "SELECT 1; DELETE FROM orders",
        ] {
            let err = ensure_read_only(sql).unwrap_err();
            assert_eq!(err.category(), "Query Error", "SQL: {sql}");
        }
    }

    #[test]
    fn test_ensure_read_only_reports_refusal() {
        let err = ensure_read_only(REFUSAL_MESSAGE).unwrap_err();
        assert!(err.to_string().contains("declined"));
        assert!(err.to_string().contains(REFUSAL_MESSAGE));
    }

    #[test]
    fn test_refusal_phrase_inside_a_literal_is_a_query() {
        let sql = format!("SELECT '{REFUSAL_MESSAGE}' AS msg");
        assert!(ensure_read_only(&sql).is_ok());
        assert_eq!(check_read_only(&format!("\"{REFUSAL_MESSAGE}\"")), GuardVerdict::Refused);
        assert_eq!(check_read_only(&format!("  {REFUSAL_MESSAGE}\n")), GuardVerdict::Refused);
    }

    #[test]
    fn test_sqlite_only_syntax_is_read_only() {
        for sql in [
            "SELECT * FROM orders WHERE name GLOB 'a*'",
            "SELECT * FROM orders WHERE amount IS NOT 3",
            "SELECT * FROM orders INDEXED BY idx_amount",
        ] {
            assert!(classify_sql(sql).is_read_only(), "SQL: {sql}");
        }
    }

    #[test]
    fn test_unparsed_accepts_leading_read_keyword() {
        for sql in [
            "SELECT name FROM t WHERE name GLOB 'x*';",
            "with recent as (select 1) select * from recent",
            "VALUES (1)",
            "-- note\nSELECT 'drop; delete' AS \"update\" /* insert */",
        ] {
            let result = classify_unparsed(sql, "unsupported");
            assert!(result.is_read_only(), "SQL: {sql}");
        }
    }

    #[test]
    fn test_unparsed_rejects_writes_and_multiple_statements() {
        let result = classify_unparsed("WITH d AS (SELECT 1) DELETE FROM orders", "unsupported");
        assert!(!result.is_read_only());
        assert_eq!(result.rejection_reason(), "Could not parse SQL: unsupported");

        let result = classify_unparsed("SELECT 1 GLOB 'x'; DROP TABLE orders", "unsupported");
        assert_eq!(
            result.statement_type,
            StatementType::Multiple(Box::new(StatementType::Unknown))
        );
        assert!(!result.is_read_only());

        for sql in ["show me everything", "PRAGMA user_version", "", "'SELECT'"] {
            assert!(!classify_unparsed(sql, "unsupported").is_read_only(), "SQL: {sql}");
        }
    }

    #[test]
    fn test_lex_skips_literals_and_comments() {
        assert_eq!(
            lex("select 'it''s;' [a b] -- x\n; /* y */ z"),
            vec![
                Token::Word("SELECT".to_string()),
                Token::Other,
                Token::Other,
                Token::Semicolon,
                Token::Word("Z".to_string()),
            ]
        );
    }

    #[test]
    fn test_ensure_read_only_rejects_garbage() {
        let err = ensure_read_only("please show me everything").unwrap_err();
        assert!(err.to_string().contains("Could not parse SQL"));
    }
}
