//! Query text templates issued by the table.

const PLACEHOLDER_TABLE_NAME: &str = "{{TABLE_NAME}}";
const PLACEHOLDER_CONDITION: &str = "{{CONDITION}}";

const FIND_QUERY: &str = "SELECT * FROM {{TABLE_NAME}} {{CONDITION}}";
const CONTAINS_QUERY: &str = "SELECT TOP 1 * FROM {{TABLE_NAME}} {{CONDITION}}";

const SQL_WHERE: &str = "WHERE";

/// `SELECT * FROM <table> [WHERE <filter>]`.
pub(crate) fn find_query(table: &str, filter: &str) -> String {
    format_query(FIND_QUERY, table, filter)
}

/// `SELECT TOP 1 * FROM <table> [WHERE <filter>]`.
pub(crate) fn contains_query(table: &str, filter: &str) -> String {
    format_query(CONTAINS_QUERY, table, filter)
}

// An empty filter drops the WHERE keyword and the trailing space.
fn format_query(template: &str, table: &str, filter: &str) -> String {
    let query = template.replace(PLACEHOLDER_TABLE_NAME, table);

    if filter.is_empty() {
        query
            .replace(PLACEHOLDER_CONDITION, "")
            .trim_end()
            .to_string()
    } else {
        query.replace(PLACEHOLDER_CONDITION, &format!("{SQL_WHERE} {filter}"))
    }
}
