//! Bind-variable styles and query rebinding
//!
//! Queries are written with `?` placeholders and rewritten into the style the
//! target driver expects.

use serde::{Deserialize, Serialize};

/// Placeholder syntax understood by a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindStyle {
    /// `?` (MySQL, SQLite)
    Question,
    /// `$1`, `$2`, ... (PostgreSQL)
    Dollar,
    /// `:arg1`, `:arg2`, ... (Oracle)
    Named,
    /// `@p1`, `@p2`, ... (SQL Server)
    At,
    /// Driver not known; queries are passed through untouched
    Unknown,
}

impl BindStyle {
    /// Bind style for a driver kind name.
    ///
    /// ```
    /// use wdb_core::BindStyle;
    ///
    /// assert_eq!(BindStyle::for_driver("postgresql"), BindStyle::Dollar);
    /// assert_eq!(BindStyle::for_driver("MySQL"), BindStyle::Question);
    /// assert_eq!(BindStyle::for_driver("cassandra"), BindStyle::Unknown);
    /// ```
    pub fn for_driver(driver: &str) -> Self {
        match driver.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pgx" | "pq-timeouts" | "cloudsqlpostgres" => {
                BindStyle::Dollar
            }
            "mysql" | "mariadb" | "sqlite" | "sqlite3" => BindStyle::Question,
            "oracle" | "oci8" | "ora" | "goracle" | "godror" => BindStyle::Named,
            "sqlserver" | "mssql" => BindStyle::At,
            _ => BindStyle::Unknown,
        }
    }

    fn placeholder(&self, n: usize) -> Option<String> {
        match self {
            BindStyle::Dollar => Some(format!("${}", n)),
            BindStyle::Named => Some(format!(":arg{}", n)),
            BindStyle::At => Some(format!("@p{}", n)),
            BindStyle::Question | BindStyle::Unknown => None,
        }
    }
}

/// Rewrite `?` placeholders into `style`.
///
/// Question marks inside single-quoted literals, double-quoted identifiers,
/// `--` line comments and `/* */` block comments are left alone. A doubled
/// quote inside a literal or identifier does not end it.
///
/// ```
/// use wdb_core::{BindStyle, rebind};
///
/// assert_eq!(
///     rebind(BindStyle::Dollar, "SELECT * FROM t WHERE a = ? AND b = '?'"),
///     "SELECT * FROM t WHERE a = $1 AND b = '?'"
/// );
/// ```
pub fn rebind(style: BindStyle, query: &str) -> String {
    if style.placeholder(1).is_none() {
        return query.to_string();
    }

    let mut out = String::with_capacity(query.len() + 8);
    let mut chars = query.chars().peekable();
    let mut n = 0;
    while let Some(ch) = chars.next() {
        out.push(ch);
        match ch {
            '\'' | '"' => {
                // Runs until the closing quote; a doubled quote reopens it
                for inner in chars.by_ref() {
                    out.push(inner);
                    if inner == ch {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for inner in chars.by_ref() {
                    out.push(inner);
                    if inner == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                let mut prev = '\0';
                if let Some(star) = chars.next() {
                    out.push(star);
                }
                for inner in chars.by_ref() {
                    out.push(inner);
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
            }
            '?' => {
                out.pop();
                n += 1;
                match style.placeholder(n) {
                    Some(p) => out.push_str(&p),
                    None => out.push(ch),
                }
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::postgres("postgres", BindStyle::Dollar)]
    #[case::pgx("pgx", BindStyle::Dollar)]
    #[case::mysql("mysql", BindStyle::Question)]
    #[case::sqlite("sqlite3", BindStyle::Question)]
    #[case::oracle("oci8", BindStyle::Named)]
    #[case::sqlserver("sqlserver", BindStyle::At)]
    #[case::unknown("sqlmock", BindStyle::Unknown)]
    fn test_style_for_driver(#[case] driver: &str, #[case] expected: BindStyle) {
        assert_eq!(BindStyle::for_driver(driver), expected);
    }

    #[rstest]
    #[case::question(BindStyle::Question, "a = ? AND b = ?", "a = ? AND b = ?")]
    #[case::unknown(BindStyle::Unknown, "a = ? AND b = ?", "a = ? AND b = ?")]
    #[case::dollar(BindStyle::Dollar, "a = ? AND b = ?", "a = $1 AND b = $2")]
    #[case::named(BindStyle::Named, "a = ? AND b = ?", "a = :arg1 AND b = :arg2")]
    #[case::at(BindStyle::At, "a = ? AND b = ?", "a = @p1 AND b = @p2")]
    #[case::no_placeholders(BindStyle::Dollar, "SELECT 1", "SELECT 1")]
    fn test_rebind(#[case] style: BindStyle, #[case] query: &str, #[case] expected: &str) {
        assert_eq!(rebind(style, query), expected);
    }

    #[test]
    fn test_rebind_skips_literals() {
        assert_eq!(
            rebind(BindStyle::Dollar, "SELECT 'it''s ?', ? FROM t WHERE x = ?"),
            "SELECT 'it''s ?', $1 FROM t WHERE x = $2"
        );
    }

    #[rstest]
    #[case::identifier(
        r#"SELECT "why?" FROM t WHERE x = ?"#,
        r#"SELECT "why?" FROM t WHERE x = $1"#
    )]
    #[case::line_comment(
        "SELECT a -- is it ?\nFROM t WHERE x = ?",
        "SELECT a -- is it ?\nFROM t WHERE x = $1"
    )]
    #[case::block_comment(
        "SELECT /* a ? b */ a FROM t WHERE x = ? /* ? */",
        "SELECT /* a ? b */ a FROM t WHERE x = $1 /* ? */"
    )]
    #[case::minus_is_not_comment("SELECT ? - ? FROM t", "SELECT $1 - $2 FROM t")]
    #[case::division_is_not_comment("SELECT ? / ? FROM t", "SELECT $1 / $2 FROM t")]
    fn test_rebind_skips_identifiers_and_comments(#[case] query: &str, #[case] expected: &str) {
        assert_eq!(rebind(BindStyle::Dollar, query), expected);
    }

    #[test]
    fn test_rebind_many_placeholders() {
        let query = vec!["?"; 12].join(", ");
        let rebound = rebind(BindStyle::Dollar, &query);
        assert!(rebound.ends_with("$11, $12"), "{}", rebound);
    }
}
