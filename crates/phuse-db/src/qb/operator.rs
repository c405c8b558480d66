//! The closed operator table.
//!
//! Used only to recognize operator tokens when `where_` arguments arrive in
//! either order, and to pick the operators whose right-hand side is embedded
//! raw. This is token matching, not a SQL grammar.

/// Every operator token `where_` recognizes.
const OPERATORS: &[&str] = &[
    "=",
    "!=",
    "<>",
    "<",
    ">",
    "<=",
    ">=",
    "LIKE",
    "NOT LIKE",
    "IN",
    "NOT IN",
    "BETWEEN",
    "NOT BETWEEN",
    "IS",
    "IS NOT",
];

/// Operators whose operand is interpolated verbatim instead of bound, so
/// fragments like `BETWEEN 1 AND 9` and `IS NULL` come out intact.
const RAW_OPERAND: &[&str] = &["BETWEEN", "NOT BETWEEN", "IS", "IS NOT"];

/// Collapse whitespace and uppercase, so `" not   like "` matches `NOT LIKE`.
pub(crate) fn normalize(token: &str) -> String {
    token
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}

/// Whether `token` is a recognized operator.
pub(crate) fn is_operator(token: &str) -> bool {
    OPERATORS.contains(&normalize(token).as_str())
}

/// Whether a normalized operator embeds its operand raw.
pub(crate) fn embeds_raw_operand(op: &str) -> bool {
    RAW_OPERAND.contains(&op)
}
