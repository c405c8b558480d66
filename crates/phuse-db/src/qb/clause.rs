//! Clause fragments.
//!
//! Each builder call records a typed fragment; nothing is turned into SQL
//! until the serializer walks the fragment lists. Placeholder names are
//! allocated when the fragment is recorded, so the registry is readable at
//! any point and no string patching ever happens at compile time.

use crate::dialect::Dialect;

/// Connective between two WHERE predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Connector {
    And,
    Or,
}

impl Connector {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// One WHERE predicate.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Predicate {
    /// Comparison against a bound placeholder: `column op :name`.
    Compare {
        column: String,
        op: String,
        placeholder: String,
    },

    /// Operator whose operand is embedded verbatim: `column BETWEEN 1 AND 9`,
    /// `column IS NULL`.
    RawOperand {
        column: String,
        op: String,
        operand: String,
    },

    /// Caller-supplied fragment, emitted as given.
    Raw(String),

    /// Membership test: `column IN (:a,:b)` / `column NOT IN (...)`.
    In {
        column: String,
        negated: bool,
        placeholders: Vec<String>,
    },

    /// JSON containment, dialect-routed.
    JsonContains { column: String, placeholder: String },

    /// Regular-expression match, dialect-routed.
    Regexp { column: String, placeholder: String },
}

impl Predicate {
    /// Render this predicate's SQL text.
    pub(crate) fn render(&self, dialect: Dialect) -> String {
        match self {
            Self::Compare {
                column,
                op,
                placeholder,
            } => format!("{column} {op} :{placeholder}"),
            Self::RawOperand {
                column,
                op,
                operand,
            } => format!("{column} {op} {operand}"),
            Self::Raw(fragment) => fragment.clone(),
            Self::In {
                column,
                negated,
                placeholders,
            } => {
                if placeholders.is_empty() {
                    // Guard instead of invalid `IN ()`.
                    return if *negated {
                        "1=1".to_string()
                    } else {
                        "1=0".to_string()
                    };
                }
                let list: Vec<String> =
                    placeholders.iter().map(|name| format!(":{name}")).collect();
                if *negated {
                    format!("{} NOT IN ({})", column, list.join(","))
                } else {
                    format!("{} IN ({})", column, list.join(","))
                }
            }
            Self::JsonContains {
                column,
                placeholder,
            } => dialect.json_contains(column, &format!(":{placeholder}")),
            Self::Regexp {
                column,
                placeholder,
            } => dialect.regexp(column, &format!(":{placeholder}")),
        }
    }
}

/// Render a full `WHERE …` clause, or nothing when both lists are empty.
///
/// `wheres` keeps each predicate's own connective; `extra` is the where-in
/// list, always `AND`-joined after it. The connective of whichever predicate
/// comes first is dropped, so a leading `OR` can never appear.
pub(crate) fn render_where(
    wheres: &[(Connector, Predicate)],
    extra: &[Predicate],
    dialect: Dialect,
) -> Option<String> {
    if wheres.is_empty() && extra.is_empty() {
        return None;
    }
    let mut sql = String::from("WHERE ");
    let mut first = true;
    for (connector, predicate) in wheres {
        if !first {
            sql.push(' ');
            sql.push_str(connector.as_str());
            sql.push(' ');
        }
        sql.push_str(&predicate.render(dialect));
        first = false;
    }
    for predicate in extra {
        if !first {
            sql.push_str(" AND ");
        }
        sql.push_str(&predicate.render(dialect));
        first = false;
    }
    Some(sql)
}

/// Join flavor allow-list. Anything else degrades to a plain `JOIN`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum JoinKind {
    Left,
    Right,
    Outer,
    Inner,
    LeftOuter,
    RightOuter,
}

impl JoinKind {
    pub(crate) fn parse(kind: &str) -> Option<Self> {
        let normalized = kind
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        match normalized.as_str() {
            "LEFT" => Some(Self::Left),
            "RIGHT" => Some(Self::Right),
            "OUTER" => Some(Self::Outer),
            "INNER" => Some(Self::Inner),
            "LEFT OUTER" => Some(Self::LeftOuter),
            "RIGHT OUTER" => Some(Self::RightOuter),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Outer => "OUTER",
            Self::Inner => "INNER",
            Self::LeftOuter => "LEFT OUTER",
            Self::RightOuter => "RIGHT OUTER",
        }
    }
}

/// One JOIN fragment.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Join {
    pub(crate) kind: Option<JoinKind>,
    pub(crate) table: String,
    pub(crate) condition: String,
}

impl Join {
    pub(crate) fn render(&self) -> String {
        match self.kind {
            Some(kind) => format!("{} JOIN {} ON {}", kind.as_str(), self.table, self.condition),
            None => format!("JOIN {} ON {}", self.table, self.condition),
        }
    }
}

/// One `SET` assignment of an UPDATE.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SetClause {
    pub(crate) column: String,
    pub(crate) placeholder: String,
}

impl SetClause {
    pub(crate) fn render(&self) -> String {
        format!("{} = :{}", self.column, self.placeholder)
    }
}

/// The column/placeholder lists of an INSERT.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct InsertClause {
    pub(crate) columns: Vec<String>,
    pub(crate) placeholders: Vec<String>,
    pub(crate) ignore: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_renders_named_placeholder() {
        let p = Predicate::Compare {
            column: "name".into(),
            op: "=".into(),
            placeholder: "name1".into(),
        };
        assert_eq!(p.render(Dialect::MySql), "name = :name1");
    }

    #[test]
    fn raw_operand_is_verbatim() {
        let p = Predicate::RawOperand {
            column: "age".into(),
            op: "BETWEEN".into(),
            operand: "18 AND 30".into(),
        };
        assert_eq!(p.render(Dialect::MySql), "age BETWEEN 18 AND 30");
    }

    #[test]
    fn in_list_commas_without_spaces() {
        let p = Predicate::In {
            column: "id".into(),
            negated: false,
            placeholders: vec!["id1".into(), "id2".into(), "id3".into()],
        };
        assert_eq!(p.render(Dialect::MySql), "id IN (:id1,:id2,:id3)");
    }

    #[test]
    fn empty_in_list_guards() {
        let hit = Predicate::In {
            column: "id".into(),
            negated: false,
            placeholders: vec![],
        };
        let miss = Predicate::In {
            column: "id".into(),
            negated: true,
            placeholders: vec![],
        };
        assert_eq!(hit.render(Dialect::MySql), "1=0");
        assert_eq!(miss.render(Dialect::MySql), "1=1");
    }

    #[test]
    fn where_merges_extra_with_and() {
        let wheres = vec![(
            Connector::And,
            Predicate::Raw("status = 'active'".into()),
        )];
        let extra = vec![Predicate::In {
            column: "id".into(),
            negated: false,
            placeholders: vec!["id1".into()],
        }];
        assert_eq!(
            render_where(&wheres, &extra, Dialect::MySql).unwrap(),
            "WHERE status = 'active' AND id IN (:id1)"
        );
    }

    #[test]
    fn leading_connector_is_dropped() {
        let wheres = vec![
            (Connector::Or, Predicate::Raw("a = 1".into())),
            (Connector::Or, Predicate::Raw("b = 2".into())),
        ];
        assert_eq!(
            render_where(&wheres, &[], Dialect::MySql).unwrap(),
            "WHERE a = 1 OR b = 2"
        );
    }

    #[test]
    fn no_predicates_no_clause() {
        assert_eq!(render_where(&[], &[], Dialect::MySql), None);
    }

    #[test]
    fn join_kind_allow_list() {
        assert_eq!(JoinKind::parse("left"), Some(JoinKind::Left));
        assert_eq!(JoinKind::parse("LEFT  OUTER"), Some(JoinKind::LeftOuter));
        assert_eq!(JoinKind::parse("SIDEWAYS"), None);
        assert_eq!(JoinKind::parse(""), None);
    }

    #[test]
    fn join_render() {
        let join = Join {
            kind: Some(JoinKind::Left),
            table: "orders".into(),
            condition: "orders.user_id=users.id".into(),
        };
        assert_eq!(join.render(), "LEFT JOIN orders ON orders.user_id=users.id");
        let plain = Join {
            kind: None,
            table: "orders".into(),
            condition: "orders.user_id=users.id".into(),
        };
        assert_eq!(plain.render(), "JOIN orders ON orders.user_id=users.id");
    }
}
