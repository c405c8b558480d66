//! The fluent query builder.

use crate::dialect::Dialect;
use crate::error::{DbError, Result};
use crate::qb::bind::Bindings;
use crate::qb::clause::{
    Connector, InsertClause, Join, JoinKind, Predicate, SetClause, render_where,
};
use crate::qb::operator;
use crate::value::Value;

/// Builds one SQL statement through chained calls, then compiles it.
///
/// A builder is pinned to one dialect and one base table at construction.
/// `from()` can point the FROM clause elsewhere, but insert/update/delete
/// always target the construction table. Clause calls either append
/// (`where_*`, `join`) or overwrite (`select`, `from`, `group_by`,
/// `order_by`, `limit`, `offset`), and every bound value goes through the
/// bind registry, never into the SQL text.
#[derive(Clone, Debug)]
pub struct QueryBuilder {
    dialect: Dialect,
    table: String,
    select: Vec<String>,
    distinct: bool,
    from: Option<String>,
    joins: Vec<Join>,
    wheres: Vec<(Connector, Predicate)>,
    where_ins: Vec<Predicate>,
    group_by: Option<String>,
    order_by: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    insert: Option<InsertClause>,
    update: Option<Vec<SetClause>>,
    delete: bool,
    bindings: Bindings,
}

impl QueryBuilder {
    pub fn new(dialect: Dialect, table: &str) -> Self {
        Self {
            dialect,
            table: table.to_string(),
            select: Vec::new(),
            distinct: false,
            from: None,
            joins: Vec::new(),
            wheres: Vec::new(),
            where_ins: Vec::new(),
            group_by: None,
            order_by: None,
            limit: None,
            offset: None,
            insert: None,
            update: None,
            delete: false,
            bindings: Bindings::new(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The base table fixed at construction.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Start a SELECT with the given projection, replacing any previous one.
    pub fn select(mut self, fields: &str) -> Self {
        self.select = vec![fields.to_string()];
        self
    }

    /// Mark the projection as `SELECT DISTINCT`.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Override the FROM source (table expression, alias, subquery text).
    pub fn from(mut self, source: &str) -> Self {
        self.from = Some(source.to_string());
        self
    }

    /// Append an `AND`-connected predicate: `column operator :placeholder`.
    ///
    /// The call convention is forgiving about argument order: if `value` is
    /// itself a recognized operator token, it is taken as the operator and
    /// `operator` is bound as the (text) value, so
    /// `where_("age", ">", "30")` and `where_("age", 30, ">")` mean the
    /// same thing. For `BETWEEN`/`NOT BETWEEN`/`IS`/`IS NOT` the operand is
    /// embedded verbatim with no bind, keeping fragments like
    /// `BETWEEN 18 AND 30` and `IS NULL` intact.
    pub fn where_(self, column: &str, value: impl Into<Value>, operator: &str) -> Self {
        self.push_where(Connector::And, column, value.into(), operator)
    }

    /// `where_` with the `=` operator.
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_(column, value, "=")
    }

    /// Append an `OR`-connected predicate. The first predicate of a
    /// statement never renders a leading `OR`.
    pub fn or_where(self, column: &str, value: impl Into<Value>, operator: &str) -> Self {
        self.push_where(Connector::Or, column, value.into(), operator)
    }

    /// Append a caller-supplied predicate verbatim, `AND`-connected.
    pub fn where_raw(mut self, fragment: &str) -> Self {
        self.wheres
            .push((Connector::And, Predicate::Raw(fragment.to_string())));
        self
    }

    /// Append `column IN (…)` with one placeholder per value.
    ///
    /// Repeated calls accumulate and are `AND`-joined with each other and
    /// with the `where_` predicates. An empty value list compiles to the
    /// never-true guard `1=0`.
    pub fn where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_where_in(column, values, false)
    }

    /// Append `column NOT IN (…)`. An empty value list compiles to `1=1`.
    pub fn where_not_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push_where_in(column, values, true)
    }

    /// Append a JSON-containment predicate; the document is serialized and
    /// bound. MySQL renders `JSON_CONTAINS(column, :p)`, PgSQL
    /// `column @> :p::jsonb`.
    pub fn json_contains(mut self, column: &str, document: &serde_json::Value) -> Self {
        let placeholder = self
            .bindings
            .bind(column, Value::Text(document.to_string()));
        self.wheres.push((
            Connector::And,
            Predicate::JsonContains {
                column: column.to_string(),
                placeholder,
            },
        ));
        self
    }

    /// Append a regular-expression predicate with the pattern bound. MySQL
    /// renders `column REGEXP :p`, PgSQL `column ~ :p`.
    pub fn regexp(mut self, column: &str, pattern: &str) -> Self {
        let placeholder = self.bindings.bind(column, Value::from(pattern));
        self.wheres.push((
            Connector::And,
            Predicate::Regexp {
                column: column.to_string(),
                placeholder,
            },
        ));
        self
    }

    /// Append a join. `kind` is checked against the allow-list
    /// `LEFT | RIGHT | OUTER | INNER | LEFT OUTER | RIGHT OUTER`; anything
    /// else (including the empty string) is silently dropped, leaving a
    /// plain `JOIN`.
    pub fn join(mut self, table: &str, condition: &str, kind: &str) -> Self {
        self.joins.push(Join {
            kind: JoinKind::parse(kind),
            table: table.to_string(),
            condition: condition.to_string(),
        });
        self
    }

    /// Set the GROUP BY expression, replacing any previous one.
    pub fn group_by(mut self, expr: &str) -> Self {
        self.group_by = Some(expr.to_string());
        self
    }

    /// Set the ORDER BY expression, replacing any previous one.
    pub fn order_by(mut self, expr: &str) -> Self {
        self.order_by = Some(expr.to_string());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Add `MAX(field) AS alias` to the projection (alias defaults to the
    /// field name).
    pub fn max(self, field: &str, alias: Option<&str>) -> Self {
        self.aggregate("MAX", field, alias)
    }

    /// Add `MIN(field) AS alias` to the projection.
    pub fn min(self, field: &str, alias: Option<&str>) -> Self {
        self.aggregate("MIN", field, alias)
    }

    /// Add `COUNT(field) AS alias` to the projection.
    pub fn count(self, field: &str, alias: Option<&str>) -> Self {
        self.aggregate("COUNT", field, alias)
    }

    /// Add `SUM(field) AS alias` to the projection.
    pub fn sum(self, field: &str, alias: Option<&str>) -> Self {
        self.aggregate("SUM", field, alias)
    }

    /// Add `AVG(field) AS alias` to the projection.
    pub fn avg(self, field: &str, alias: Option<&str>) -> Self {
        self.aggregate("AVG", field, alias)
    }

    /// Add the dialect's string-joining aggregate to the projection:
    /// `GROUP_CONCAT(field)` on MySQL, `STRING_AGG(field, ',')` on PgSQL.
    pub fn group_concat(mut self, field: &str, alias: Option<&str>) -> Self {
        let alias = alias.unwrap_or(field);
        let call = self.dialect.group_concat(field);
        self.select.push(format!("{call} AS {alias}"));
        self
    }

    /// Record an INSERT of the given column/value pairs, binding every
    /// column. Replaces any previously recorded insert.
    pub fn insert<I, S, V>(self, data: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        self.push_insert(data, false)
    }

    /// Duplicate-tolerant insert: `INSERT IGNORE INTO …` on MySQL,
    /// `INSERT INTO … ON CONFLICT DO NOTHING` on PgSQL.
    pub fn insert_ignore<I, S, V>(self, data: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        self.push_insert(data, true)
    }

    /// Record an UPDATE of the given SET pairs. A column already bound
    /// earlier in this builder's lifetime gets a fresh placeholder, so the
    /// prior bind survives untouched.
    pub fn update<I, S, V>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let sets = data
            .into_iter()
            .map(|(column, value)| {
                let column = column.into();
                let placeholder = self.bindings.bind(&column, value.into());
                SetClause {
                    column,
                    placeholder,
                }
            })
            .collect();
        self.update = Some(sets);
        self
    }

    /// Record a DELETE against the base table.
    pub fn delete(mut self) -> Self {
        self.delete = true;
        self
    }

    /// The bind registry accumulated so far. Stays readable after
    /// `compile()`.
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Take the registry out, leaving a fresh one (allocator rewound).
    pub fn take_bindings(&mut self) -> Bindings {
        std::mem::take(&mut self.bindings)
    }

    /// Structural checks ahead of execution: an INSERT without columns or
    /// an UPDATE without SET assignments would compile to broken SQL.
    pub fn validate(&self) -> Result<()> {
        if !self.select.is_empty() {
            return Ok(());
        }
        if let Some(insert) = &self.insert {
            if insert.columns.is_empty() {
                return Err(DbError::validation("INSERT requires at least one column"));
            }
            return Ok(());
        }
        if let Some(sets) = &self.update {
            if sets.is_empty() {
                return Err(DbError::validation(
                    "UPDATE requires at least one SET assignment",
                ));
            }
        }
        Ok(())
    }

    /// Serialize the populated statement and reset all clause state.
    ///
    /// The statement kind is chosen by priority
    /// select > insert > update > delete; with nothing populated the result
    /// is the empty string — which is also what a second `compile()` with
    /// no intervening clause calls returns. The bind registry is left in
    /// place for the caller; see [`take_bindings`](Self::take_bindings) and
    /// [`reset_query`](Self::reset_query).
    pub fn compile(&mut self) -> String {
        let sql = self.render();
        self.reset_clauses();
        sql
    }

    /// Serialize without resetting.
    pub fn to_sql(&self) -> String {
        self.render()
    }

    /// Clear clause state, the bind registry, and the allocator.
    pub fn reset_query(&mut self) {
        self.reset_clauses();
        self.bindings.clear();
    }

    fn reset_clauses(&mut self) {
        self.select.clear();
        self.distinct = false;
        self.from = None;
        self.joins.clear();
        self.wheres.clear();
        self.where_ins.clear();
        self.group_by = None;
        self.order_by = None;
        self.limit = None;
        self.offset = None;
        self.insert = None;
        self.update = None;
        self.delete = false;
    }

    fn push_where(
        mut self,
        connector: Connector,
        column: &str,
        value: Value,
        operator: &str,
    ) -> Self {
        // Swapped call convention: the value slot holds an operator token.
        let swapped = value
            .as_text()
            .filter(|token| operator::is_operator(token))
            .map(operator::normalize);
        let (op, value) = match swapped {
            Some(op) => (op, Value::from(operator)),
            None => (operator::normalize(operator), value),
        };
        let predicate = if operator::embeds_raw_operand(&op) {
            Predicate::RawOperand {
                column: column.to_string(),
                op,
                operand: value.to_string(),
            }
        } else {
            let placeholder = self.bindings.bind(column, value);
            Predicate::Compare {
                column: column.to_string(),
                op,
                placeholder,
            }
        };
        self.wheres.push((connector, predicate));
        self
    }

    fn push_where_in<I, V>(mut self, column: &str, values: I, negated: bool) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let placeholders = values
            .into_iter()
            .map(|value| self.bindings.bind(column, value.into()))
            .collect();
        self.where_ins.push(Predicate::In {
            column: column.to_string(),
            negated,
            placeholders,
        });
        self
    }

    fn push_insert<I, S, V>(mut self, data: I, ignore: bool) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let mut clause = InsertClause {
            ignore,
            ..InsertClause::default()
        };
        for (column, value) in data {
            let column = column.into();
            let placeholder = self.bindings.bind(&column, value.into());
            clause.columns.push(column);
            clause.placeholders.push(placeholder);
        }
        self.insert = Some(clause);
        self
    }

    fn aggregate(mut self, func: &str, field: &str, alias: Option<&str>) -> Self {
        let alias = alias.unwrap_or(field);
        self.select.push(format!("{func}({field}) AS {alias}"));
        self
    }

    /// The single serializer: walks the populated clause lists in fixed
    /// order and writes the statement once.
    fn render(&self) -> String {
        if !self.select.is_empty() {
            self.render_select()
        } else if let Some(insert) = &self.insert {
            self.render_insert(insert)
        } else if let Some(sets) = &self.update {
            self.render_update(sets)
        } else if self.delete {
            self.render_delete()
        } else {
            String::new()
        }
    }

    fn render_select(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.select.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(self.from.as_deref().unwrap_or(&self.table));
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.render());
        }
        if let Some(where_sql) = render_where(&self.wheres, &self.where_ins, self.dialect) {
            sql.push(' ');
            sql.push_str(&where_sql);
        }
        if let Some(group_by) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }
        if let Some(order_by) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ");
            sql.push_str(&limit.to_string());
        }
        if let Some(offset) = self.offset {
            sql.push_str(" OFFSET ");
            sql.push_str(&offset.to_string());
        }
        sql
    }

    fn render_insert(&self, insert: &InsertClause) -> String {
        let head = if insert.ignore {
            self.dialect.insert_ignore_prefix()
        } else {
            "INSERT INTO"
        };
        let values: Vec<String> = insert
            .placeholders
            .iter()
            .map(|name| format!(":{name}"))
            .collect();
        let mut sql = format!(
            "{head} {} ({}) VALUES ({})",
            self.table,
            insert.columns.join(", "),
            values.join(", ")
        );
        if insert.ignore {
            if let Some(suffix) = self.dialect.insert_ignore_suffix() {
                sql.push_str(suffix);
            }
        }
        sql
    }

    fn render_update(&self, sets: &[SetClause]) -> String {
        let assignments: Vec<String> = sets.iter().map(SetClause::render).collect();
        let mut sql = format!("UPDATE {} SET {}", self.table, assignments.join(", "));
        // The where-in list does not participate in UPDATE.
        if let Some(where_sql) = render_where(&self.wheres, &[], self.dialect) {
            sql.push(' ');
            sql.push_str(&where_sql);
        }
        sql
    }

    fn render_delete(&self) -> String {
        let mut sql = format!("DELETE FROM {}", self.table);
        // WHERE-IN wins over WHERE when both are populated.
        let where_sql = if self.where_ins.is_empty() {
            render_where(&self.wheres, &[], self.dialect)
        } else {
            render_where(&[], &self.where_ins, self.dialect)
        };
        if let Some(where_sql) = where_sql {
            sql.push(' ');
            sql.push_str(&where_sql);
        }
        sql
    }
}
