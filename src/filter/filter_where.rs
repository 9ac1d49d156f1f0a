use serde_json::Value;

use super::error::FilterError;
use super::types::FilterOp;

/// Compiles a JSON where-object into a parameterised SQL predicate.
///
/// Keys are either column names (`{"level": "S1"}` or
/// `{"title": {"$ilike": "%x%"}}`) or the logical operators `$and`/`$or`
/// holding an array of nested where-objects. Placeholders are numbered in
/// the order parameters are pushed, starting after `starting_param_index`.
pub struct FilterWhere {
    params: Vec<Value>,
    param_offset: usize,
}

impl FilterWhere {
    pub fn generate(where_data: &Value, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self { params: vec![], param_offset: starting_param_index };
        let clause = filter_where.clause(where_data)?;
        Ok((clause, filter_where.params))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn clause(&mut self, where_data: &Value) -> Result<String, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok("1=1".to_string()),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        };

        let mut parts = Vec::new();
        for (key, value) in obj {
            match key.as_str() {
                "$and" | "$or" => parts.push(self.logical(key, value)?),
                op if op.starts_with('$') => return Err(FilterError::UnsupportedOperator(op.to_string())),
                column => parts.extend(self.field(column, value)?),
            }
        }

        if parts.is_empty() {
            Ok("1=1".to_string())
        } else {
            Ok(parts.join(" AND "))
        }
    }

    fn logical(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        let branches = value
            .as_array()
            .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
        if branches.is_empty() {
            // Empty conjunction is true, empty disjunction is false
            return Ok(if op == "$and" { "1=1" } else { "1=0" }.to_string());
        }

        let mut sql_parts = Vec::with_capacity(branches.len());
        for branch in branches {
            sql_parts.push(format!("({})", self.clause(branch)?));
        }
        let joiner = if op == "$and" { " AND " } else { " OR " };
        Ok(format!("({})", sql_parts.join(joiner)))
    }

    fn field(&mut self, column: &str, value: &Value) -> Result<Vec<String>, FilterError> {
        validate_column(column)?;
        let quoted = format!("\"{}\"", column);

        let Value::Object(ops) = value else {
            return Ok(vec![self.condition(&quoted, FilterOp::Eq, value)?]);
        };

        let mut out = Vec::with_capacity(ops.len());
        for (op_key, op_val) in ops {
            let op = FilterOp::parse(op_key).ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
            out.push(self.condition(&quoted, op, op_val)?);
        }
        Ok(out)
    }

    fn condition(&mut self, quoted: &str, op: FilterOp, data: &Value) -> Result<String, FilterError> {
        Ok(match op {
            FilterOp::Eq if data.is_null() => format!("{} IS NULL", quoted),
            FilterOp::Eq => format!("{} = {}", quoted, self.param(data)),
            FilterOp::ILike => match data {
                Value::String(_) => format!("{} ILIKE {}", quoted, self.param(data)),
                _ => return Err(FilterError::InvalidOperatorData("$ilike requires a string pattern".to_string())),
            },
        })
    }

    fn param(&mut self, value: &Value) -> String {
        self.params.push(value.clone());
        format!("${}", self.param_offset + self.params.len())
    }
}

pub(crate) fn validate_column(column: &str) -> Result<(), FilterError> {
    let mut chars = column.chars();
    let valid = match chars.next() {
        Some(first) => (first.is_ascii_alphabetic() || first == '_') && chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_equality_and_null() {
        let (sql, params) = FilterWhere::generate(&json!({ "level": "S1", "subject": null }), 0).unwrap();
        assert_eq!(sql, "\"level\" = $1 AND \"subject\" IS NULL");
        assert_eq!(params, vec![json!("S1")]);
    }

    #[test]
    fn or_branches_number_params_in_order() {
        let where_data = json!({
            "$or": [
                { "title": { "$ilike": "%math%" } },
                { "author": { "$ilike": "%math%" } }
            ],
            "level": "S2"
        });
        let (sql, params) = FilterWhere::generate(&where_data, 0).unwrap();
        assert_eq!(sql, "((\"title\" ILIKE $1) OR (\"author\" ILIKE $2)) AND \"level\" = $3");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn starting_index_offsets_placeholders() {
        let (sql, _) = FilterWhere::generate(&json!({ "title": { "$ilike": "%a%" }, "level": "S1" }), 2).unwrap();
        assert_eq!(sql, "\"title\" ILIKE $3 AND \"level\" = $4");
    }

    #[test]
    fn rejects_bad_columns_and_operators() {
        assert!(FilterWhere::generate(&json!({ "title; DROP": 1 }), 0).is_err());
        assert!(FilterWhere::generate(&json!({ "title": { "$regex": "x" } }), 0).is_err());
        assert!(FilterWhere::generate(&json!({ "id": { "$in": ["a"] } }), 0).is_err());
        assert!(FilterWhere::generate(&json!({ "title": { "$ilike": 3 } }), 0).is_err());
        assert!(FilterWhere::generate(&json!({ "$nor": [] }), 0).is_err());
        assert!(FilterWhere::validate(&json!("raw sql")).is_err());
    }

    #[test]
    fn empty_or_matches_nothing() {
        let (sql, params) = FilterWhere::generate(&json!({ "$or": [] }), 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }
}
