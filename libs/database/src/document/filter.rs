//! Evaluation of MongoDB-style filters, updates and sorts against in-memory documents.
//!
//! Only top-level fields are addressed; dotted paths are compared literally.

use std::cmp::Ordering;

use mongodb::bson::{Bson, Document};
use regex::RegexBuilder;

use crate::common::{DatabaseError, DatabaseResult};

pub(crate) fn matches(document: &Document, filter: &Document) -> DatabaseResult<bool> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "$or" => {
                let mut any = false;
                for clause in clauses(key, condition)? {
                    if matches(document, clause)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            "$and" => {
                let mut all = true;
                for clause in clauses(key, condition)? {
                    if !matches(document, clause)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            op if op.starts_with('$') => {
                return Err(DatabaseError::Unsupported(format!("filter operator {op}")));
            }
            field => field_matches(document.get(field), condition)?,
        };

        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses<'a>(operator: &str, condition: &'a Bson) -> DatabaseResult<Vec<&'a Document>> {
    let Bson::Array(items) = condition else {
        return Err(DatabaseError::Unsupported(format!(
            "{operator} expects an array of filters"
        )));
    };

    items
        .iter()
        .map(|item| match item {
            Bson::Document(clause) => Ok(clause),
            other => Err(DatabaseError::Unsupported(format!(
                "{operator} clause must be a document, got {other}"
            ))),
        })
        .collect()
}

fn is_operator_document(condition: &Document) -> bool {
    !condition.is_empty() && condition.keys().all(|k| k.starts_with('$'))
}

fn field_matches(value: Option<&Bson>, condition: &Bson) -> DatabaseResult<bool> {
    let ops = match condition {
        Bson::Document(ops) if is_operator_document(ops) => ops,
        _ => return Ok(equals(value, condition)),
    };

    let options = ops.get_str("$options").unwrap_or("");

    for (op, operand) in ops {
        let ok = match op.as_str() {
            "$eq" => equals(value, operand),
            "$ne" => !equals(value, operand),
            "$gt" => compare(value, operand) == Some(Ordering::Greater),
            "$gte" => matches!(
                compare(value, operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            "$lt" => compare(value, operand) == Some(Ordering::Less),
            "$lte" => matches!(
                compare(value, operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            "$in" => match operand {
                Bson::Array(candidates) => candidates.iter().any(|c| equals(value, c)),
                _ => {
                    return Err(DatabaseError::Unsupported("$in expects an array".into()));
                }
            },
            "$exists" => value.is_some() == operand.as_bool().unwrap_or(true),
            "$regex" => regex_matches(value, operand, options)?,
            "$options" => true,
            other => {
                return Err(DatabaseError::Unsupported(format!("field operator {other}")));
            }
        };

        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

/// MongoDB equality: `null` matches missing fields, arrays match any element,
/// numbers compare by value across widths.
fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match (value, expected) {
        (None, Bson::Null) | (Some(Bson::Null), Bson::Null) => true,
        (None, _) => false,
        (Some(Bson::Array(items)), expected) if !matches!(expected, Bson::Array(_)) => {
            items.iter().any(|item| scalar_equals(item, expected))
        }
        (Some(actual), expected) => scalar_equals(actual, expected),
    }
}

fn scalar_equals(actual: &Bson, expected: &Bson) -> bool {
    match (as_number(actual), as_number(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

/// Ordering between two values of comparable types, `None` otherwise
fn compare(value: Option<&Bson>, operand: &Bson) -> Option<Ordering> {
    let value = value?;
    if let (Some(a), Some(b)) = (as_number(value), as_number(operand)) {
        return a.partial_cmp(&b);
    }
    match (value, operand) {
        (Bson::String(a), Bson::String(b)) => Some(a.cmp(b)),
        (Bson::DateTime(a), Bson::DateTime(b)) => Some(a.cmp(b)),
        (Bson::Boolean(a), Bson::Boolean(b)) => Some(a.cmp(b)),
        (Bson::ObjectId(a), Bson::ObjectId(b)) => Some(a.bytes().cmp(&b.bytes())),
        _ => None,
    }
}

fn regex_matches(value: Option<&Bson>, pattern: &Bson, options: &str) -> DatabaseResult<bool> {
    let (pattern, options) = match pattern {
        Bson::String(p) => (p.as_str(), options),
        Bson::RegularExpression(r) => (r.pattern.as_str(), r.options.as_str()),
        other => {
            return Err(DatabaseError::Unsupported(format!(
                "$regex expects a string, got {other}"
            )));
        }
    };

    let regex = RegexBuilder::new(pattern)
        .case_insensitive(options.contains('i'))
        .multi_line(options.contains('m'))
        .build()
        .map_err(|e| DatabaseError::Unsupported(format!("invalid $regex: {e}")))?;

    Ok(match value {
        Some(Bson::String(s)) => regex.is_match(s),
        Some(Bson::Array(items)) => items
            .iter()
            .any(|item| matches!(item, Bson::String(s) if regex.is_match(s))),
        _ => false,
    })
}

/// Apply a `$set` / `$unset` update in place
pub(crate) fn apply_update(document: &mut Document, update: &Document) -> DatabaseResult<()> {
    if !is_operator_document(update) {
        return Err(DatabaseError::Unsupported(
            "updates must use operators such as $set".into(),
        ));
    }

    for (op, fields) in update {
        let Bson::Document(fields) = fields else {
            return Err(DatabaseError::Unsupported(format!(
                "{op} expects a document"
            )));
        };
        if fields.contains_key("_id") {
            return Err(DatabaseError::Unsupported("_id is immutable".into()));
        }

        match op.as_str() {
            "$set" => {
                for (field, value) in fields {
                    document.insert(field.clone(), value.clone());
                }
            }
            "$unset" => {
                for field in fields.keys() {
                    document.remove(field);
                }
            }
            other => {
                return Err(DatabaseError::Unsupported(format!("update operator {other}")));
            }
        }
    }
    Ok(())
}

/// Sort documents by a MongoDB sort specification (`1` ascending, `-1` descending)
pub(crate) fn sort_documents(documents: &mut [Document], sort: &Document) {
    documents.sort_by(|a, b| {
        for (field, direction) in sort {
            let ordering = sort_order(a.get(field), b.get(field));
            let ordering = if is_descending(direction) {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn is_descending(direction: &Bson) -> bool {
    as_number(direction).is_some_and(|d| d < 0.0)
}

/// Total order used for sorting: missing/null < numbers < strings < everything else
fn sort_order(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    fn rank(value: Option<&Bson>) -> u8 {
        match value {
            None | Some(Bson::Null) => 0,
            Some(Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) => 1,
            Some(Bson::String(_)) => 2,
            Some(Bson::ObjectId(_)) => 3,
            Some(Bson::Boolean(_)) => 4,
            Some(Bson::DateTime(_)) => 5,
            Some(_) => 6,
        }
    }

    rank(a)
        .cmp(&rank(b))
        .then_with(|| match (a, b) {
            (Some(a), Some(b)) => compare(Some(a), b).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        })
}
