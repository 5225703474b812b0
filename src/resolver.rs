//! Turns a template plus caller bindings into the ordered values sent to the backend.

use std::collections::HashMap;

use crate::error::SqlParamsError;
use crate::template::{PlaceholderMode, QueryTemplate, Slot};
use crate::types::Value;

/// Caller-supplied values for a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Values for `?` placeholders, in order.
    Positional(Vec<Value>),
    /// Values for `:label` placeholders. Extra labels are ignored.
    Named(HashMap<String, Value>),
}

impl Binding {
    /// A binding with no values, accepted by any template without placeholders.
    #[must_use]
    pub fn empty() -> Self {
        Binding::Positional(Vec::new())
    }

    /// Build a named binding from `(label, value)` pairs.
    ///
    /// ```rust
    /// use sql_params::prelude::*;
    ///
    /// let binding = Binding::named([("one", Value::from("qiwi")), ("two", Value::Int(3))]);
    /// # let _ = binding;
    /// ```
    pub fn named<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Binding::Named(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    #[must_use]
    pub fn mode(&self) -> PlaceholderMode {
        match self {
            Binding::Positional(_) => PlaceholderMode::Positional,
            Binding::Named(_) => PlaceholderMode::Named,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Binding::Positional(values) => values.is_empty(),
            Binding::Named(map) => map.is_empty(),
        }
    }
}

impl From<Vec<Value>> for Binding {
    fn from(values: Vec<Value>) -> Self {
        Binding::Positional(values)
    }
}

impl From<HashMap<String, Value>> for Binding {
    fn from(map: HashMap<String, Value>) -> Self {
        Binding::Named(map)
    }
}

/// Produce the values for every slot of `template`, in slot order.
///
/// # Errors
///
/// - `ArityMismatch` when a positional binding has the wrong length, or an
///   empty named binding meets `?` placeholders.
/// - `UnboundParameter` when a named label has no entry (a `Null` entry is fine).
/// - `BindingModeMismatch` when the binding kind does not fit the template.
pub fn resolve(template: &QueryTemplate, binding: &Binding) -> Result<Vec<Value>, SqlParamsError> {
    match (template.mode(), binding) {
        (PlaceholderMode::None, Binding::Positional(values)) if !values.is_empty() => {
            return Err(SqlParamsError::ArityMismatch {
                expected: 0,
                actual: values.len(),
            });
        }
        (PlaceholderMode::None, _) => {}
        (PlaceholderMode::Positional, Binding::Positional(values)) => {
            if values.len() != template.positional_count() {
                return Err(SqlParamsError::ArityMismatch {
                    expected: template.positional_count(),
                    actual: values.len(),
                });
            }
        }
        (PlaceholderMode::Positional, Binding::Named(_)) if binding.is_empty() => {
            return Err(SqlParamsError::ArityMismatch {
                expected: template.positional_count(),
                actual: 0,
            });
        }
        (PlaceholderMode::Named, Binding::Named(_)) => {}
        (PlaceholderMode::Named, Binding::Positional(_)) if binding.is_empty() => {
            if let Some(label) = template.named_labels().into_iter().next() {
                return Err(SqlParamsError::UnboundParameter(label.to_owned()));
            }
        }
        (mode, _) => {
            return Err(SqlParamsError::BindingModeMismatch {
                template: mode,
                binding: binding.mode(),
            });
        }
    }

    let mut out = Vec::with_capacity(template.slot_count());
    for slot in template.slots() {
        let value = match (slot, binding) {
            (Slot::Literal(value), _) => value.clone(),
            (Slot::Positional(idx), Binding::Positional(values)) => values[*idx].clone(),
            (Slot::Named(label), Binding::Named(map)) => map
                .get(label)
                .cloned()
                .ok_or_else(|| SqlParamsError::UnboundParameter(label.clone()))?,
            // Mode checks above rule these out.
            (Slot::Positional(_), Binding::Named(_)) | (Slot::Named(_), Binding::Positional(_)) => {
                return Err(SqlParamsError::BindingModeMismatch {
                    template: template.mode(),
                    binding: binding.mode(),
                });
            }
        };
        out.push(value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Dialect;

    fn parse(sql: &str) -> QueryTemplate {
        QueryTemplate::parse(sql, Dialect::Sqlite).unwrap()
    }

    #[test]
    fn positional_output_follows_binding_order() {
        let t = parse("insert into t values (?, 10), ('apricot', ?), (?, ?)");
        let values = vec![
            Value::from("apple\u{0FF9D}0FF9D"),
            Value::Int(3),
            Value::from("banana€euro"),
            Value::Int(-8),
        ];
        let out = resolve(&t, &Binding::Positional(values.clone())).unwrap();
        assert_eq!(out, values);
    }

    #[test]
    fn positional_arity_mismatch() {
        let t = parse("update t set a = 'banana', b = ? where a = ?");
        for n in [0, 1, 3] {
            let values = vec![Value::Int(4); n];
            let err = resolve(&t, &Binding::Positional(values)).unwrap_err();
            assert!(matches!(
                err,
                SqlParamsError::ArityMismatch { expected: 2, actual } if actual == n
            ));
        }
    }

    #[test]
    fn named_labels_spread_to_every_occurrence() {
        let t = parse("insert into t values (:one, 1), (:one, 2), (:one, :two)");
        let binding = Binding::named([("one", Value::from("qiwi")), ("two", Value::Int(3))]);
        let out = resolve(&t, &binding).unwrap();
        assert_eq!(
            out,
            vec![
                Value::from("qiwi"),
                Value::from("qiwi"),
                Value::from("qiwi"),
                Value::Int(3)
            ]
        );
    }

    #[test]
    fn unused_named_labels_are_ignored() {
        let t = parse("update t set a = :param, b = 2 where a = 'banana'");
        let binding = Binding::named([("param", Value::from("peach")), ("spare", Value::Int(1))]);
        assert_eq!(resolve(&t, &binding).unwrap(), vec![Value::from("peach")]);
    }

    #[test]
    fn missing_label_is_unbound() {
        let t = parse("select * from t where a = :a and b = :b");
        let binding = Binding::named([("a", Value::Int(1))]);
        let err = resolve(&t, &binding).unwrap_err();
        assert!(matches!(err, SqlParamsError::UnboundParameter(label) if label == "b"));
    }

    #[test]
    fn null_binding_is_not_unbound() {
        let t = parse("select * from t where a != :nil");
        let binding = Binding::named([("nil", Value::Null)]);
        assert_eq!(resolve(&t, &binding).unwrap(), vec![Value::Null]);
    }

    #[test]
    fn empty_named_binding_on_positional_template_is_arity() {
        let t = parse("insert into t values (?, ?)");
        let err = resolve(&t, &Binding::Named(HashMap::new())).unwrap_err();
        assert!(matches!(
            err,
            SqlParamsError::ArityMismatch {
                expected: 2,
                actual: 0
            }
        ));

        let binding = Binding::named([("a", Value::Int(1))]);
        let err = resolve(&t, &binding).unwrap_err();
        assert!(matches!(err, SqlParamsError::BindingModeMismatch { .. }));
    }

    #[test]
    fn empty_template_and_binding() {
        let t = parse("");
        assert!(resolve(&t, &Binding::empty()).unwrap().is_empty());
        assert!(resolve(&t, &Binding::Named(HashMap::new())).unwrap().is_empty());
    }

    #[test]
    fn binding_kind_must_match_template() {
        let t = parse("select * from t where a = ?");
        let err = resolve(&t, &Binding::named([("a", Value::Int(1))])).unwrap_err();
        assert!(matches!(err, SqlParamsError::BindingModeMismatch { .. }));

        let t = parse("select * from t where a = :a");
        let err = resolve(&t, &Binding::Positional(vec![Value::Int(1)])).unwrap_err();
        assert!(matches!(err, SqlParamsError::BindingModeMismatch { .. }));

        let err = resolve(&t, &Binding::empty()).unwrap_err();
        assert!(matches!(err, SqlParamsError::UnboundParameter(label) if label == "a"));
    }

    #[test]
    fn caller_values_are_not_consumed() {
        let t = parse("select ?");
        let binding = Binding::Positional(vec![Value::from("keep")]);
        let _ = resolve(&t, &binding).unwrap();
        assert_eq!(binding, Binding::Positional(vec![Value::from("keep")]));
    }
}
