use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// tagged attribute value for the free-form tag stores on nodes and edges.
/// the variants cover everything the exchange formats can round-trip:
/// scalars, homogeneous lists, and arbitrary JSON-serializable objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Num(f64),
    Str(String),
    IntList(Vec<i64>),
    NumList(Vec<f64>),
    StrList(Vec<String>),
    Json(serde_json::Value),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Num(n) => Some(*n),
            AttrValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// appends every numeric value reachable in this attribute, flattening
    /// nested lists and skipping non-finite entries.
    pub fn flatten_numbers_into(&self, out: &mut Vec<f64>) {
        match self {
            AttrValue::Num(n) if n.is_finite() => out.push(*n),
            AttrValue::Int(i) => out.push(*i as f64),
            AttrValue::NumList(ns) => out.extend(ns.iter().copied().filter(|n| n.is_finite())),
            AttrValue::IntList(is) => out.extend(is.iter().map(|i| *i as f64)),
            AttrValue::Json(v) => flatten_json_numbers(v, out),
            _ => {}
        }
    }

    /// combines a sequence of values observed along a merged path: a scalar
    /// when all values agree, otherwise a list in visit order.
    pub fn merged(values: Vec<AttrValue>) -> Option<AttrValue> {
        let mut distinct: Vec<AttrValue> = vec![];
        for v in values.into_iter() {
            if !distinct.contains(&v) {
                distinct.push(v);
            }
        }
        match distinct.len() {
            0 => None,
            1 => distinct.pop(),
            _ => Some(AttrValue::from_list(distinct)),
        }
    }

    /// packs a heterogeneous collection into the narrowest list variant.
    fn from_list(values: Vec<AttrValue>) -> AttrValue {
        if values.iter().all(|v| matches!(v, AttrValue::Str(_))) {
            let ss = values
                .into_iter()
                .filter_map(|v| match v {
                    AttrValue::Str(s) => Some(s),
                    _ => None,
                })
                .collect();
            return AttrValue::StrList(ss);
        }
        if values.iter().all(|v| matches!(v, AttrValue::Int(_))) {
            let is = values
                .into_iter()
                .filter_map(|v| match v {
                    AttrValue::Int(i) => Some(i),
                    _ => None,
                })
                .collect();
            return AttrValue::IntList(is);
        }
        if values
            .iter()
            .all(|v| matches!(v, AttrValue::Num(_) | AttrValue::Int(_)))
        {
            let ns = values.into_iter().filter_map(|v| v.as_f64()).collect();
            return AttrValue::NumList(ns);
        }
        let json = values
            .into_iter()
            .map(|v| serde_json::to_value(v).unwrap_or(serde_json::Value::Null))
            .collect();
        AttrValue::Json(serde_json::Value::Array(json))
    }
}

impl Display for AttrValue {
    /// the wire encoding used by the exchange codec: booleans in python
    /// title case, scalars in their natural form, lists and objects as
    /// compact JSON.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Bool(true) => write!(f, "True"),
            AttrValue::Bool(false) => write!(f, "False"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Num(n) => write!(f, "{n}"),
            AttrValue::Str(s) => write!(f, "{s}"),
            other => {
                let json = serde_json::to_string(other).map_err(|_| std::fmt::Error)?;
                write!(f, "{json}")
            }
        }
    }
}

fn flatten_json_numbers(value: &serde_json::Value, out: &mut Vec<f64>) {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                if f.is_finite() {
                    out.push(f);
                }
            }
        }
        serde_json::Value::Array(vs) => {
            for v in vs.iter() {
                flatten_json_numbers(v, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::AttrValue;

    #[test]
    fn test_merged_unique_scalar() {
        let merged = AttrValue::merged(vec![
            AttrValue::Str(String::from("residential")),
            AttrValue::Str(String::from("residential")),
        ]);
        assert_eq!(merged, Some(AttrValue::Str(String::from("residential"))));
    }

    #[test]
    fn test_merged_distinct_values_in_visit_order() {
        let merged = AttrValue::merged(vec![
            AttrValue::Str(String::from("residential")),
            AttrValue::Str(String::from("tertiary")),
            AttrValue::Str(String::from("residential")),
        ]);
        assert_eq!(
            merged,
            Some(AttrValue::StrList(vec![
                String::from("residential"),
                String::from("tertiary")
            ]))
        );
    }

    #[test]
    fn test_flatten_skips_non_finite() {
        let mut out = vec![];
        AttrValue::NumList(vec![1.0, f64::NAN, 2.5]).flatten_numbers_into(&mut out);
        assert_eq!(out, vec![1.0, 2.5]);
    }

    #[test]
    fn test_wire_encoding_of_booleans() {
        assert_eq!(AttrValue::Bool(true).to_string(), "True");
        assert_eq!(AttrValue::Bool(false).to_string(), "False");
    }
}
