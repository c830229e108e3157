use crate::error::{GramError, Result};
use log::{debug, warn};
use std::collections::HashSet;
use std::io::Read;

/// Largest integer an f64 holds exactly (2^53)
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A single cell of a record
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Parsed number alongside the text it was read from
    Number(f64, String),
    Text(String),
    Missing,
}

impl Value {
    /// Parse a raw cell: numbers first, empty cells are missing, anything else is text
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(n) => Value::Number(n, trimmed.to_string()),
            Err(_) => Value::Text(trimmed.to_string()),
        }
    }

    /// Label used when this value is treated as a category
    pub fn category_label(&self) -> String {
        match self {
            // Beyond 2^53 the f64 no longer identifies the value, so keep the source text
            Value::Number(n, _) if n.is_finite() && n.abs() < MAX_EXACT_INTEGER => n.to_string(),
            Value::Number(_, raw) => raw.clone(),
            Value::Text(s) => s.clone(),
            Value::Missing => "NA".to_string(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n, _) => Some(*n),
            _ => None,
        }
    }
}

/// An immutable row of attribute values, positionally matching the dataset headers
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Ordered records sharing one attribute schema
#[derive(Debug, Clone)]
pub struct Dataset {
    headers: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, records: Vec<Record>) -> Result<Self> {
        let mut seen = HashSet::new();
        for h in &headers {
            if !seen.insert(h.to_lowercase()) {
                return Err(GramError::Data(format!("Duplicate attribute '{}'", h)));
            }
        }

        for (i, record) in records.iter().enumerate() {
            if record.values.len() != headers.len() {
                return Err(GramError::Data(format!(
                    "Record {} has {} values but the schema has {} attributes",
                    i + 1,
                    record.values.len(),
                    headers.len()
                )));
            }
        }

        Ok(Self { headers, records })
    }

    /// Build a dataset from raw string rows (every cell goes through `Value::parse`)
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let records = rows
            .into_iter()
            .map(|row| Record::new(row.iter().map(|s| Value::parse(s)).collect()))
            .collect();
        Self::new(headers, records)
    }

    /// Read a CSV document with a header row
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        debug!("Loaded CSV with {} attributes and {} records", headers.len(), rows.len());
        Self::from_rows(headers, rows)
    }

    /// Create a dataset from a JSON array of objects
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| GramError::Data("Input data must be a JSON array of objects".into()))?;

        let first_obj = match array.first() {
            Some(first) => first
                .as_object()
                .ok_or_else(|| GramError::Data("Items in array must be objects".into()))?,
            None => return Self::new(Vec::new(), Vec::new()),
        };

        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let schema: HashSet<&str> = headers.iter().map(|h| h.as_str()).collect();
        let mut ignored_fields = 0;

        let mut records = Vec::with_capacity(array.len());
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| GramError::Data("Items in array must be objects".into()))?;

            let extra: Vec<&String> = obj.keys().filter(|k| !schema.contains(k.as_str())).collect();
            if !extra.is_empty() {
                warn!("Ignoring fields {:?} missing from the first record's schema", extra);
                ignored_fields += extra.len();
            }

            let mut values = Vec::with_capacity(headers.len());
            for header in &headers {
                let value = match obj.get(header) {
                    Some(serde_json::Value::String(s)) => Value::parse(s),
                    Some(serde_json::Value::Number(n)) => match n.as_f64() {
                        Some(f) => Value::Number(f, n.to_string()),
                        None => Value::Text(n.to_string()),
                    },
                    Some(serde_json::Value::Bool(b)) => Value::Text(b.to_string()),
                    Some(serde_json::Value::Null) | None => Value::Missing,
                    _ => {
                        return Err(GramError::Data(format!(
                            "Unsupported value type for field '{}'",
                            header
                        )))
                    }
                };
                values.push(value);
            }
            records.push(Record::new(values));
        }

        debug!(
            "Loaded JSON with {} attributes and {} records ({} fields ignored)",
            headers.len(),
            records.len(),
            ignored_fields
        );
        Self::new(headers, records)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Case-insensitive attribute lookup
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    /// Iterate the values of one attribute in record order
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.records.iter().filter_map(move |r| r.get(idx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_parse() {
        assert_eq!(Value::parse("4"), Value::Number(4.0, "4".to_string()));
        assert_eq!(Value::parse(" manual "), Value::Text("manual".to_string()));
        assert_eq!(Value::parse(""), Value::Missing);
    }

    #[test]
    fn test_category_label() {
        assert_eq!(Value::parse("6").category_label(), "6");
        assert_eq!(Value::parse("6.0").category_label(), "6");
        assert_eq!(Value::parse("2.5").category_label(), "2.5");
        assert_eq!(Value::Text("auto".into()).category_label(), "auto");
        assert_eq!(Value::Missing.category_label(), "NA");
    }

    #[test]
    fn test_category_label_large_integers() {
        let a = Value::parse("100000000000000000000");
        let b = Value::parse("200000000000000000000");
        assert_eq!(a.category_label(), "100000000000000000000");
        assert_eq!(b.category_label(), "200000000000000000000");

        // Adjacent integers past 2^53 share an f64 but stay distinct
        let c = Value::parse("9007199254740993");
        assert_eq!(c.category_label(), "9007199254740993");
        assert_ne!(c.category_label(), Value::parse("9007199254740992").category_label());
    }

    #[test]
    fn test_from_csv() {
        let csv = "cyl,am\n4,1\n6,0\n8,\n";
        let ds = Dataset::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(ds.headers(), &["cyl".to_string(), "am".to_string()]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.records()[2].get(1), Some(&Value::Missing));
    }

    #[test]
    fn test_from_csv_ragged_row() {
        let csv = "cyl,am\n4,1,extra\n";
        assert!(Dataset::from_csv_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!([
            {"cyl": 4, "trans": "manual"},
            {"cyl": 8, "trans": null},
        ]);
        let ds = Dataset::from_json(&json).unwrap();
        assert_eq!(ds.len(), 2);
        let idx = ds.column_index("trans").unwrap();
        assert_eq!(ds.records()[1].get(idx), Some(&Value::Missing));
    }

    #[test]
    fn test_from_json_schema_from_first_object() {
        let json = serde_json::json!([
            {"cyl": 4},
            {"cyl": 6, "gear": 3},
        ]);
        let ds = Dataset::from_json(&json).unwrap();
        assert_eq!(ds.headers(), &["cyl".to_string()]);
        assert_eq!(ds.records()[1].values().len(), 1);
    }

    #[test]
    fn test_from_json_not_array() {
        let json = serde_json::json!({"cyl": 4});
        assert!(Dataset::from_json(&json).is_err());
    }

    #[test]
    fn test_column_lookup_case_insensitive() {
        let ds = Dataset::from_rows(
            vec!["Cyl".to_string()],
            vec![vec!["4".to_string()], vec!["6".to_string()]],
        )
        .unwrap();
        assert_eq!(ds.column_index("cyl"), Some(0));
        let values: Vec<f64> = ds.column("CYL").unwrap().filter_map(|v| v.as_f64()).collect();
        assert_eq!(values, vec![4.0, 6.0]);
        assert!(ds.column("gear").is_none());
    }

    #[test]
    fn test_duplicate_headers_rejected() {
        let res = Dataset::from_rows(vec!["a".to_string(), "A".to_string()], vec![]);
        assert!(res.is_err());
    }
}
