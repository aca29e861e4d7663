use std::collections::HashMap;
use std::sync::Arc;

/// A decoded column value.
///
/// Results are dynamically shaped: the driver decodes every column into JSON
/// values, applying any installed type parsers along the way.
pub type Value = serde_json::Value;

/// A single column of a result's row description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// The backend's numeric identifier (OID) for the column's data type.
    pub data_type_id: u32,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type_id: u32) -> Self {
        Self { name: name.into(), data_type_id }
    }
}

/// The ordered row description shared by every row of one result.
///
/// Column order is authoritative: "first column" always means the first
/// entry here, never an arbitrary map iteration order.
#[derive(Debug, Default)]
pub struct Fields {
    fields: Vec<Field>,
    // name -> positional index; on duplicate names the later column wins
    names: HashMap<String, usize>,
}

impl Fields {
    pub fn new(fields: Vec<Field>) -> Self {
        let names = fields
            .iter()
            .enumerate()
            .map(|(index, field)| (field.name.clone(), index))
            .collect();

        Self { fields, names }
    }

    pub fn as_slice(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn first(&self) -> Option<&Field> {
        self.fields.first()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }
}

/// One result row: decoded values plus the shared row description.
///
/// Values are stored in field order, so positional access lines up with
/// [`Fields`] and by-name access goes through the description's index.
#[derive(Debug, Clone)]
pub struct Row {
    fields: Arc<Fields>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(fields: Arc<Fields>, values: Vec<Value>) -> Self {
        debug_assert_eq!(fields.len(), values.len());

        Self { fields, values }
    }

    pub fn fields(&self) -> &[Field] {
        self.fields.as_slice()
    }

    /// Number of columns in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.position(name).and_then(|index| self.values.get(index))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The value of the first column, by field order.
    pub fn first_value(&self) -> Option<&Value> {
        self.values.first()
    }

    /// Consumes the row, returning the first column's value.
    pub fn into_first_value(mut self) -> Option<Value> {
        if self.values.is_empty() {
            return None;
        }

        Some(self.values.swap_remove(0))
    }

    /// Converts the row into a name-keyed JSON object.
    pub fn into_map(self) -> serde_json::Map<String, Value> {
        self.fields
            .iter()
            .zip(self.values)
            .map(|(field, value)| (field.name.clone(), value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(names: &[&str]) -> Arc<Fields> {
        Arc::new(Fields::new(names.iter().map(|name| Field::new(*name, 25)).collect()))
    }

    #[test]
    fn by_name_access_uses_the_description_index() {
        let row = Row::new(fields(&["id", "name"]), vec![json!(1), json!("ada")]);

        assert_eq!(row.get("id"), Some(&json!(1)));
        assert_eq!(row.get("name"), Some(&json!("ada")));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn first_value_follows_field_order_not_name_order() {
        // "zulu" sorts after "alpha"; field order must still win
        let row = Row::new(fields(&["zulu", "alpha"]), vec![json!(1), json!(2)]);

        assert_eq!(row.first_value(), Some(&json!(1)));
        assert_eq!(row.into_first_value(), Some(json!(1)));
    }

    #[test]
    fn into_map_preserves_all_columns() {
        let row = Row::new(fields(&["a", "b"]), vec![json!(true), json!(null)]);
        let map = row.into_map();

        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], json!(true));
        assert_eq!(map["b"], json!(null));
    }
}
