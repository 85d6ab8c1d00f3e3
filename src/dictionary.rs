//! Data dictionary: built-in descriptions of the beverage columns merged with the loaded schema.

use crate::dataset::{ColumnKind, TableSchema};

/// (column, declared type, description)
const KNOWN_COLUMNS: &[(&str, &str, &str)] = &[
    (
        "Beverage_category",
        "Object",
        "Type of beverage (e.g., coffee, tea, smoothie).",
    ),
    (
        "Beverage",
        "Object",
        "Name of the drink (e.g., Caramel Macchiato, Green Tea Latte).",
    ),
    (
        "Beverage_prep",
        "Object",
        "Preparation method (e.g., hot, cold, toppings).",
    ),
    ("Calories", "Int", "Total calories in the beverage."),
    ("Total Fat (g)", "Float", "Total fat content in grams."),
    ("Trans Fat (g)", "Float", "Trans fat content in grams."),
    ("Saturated Fat (g)", "Float", "Saturated fat content in grams."),
    ("Sodium (mg)", "Int", "Sodium content in milligrams."),
    (
        "Total Carbohydrates (g)",
        "Float",
        "Total carbohydrates, including sugars, in grams.",
    ),
    ("Cholesterol (mg)", "Int", "Cholesterol content in milligrams."),
    ("Dietary Fibre (g)", "Float", "Dietary fiber content in grams."),
    ("Sugars (g)", "Float", "Sugar content in grams."),
    ("Protein (g)", "Float", "Protein content in grams."),
    ("Vitamin A (% DV)", "Float", "% Daily Value of Vitamin A."),
    ("Vitamin C (% DV)", "Float", "% Daily Value of Vitamin C."),
    ("Calcium (% DV)", "Float", "% Daily Value of Calcium."),
    ("Iron (% DV)", "Float", "% Daily Value of Iron."),
    ("Caffeine (mg)", "Int", "Caffeine content in milligrams."),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub column: String,
    /// Declared type for known columns, otherwise the loaded kind.
    pub type_label: String,
    pub description: String,
    pub kind: ColumnKind,
}

/// One entry per loaded column, in table order.
pub fn entries(schema: &TableSchema) -> Vec<DictionaryEntry> {
    schema
        .columns()
        .iter()
        .map(|c| match lookup(&c.name) {
            Some((type_label, description)) => DictionaryEntry {
                column: c.name.clone(),
                type_label: type_label.to_string(),
                description: description.to_string(),
                kind: c.kind,
            },
            None => DictionaryEntry {
                column: c.name.clone(),
                type_label: c.dtype.clone(),
                description: match c.kind {
                    ColumnKind::Numeric => "Numeric measurement.".to_string(),
                    ColumnKind::Categorical => "Categorical label.".to_string(),
                },
                kind: c.kind,
            },
        })
        .collect()
}

/// Built-in (type, description) for a column; names compare case-insensitively.
pub fn lookup(column: &str) -> Option<(&'static str, &'static str)> {
    let column = column.trim();
    KNOWN_COLUMNS
        .iter()
        .find(|(name, _, _)| name.eq_ignore_ascii_case(column))
        .map(|(_, type_label, description)| (*type_label, *description))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnInfo;

    #[test]
    fn known_and_unknown_columns() {
        let schema = TableSchema::new(vec![
            ColumnInfo {
                name: "Calories".to_string(),
                kind: ColumnKind::Numeric,
                dtype: "i64".to_string(),
            },
            ColumnInfo {
                name: "Size".to_string(),
                kind: ColumnKind::Categorical,
                dtype: "str".to_string(),
            },
        ]);
        let entries = entries(&schema);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].type_label, "Int");
        assert_eq!(entries[0].description, "Total calories in the beverage.");
        assert_eq!(entries[1].type_label, "str");
        assert_eq!(entries[1].description, "Categorical label.");
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(
            lookup("sugars (g)"),
            Some(("Float", "Sugar content in grams."))
        );
        assert!(lookup("Size").is_none());
    }
}
