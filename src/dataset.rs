//! Beverage dataset: load a CSV once, classify every column as numeric or categorical,
//! and expose the typed columns read-only.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::OpenOptions;

/// Semantic type of a column, fixed at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Categorical,
    Numeric,
}

impl ColumnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Categorical => "categorical",
            Self::Numeric => "numeric",
        }
    }

    /// Numeric for integer, float and decimal dtypes; categorical for everything else.
    pub fn from_dtype(dtype: &DataType) -> Self {
        if dtype.is_numeric() {
            Self::Numeric
        } else {
            Self::Categorical
        }
    }
}

/// Column metadata: name, semantic kind, and the dtype polars inferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
    /// Inferred storage type as text (e.g. "i64", "f64", "str").
    pub dtype: String,
}

/// Values of one column after classification. Nulls are kept as `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match self {
            Self::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            Self::Categorical(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }
}

/// Typed schema: ordered column metadata, shared by the selector and the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<ColumnInfo>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.kind)
    }

    /// Column names of the given kind in original table order.
    pub fn columns_by_type(&self, kind: ColumnKind) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

/// Failure to produce a Dataset. Fatal at start-up; there is no fallback dataset.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {} as a table: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("{} contains no columns", path.display())]
    Empty { path: PathBuf },
}

/// Immutable in-memory table. Created once and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    source: Option<PathBuf>,
    schema: TableSchema,
    values: Vec<ColumnValues>,
    height: usize,
}

impl Dataset {
    /// Read a delimited text file with a header row and classify its columns.
    pub fn load(path: &Path, options: &OpenOptions) -> Result<Self, LoadError> {
        let metadata = std::fs::metadata(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if metadata.is_dir() {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "is a directory"),
            });
        }

        let parse_err = |source: PolarsError| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        };

        let delimiter = options.delimiter.unwrap_or(b',');
        let read_options = CsvReadOptions::default()
            .with_has_header(options.has_header.unwrap_or(true))
            .with_infer_schema_length(options.infer_schema_length.or(Some(1000)))
            .map_parse_options(|opts| opts.with_separator(delimiter));
        let df = read_options
            .try_into_reader_with_file_path(Some(path.into()))
            .map_err(parse_err)?
            .finish()
            .map_err(parse_err)?;

        let mut dataset = Self::from_frame(&df).map_err(parse_err)?;
        if dataset.schema.is_empty() {
            return Err(LoadError::Empty {
                path: path.to_path_buf(),
            });
        }
        dataset.source = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            rows = dataset.height,
            columns = dataset.schema.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Classify the columns of an already-parsed frame. Column names are trimmed;
    /// two names that are equal after trimming are rejected.
    pub fn from_frame(df: &DataFrame) -> PolarsResult<Self> {
        let mut columns: Vec<ColumnInfo> = Vec::with_capacity(df.width());
        let mut values = Vec::with_capacity(df.width());

        for (name, dtype) in df.schema().iter() {
            let trimmed = name.trim();
            if columns.iter().any(|c| c.name == trimmed) {
                return Err(PolarsError::Duplicate(
                    format!("column '{}' appears more than once after trimming whitespace", trimmed)
                        .into(),
                ));
            }
            let column = df.column(name.as_str())?;
            let kind = ColumnKind::from_dtype(dtype);
            let data = match kind {
                ColumnKind::Numeric => {
                    let cast = column.cast(&DataType::Float64)?;
                    ColumnValues::Numeric(cast.f64()?.into_iter().collect())
                }
                ColumnKind::Categorical => {
                    let cast = column.cast(&DataType::String)?;
                    ColumnValues::Categorical(
                        cast.str()?
                            .into_iter()
                            .map(|v| v.map(|s| s.trim().to_string()))
                            .collect(),
                    )
                }
            };
            debug!(column = %name, dtype = %dtype, kind = kind.as_str(), "classified column");
            columns.push(ColumnInfo {
                name: trimmed.to_string(),
                kind,
                dtype: dtype.to_string(),
            });
            values.push(data);
        }

        Ok(Self {
            source: None,
            schema: TableSchema::new(columns),
            values,
            height: df.height(),
        })
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        self.schema.columns()
    }

    /// Column names of the given kind in original table order.
    pub fn columns_by_type(&self, kind: ColumnKind) -> Vec<&str> {
        self.schema.columns_by_type(kind)
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.schema.kind_of(name)
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.schema.len())
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn column(&self, name: &str) -> Option<&ColumnValues> {
        self.schema.position(name).map(|i| &self.values[i])
    }

    /// Values of a numeric column; None if the column is missing or categorical.
    pub fn numeric_values(&self, name: &str) -> Option<&[Option<f64>]> {
        match self.column(name)? {
            ColumnValues::Numeric(v) => Some(v.as_slice()),
            ColumnValues::Categorical(_) => None,
        }
    }

    /// Values of a categorical column; None if the column is missing or numeric.
    pub fn categorical_values(&self, name: &str) -> Option<&[Option<String>]> {
        match self.column(name)? {
            ColumnValues::Categorical(v) => Some(v.as_slice()),
            ColumnValues::Numeric(_) => None,
        }
    }

    /// Text of one cell for table display. Nulls render as an empty string.
    pub fn cell_display(&self, row: usize, col: usize) -> String {
        match self.values.get(col) {
            Some(ColumnValues::Numeric(v)) => v
                .get(row)
                .copied()
                .flatten()
                .map(format_number)
                .unwrap_or_default(),
            Some(ColumnValues::Categorical(v)) => {
                v.get(row).cloned().flatten().unwrap_or_default()
            }
            None => String::new(),
        }
    }
}

/// Whole numbers without a fractional part, everything else with up to three decimals.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{:.3}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let df = df!(
            "Beverage_category" => &["Coffee", "Classic Espresso Drinks", "Coffee"],
            "Beverage" => &["Brewed Coffee", "Caffe Latte", "Brewed Coffee"],
            "Calories" => &[3i64, 100, 5],
            "Sugars (g)" => &[0.0f64, 9.0, 0.0]
        )
        .unwrap();
        Dataset::from_frame(&df).unwrap()
    }

    #[test]
    fn every_column_in_exactly_one_partition() {
        let ds = sample();
        let cat = ds.columns_by_type(ColumnKind::Categorical);
        let num = ds.columns_by_type(ColumnKind::Numeric);
        assert_eq!(cat.len() + num.len(), ds.columns().len());
        for c in ds.columns() {
            let in_cat = cat.contains(&c.name.as_str());
            let in_num = num.contains(&c.name.as_str());
            assert!(in_cat ^ in_num, "{} must be in exactly one partition", c.name);
        }
    }

    #[test]
    fn columns_by_type_preserves_table_order() {
        let ds = sample();
        assert_eq!(
            ds.columns_by_type(ColumnKind::Categorical),
            vec!["Beverage_category", "Beverage"]
        );
        assert_eq!(
            ds.columns_by_type(ColumnKind::Numeric),
            vec!["Calories", "Sugars (g)"]
        );
        assert_eq!(
            ds.columns_by_type(ColumnKind::Numeric),
            ds.columns_by_type(ColumnKind::Numeric)
        );
    }

    #[test]
    fn integer_columns_are_numeric() {
        let ds = sample();
        assert_eq!(ds.kind_of("Calories"), Some(ColumnKind::Numeric));
        assert_eq!(
            ds.numeric_values("Calories").unwrap(),
            &[Some(3.0), Some(100.0), Some(5.0)]
        );
        assert!(ds.categorical_values("Calories").is_none());
    }

    #[test]
    fn shape_and_cells() {
        let ds = sample();
        assert_eq!(ds.shape(), (3, 4));
        assert_eq!(ds.cell_display(1, 1), "Caffe Latte");
        assert_eq!(ds.cell_display(1, 2), "100");
        assert_eq!(ds.cell_display(9, 2), "");
        assert_eq!(ds.cell_display(0, 9), "");
    }

    #[test]
    fn nulls_are_kept() {
        let df = df!(
            "Calories" => &[Some(1i64), None, Some(3)],
            "Beverage" => &[Some("a"), Some("b"), None]
        )
        .unwrap();
        let ds = Dataset::from_frame(&df).unwrap();
        assert_eq!(ds.column("Calories").unwrap().null_count(), 1);
        assert_eq!(ds.column("Beverage").unwrap().null_count(), 1);
        assert_eq!(ds.cell_display(2, 1), "");
    }

    #[test]
    fn names_equal_after_trimming_are_rejected() {
        let df = df!(
            "Calories" => &[1i64, 2],
            " Calories" => &[3i64, 4]
        )
        .unwrap();
        let err = Dataset::from_frame(&df).unwrap_err();
        assert!(matches!(err, PolarsError::Duplicate(_)));
        assert!(err.to_string().contains("Calories"));
    }

    #[test]
    fn format_number_trims_trailing_zeros() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(2.125), "2.125");
        assert_eq!(format_number(-4.5), "-4.5");
    }
}
