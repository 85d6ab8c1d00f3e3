//! User-facing error message formatting.
//!
//! Matches on typed errors (LoadError, PolarsError variants, io::ErrorKind)
//! rather than parsing strings.

use polars::prelude::PolarsError;
use std::io;

use crate::dataset::LoadError;

/// One-line message for a dataset that could not be loaded.
pub fn user_message_from_load(err: &LoadError) -> String {
    match err {
        LoadError::Io { path, source } => format!(
            "Failed to load {}: {}",
            path.display(),
            user_message_from_io(source, None)
        ),
        LoadError::Parse { path, source } => format!(
            "Failed to load {}: {}",
            path.display(),
            user_message_from_polars(source)
        ),
        LoadError::Empty { path } => format!(
            "Failed to load {}: the file has no columns. Check the delimiter and header settings.",
            path.display()
        ),
    }
}

/// Format a PolarsError as a user-facing message by matching on its variant.
pub fn user_message_from_polars(err: &PolarsError) -> String {
    use polars::prelude::PolarsError as PE;

    match err {
        PE::ColumnNotFound(msg) => format!(
            "Column not found: {}. Check spelling and that the column exists.",
            msg
        ),
        PE::Duplicate(msg) => format!(
            "Duplicate column name: {}. Column names in the header must be unique.",
            msg
        ),
        PE::IO { error, msg } => {
            user_message_from_io(error.as_ref(), msg.as_ref().map(|m| m.as_ref()))
        }
        PE::NoData(msg) => format!("No data: {}", msg),
        PE::SchemaMismatch(msg) => format!("Schema mismatch: {}", msg),
        PE::ShapeMismatch(msg) => format!("Row shape mismatch: {}. Check the delimiter.", msg),
        PE::ComputeError(msg) => format!("Could not parse the file: {}", msg),
        PE::Context { error, msg } => {
            let inner = user_message_from_polars(error);
            format!("{}: {}", msg, inner)
        }
        _ => err.to_string(),
    }
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error, context: Option<&str>) -> String {
    use std::io::ErrorKind;

    let base: String = match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check read access.".to_string(),
        ErrorKind::InvalidData => "Invalid or corrupted data.".to_string(),
        ErrorKind::InvalidInput => {
            let msg = err.to_string();
            if msg.contains("is a directory") {
                "Path is a directory, not a file.".to_string()
            } else {
                "Invalid input.".to_string()
            }
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        ErrorKind::Interrupted => "Operation interrupted.".to_string(),
        ErrorKind::OutOfMemory => "Out of memory.".to_string(),
        ErrorKind::Other => {
            let msg = err.to_string();
            if msg.contains("space left") {
                return "No space left on device. Free up disk space and try again.".to_string();
            }
            return match context {
                Some(_) => format!("I/O error: {}", msg),
                None => msg,
            };
        }
        _ => err.to_string(),
    };

    match context {
        Some(ctx) if !ctx.is_empty() => format!("{} {}", base, ctx),
        _ => base,
    }
}

/// Format a color_eyre Report for the status line: typed causes first, else the first line.
pub fn user_message_from_report(report: &color_eyre::eyre::Report) -> String {
    for cause in report.chain() {
        if let Some(le) = cause.downcast_ref::<LoadError>() {
            return user_message_from_load(le);
        }
        if let Some(pe) = cause.downcast_ref::<PolarsError>() {
            return user_message_from_polars(pe);
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return user_message_from_io(io_err, None);
        }
    }

    // First line of each cause, outermost first.
    let message = report
        .chain()
        .filter_map(|cause| {
            let text = cause.to_string();
            let first = text.lines().next()?.trim().to_string();
            (!first.is_empty()).then_some(first)
        })
        .collect::<Vec<_>>()
        .join(": ");
    if message.is_empty() {
        "An error occurred".to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_user_message_from_io_not_found() {
        let err = io::Error::new(io::ErrorKind::NotFound, "No such file");
        let msg = user_message_from_io(&err, None);
        assert!(
            msg.contains("not found"),
            "expected 'not found', got: {}",
            msg
        );
    }

    #[test]
    fn test_user_message_from_io_permission_denied() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied");
        let msg = user_message_from_io(&err, None);
        assert!(msg.to_lowercase().contains("permission"), "got: {}", msg);
    }

    #[test]
    fn test_user_message_from_load_names_path() {
        let err = LoadError::Io {
            path: PathBuf::from("data/missing.csv"),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file"),
        };
        let msg = user_message_from_load(&err);
        assert!(msg.starts_with("Failed to load data/missing.csv"), "got: {}", msg);
        assert!(msg.contains("not found"), "got: {}", msg);

        let empty = LoadError::Empty {
            path: PathBuf::from("x.csv"),
        };
        assert!(user_message_from_load(&empty).contains("no columns"));
    }

    #[test]
    fn test_user_message_from_polars_column_not_found() {
        let err = PolarsError::ColumnNotFound("foo".into());
        let msg = user_message_from_polars(&err);
        assert!(msg.contains("foo"), "expected 'foo', got: {}", msg);
        assert!(msg.contains("Column not found"), "got: {}", msg);
    }

    #[test]
    fn test_user_message_from_report_first_line() {
        let report = color_eyre::eyre::eyre!("No data to export\nmore detail");
        assert_eq!(user_message_from_report(&report), "No data to export");
    }

    #[test]
    fn test_user_message_from_report_keeps_wrapped_causes() {
        let report = color_eyre::eyre::eyre!("unknown field `pie`\nsnippet")
            .wrap_err("Invalid selections file charts.toml");
        assert_eq!(
            user_message_from_report(&report),
            "Invalid selections file charts.toml: unknown field `pie`"
        );
    }
}
