use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How a numeric attribute behaves across the parent/child hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Additive count (students, population); a citywide rollup row would
    /// double-count its sub-areas, so parents are forced to zero.
    Count,
    /// Ratio or average (age, income, density); meaningless on a rollup row,
    /// so parents are forced to null.
    Ratio,
}

/// One declared numeric attribute column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeColumn {
    pub name: String,
    pub kind: ColumnKind,
}

/// Declares which columns of the attribute tables are numeric statistics and
/// how each one aggregates. Injected into the join rather than hardcoded so
/// datasets with other columns only need a different schema file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeSchema {
    pub columns: Vec<AttributeColumn>,
}

impl AttributeSchema {
    /// Columns of the Tokyo ward dashboard dataset.
    pub fn builtin() -> Self {
        fn column(name: &str, kind: ColumnKind) -> AttributeColumn {
            AttributeColumn { name: name.to_string(), kind }
        }
        Self {
            columns: vec![
                column("高校生数", ColumnKind::Count),
                column("人口", ColumnKind::Count),
                column("平均年齢", ColumnKind::Ratio),
                column("平均所得", ColumnKind::Ratio),
                column("人口密度", ColumnKind::Ratio),
            ],
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_json_str(&contents)?)
    }

    /// Kind of a declared column, or `None` if the schema does not know it.
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.kind)
    }

    /// Declared column names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeSchema, ColumnKind};

    #[test]
    fn builtin_covers_dashboard_columns() {
        let schema = AttributeSchema::builtin();
        assert_eq!(schema.kind_of("高校生数"), Some(ColumnKind::Count));
        assert_eq!(schema.kind_of("平均年齢"), Some(ColumnKind::Ratio));
        assert_eq!(schema.kind_of("不明な列"), None);
    }

    #[test]
    fn parses_from_json() {
        let schema = AttributeSchema::from_json_str(
            r#"{"columns":[{"name":"世帯数","kind":"count"},{"name":"持家率","kind":"ratio"}]}"#,
        )
        .unwrap();
        assert_eq!(schema.kind_of("世帯数"), Some(ColumnKind::Count));
        assert_eq!(schema.kind_of("持家率"), Some(ColumnKind::Ratio));
        assert_eq!(schema.names().count(), 2);
    }
}
