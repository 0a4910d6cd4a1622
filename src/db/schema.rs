//! Database schema types for sqlchat.
//!
//! Represents the structure of a database including tables, columns and
//! foreign keys, and renders it as DDL for the SQL agent.

use super::DatabaseBackend;
use serde::{Deserialize, Serialize};

/// Represents the complete schema of a database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    /// All tables in the schema.
    pub tables: Vec<Table>,

    /// Foreign key relationships between tables.
    pub foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a table by exact name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Returns the names of all tables in schema order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Renders a `CREATE TABLE` statement for the given table.
    ///
    /// Columns, the primary key and outgoing foreign keys are included.
    /// Identifiers are quoted only when they need it.
    pub fn create_table_statement(&self, table: &Table, backend: DatabaseBackend) -> String {
        let quote = |ident: &str| quote_if_needed(ident, backend);

        let mut lines: Vec<String> = table
            .columns
            .iter()
            .map(|column| {
                let mut line = format!("\t{} {}", quote(&column.name), column.data_type);
                if !column.is_nullable {
                    line.push_str(" NOT NULL");
                }
                if let Some(default) = &column.default {
                    line.push_str(" DEFAULT ");
                    line.push_str(default);
                }
                line
            })
            .collect();

        if !table.primary_key.is_empty() {
            let columns = table
                .primary_key
                .iter()
                .map(|c| quote(c))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("\tPRIMARY KEY ({columns})"));
        }

        for fk in self.foreign_keys.iter().filter(|fk| fk.from_table == table.name) {
            let from = fk
                .from_columns
                .iter()
                .map(|c| quote(c))
                .collect::<Vec<_>>()
                .join(", ");
            let to = fk
                .to_columns
                .iter()
                .map(|c| quote(c))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!(
                "\tFOREIGN KEY({from}) REFERENCES {} ({to})",
                quote(&fk.to_table)
            ));
        }

        format!("CREATE TABLE {} (\n{}\n)", quote(&table.name), lines.join(", \n"))
    }
}

/// Quotes an identifier unless it is a plain lowercase-safe word.
fn quote_if_needed(ident: &str, backend: DatabaseBackend) -> String {
    let plain = !ident.is_empty()
        && !ident.starts_with(|c: char| c.is_ascii_digit())
        && ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        ident.to_string()
    } else {
        backend.quote_identifier(ident)
    }
}

/// Represents a database table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Columns in the table.
    pub columns: Vec<Column>,

    /// Column names that form the primary key.
    pub primary_key: Vec<String>,
}

impl Table {
    /// Creates a new table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    /// Adds a column.
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the primary key columns.
    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }
}

/// Represents a column in a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Declared data type (e.g., "INTEGER", "varchar(255)").
    pub data_type: String,

    /// Whether the column allows NULL values.
    pub is_nullable: bool,

    /// Default value expression, if any.
    pub default: Option<String>,
}

impl Column {
    /// Creates a new column with the given name and data type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default: None,
        }
    }

    /// Sets whether the column is nullable.
    pub fn nullable(self, nullable: bool) -> Self {
        Self {
            is_nullable: nullable,
            ..self
        }
    }

    /// Sets the default value.
    pub fn with_default(self, default: impl Into<String>) -> Self {
        Self {
            default: Some(default.into()),
            ..self
        }
    }
}

/// Represents a foreign key relationship between tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Source table name.
    pub from_table: String,

    /// Source column names.
    pub from_columns: Vec<String>,

    /// Target table name.
    pub to_table: String,

    /// Target column names.
    pub to_columns: Vec<String>,
}

impl ForeignKey {
    /// Creates a new foreign key relationship.
    pub fn new(
        from_table: impl Into<String>,
        from_columns: Vec<String>,
        to_table: impl Into<String>,
        to_columns: Vec<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_columns,
            to_table: to_table.into(),
            to_columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_schema() -> Schema {
        Schema {
            tables: vec![
                Table::new("customers")
                    .with_column(Column::new("id", "INTEGER").nullable(false))
                    .with_column(Column::new("name", "TEXT").nullable(false))
                    .with_primary_key(&["id"]),
                Table::new("orders")
                    .with_column(Column::new("id", "INTEGER").nullable(false))
                    .with_column(Column::new("customer_id", "INTEGER"))
                    .with_column(Column::new("status", "TEXT").with_default("'pending'"))
                    .with_primary_key(&["id"]),
            ],
            foreign_keys: vec![ForeignKey::new(
                "orders",
                vec!["customer_id".to_string()],
                "customers",
                vec!["id".to_string()],
            )],
        }
    }

    #[test]
    fn test_create_table_statement() {
        let schema = sample_schema();
        let orders = schema.table("orders").unwrap();
        let ddl = schema.create_table_statement(orders, DatabaseBackend::Sqlite);

        assert_eq!(
            ddl,
            "CREATE TABLE orders (\n\
             \tid INTEGER NOT NULL, \n\
             \tcustomer_id INTEGER, \n\
             \tstatus TEXT DEFAULT 'pending', \n\
             \tPRIMARY KEY (id), \n\
             \tFOREIGN KEY(customer_id) REFERENCES customers (id)\n\
             )"
        );
    }

    #[test]
    fn test_create_table_without_keys() {
        let schema = sample_schema();
        let customers = schema.table("customers").unwrap();
        let ddl = schema.create_table_statement(customers, DatabaseBackend::MySql);

        assert!(ddl.starts_with("CREATE TABLE customers (\n"));
        assert!(ddl.contains("\tname TEXT NOT NULL"));
        assert!(!ddl.contains("FOREIGN KEY"));
    }

    #[test]
    fn test_identifiers_quoted_when_needed() {
        let schema = Schema {
            tables: vec![Table::new("order items").with_column(Column::new("unit price", "REAL"))],
            foreign_keys: vec![],
        };
        let table = &schema.tables[0];

        let sqlite = schema.create_table_statement(table, DatabaseBackend::Sqlite);
        assert!(sqlite.contains("CREATE TABLE \"order items\""));
        assert!(sqlite.contains("\"unit price\" REAL"));

        let mysql = schema.create_table_statement(table, DatabaseBackend::MySql);
        assert!(mysql.contains("CREATE TABLE `order items`"));
    }

    #[test]
    fn test_table_lookup() {
        let schema = sample_schema();
        assert!(schema.table("orders").is_some());
        assert!(schema.table("ordres").is_none());
        assert_eq!(schema.table_names(), vec!["customers", "orders"]);
    }

    #[test]
    fn test_column_builder() {
        let col = Column::new("email", "varchar(255)")
            .nullable(false)
            .with_default("''");

        assert_eq!(col.name, "email");
        assert_eq!(col.data_type, "varchar(255)");
        assert!(!col.is_nullable);
        assert_eq!(col.default, Some("''".to_string()));
    }
}
