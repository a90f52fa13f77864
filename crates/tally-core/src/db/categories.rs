//! Category operations

use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::Result;
use crate::models::Category;

impl Database {
    /// Get a category by name, creating it if missing
    pub fn get_or_create_category(&self, name: &str) -> Result<i64> {
        let conn = self.conn()?;

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM categories WHERE name = ?",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        conn.execute("INSERT INTO categories (name) VALUES (?)", params![name])?;
        Ok(conn.last_insert_rowid())
    }

    /// List all categories
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name")?;

        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// Get a category's name
    pub fn category_name(&self, id: i64) -> Result<Option<String>> {
        let conn = self.conn()?;
        let name = conn
            .query_row(
                "SELECT name FROM categories WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }
}
