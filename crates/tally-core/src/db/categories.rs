//! Category store operations

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::parse_datetime;
use crate::error::Result;
use crate::models::{Category, NewCategory};
use crate::path::{descendant_range, normalize_name};
use crate::store::CategoryStore;

const CATEGORY_COLUMNS: &str = "id, user_id, name, parent_id, path, created_at";

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    let created_at_str: String = row.get(5)?;
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        parent_id: row.get(3)?,
        path: row.get(4)?,
        created_at: parse_datetime(&created_at_str),
    })
}

impl CategoryStore for Connection {
    fn insert_category(&self, category: &NewCategory, path: &str) -> Result<i64> {
        self.execute(
            r#"
            INSERT INTO categories (user_id, name, name_normalized, parent_id, path)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                category.user_id,
                category.name,
                normalize_name(&category.name),
                category.parent_id,
                path
            ],
        )?;
        Ok(self.last_insert_rowid())
    }

    fn find_category_by_id(&self, user_id: &str, id: i64) -> Result<Option<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE user_id = ? AND id = ?",
            CATEGORY_COLUMNS
        );
        let category = self
            .query_row(&sql, params![user_id, id], category_from_row)
            .optional()?;
        Ok(category)
    }

    fn find_category_by_path(&self, user_id: &str, path: &str) -> Result<Option<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE user_id = ? AND path = ?",
            CATEGORY_COLUMNS
        );
        let category = self
            .query_row(&sql, params![user_id, path], category_from_row)
            .optional()?;
        Ok(category)
    }

    fn find_categories_by_path_prefix(&self, user_id: &str, path: &str) -> Result<Vec<Category>> {
        // Range scan on (user_id, path); no LIKE so '%' and '_' in names are inert
        let (start, end) = descendant_range(path);
        let sql = format!(
            "SELECT {} FROM categories WHERE user_id = ? AND path >= ? AND path < ? ORDER BY path",
            CATEGORY_COLUMNS
        );
        let mut stmt = self.prepare(&sql)?;
        let categories = stmt
            .query_map(params![user_id, start, end], category_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    fn exists_category_name(
        &self,
        user_id: &str,
        parent_id: Option<i64>,
        name_normalized: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        // `IS` treats NULL = NULL as true, which covers root siblings
        let exists = self
            .query_row(
                r#"
                SELECT 1 FROM categories
                WHERE user_id = ?1
                  AND parent_id IS ?2
                  AND name_normalized = ?3
                  AND (?4 IS NULL OR id != ?4)
                LIMIT 1
                "#,
                params![user_id, parent_id, name_normalized, exclude_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists)
    }

    fn exists_category_path(&self, user_id: &str, path: &str) -> Result<bool> {
        let exists = self
            .query_row(
                "SELECT 1 FROM categories WHERE user_id = ? AND path = ?",
                params![user_id, path],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists)
    }

    fn has_children(&self, user_id: &str, id: i64) -> Result<bool> {
        let exists = self
            .query_row(
                "SELECT 1 FROM categories WHERE user_id = ? AND parent_id = ? LIMIT 1",
                params![user_id, id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists)
    }

    fn update_category(
        &self,
        user_id: &str,
        id: i64,
        name: &str,
        parent_id: Option<i64>,
        path: &str,
    ) -> Result<()> {
        self.execute(
            r#"
            UPDATE categories
            SET name = ?, name_normalized = ?, parent_id = ?, path = ?
            WHERE user_id = ? AND id = ?
            "#,
            params![
                name,
                normalize_name(name),
                parent_id,
                path,
                user_id,
                id
            ],
        )?;
        Ok(())
    }

    fn update_category_path(&self, user_id: &str, id: i64, path: &str) -> Result<()> {
        self.execute(
            "UPDATE categories SET path = ? WHERE user_id = ? AND id = ?",
            params![path, user_id, id],
        )?;
        Ok(())
    }

    fn delete_category(&self, user_id: &str, id: i64) -> Result<bool> {
        let deleted = self.execute(
            "DELETE FROM categories WHERE user_id = ? AND id = ?",
            params![user_id, id],
        )?;
        Ok(deleted > 0)
    }

    fn find_all_categories_ordered(&self, user_id: &str) -> Result<Vec<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE user_id = ? ORDER BY path",
            CATEGORY_COLUMNS
        );
        let mut stmt = self.prepare(&sql)?;
        let categories = stmt
            .query_map(params![user_id], category_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }
}
