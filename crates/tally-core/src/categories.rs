//! Category hierarchy
//!
//! `CategoryTree` is the only writer of category paths. Every mutation runs
//! as one write transaction under the owning user's lock, so a rename or
//! move either rewrites the node and all of its descendants or nothing.
//!
//! ## Cascade
//!
//! When a node's path changes from `old` to `new`, each strict descendant
//! (found by a prefix-range scan on `old/`) gets its `old` ancestor swapped
//! for `new` via [`path::rebase`]. The node's own row is written directly.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Category, CategoryNode, NewCategory, PathMismatch, PathRewrite};
use crate::path;
use crate::store::{CategoryStore, ExpenseStore};

/// Materialized-path category tree backed by a [`Database`]
#[derive(Clone)]
pub struct CategoryTree {
    db: Database,
}

impl CategoryTree {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a root category; its path is its name
    pub fn create_root(&self, user_id: &str, name: &str) -> Result<Category> {
        self.create(&NewCategory::root(user_id, name))
    }

    /// Create a category under `parent_id`
    pub fn create_child(&self, user_id: &str, name: &str, parent_id: i64) -> Result<Category> {
        self.create(&NewCategory::child(user_id, name, parent_id))
    }

    pub fn create(&self, category: &NewCategory) -> Result<Category> {
        path::validate_name(&category.name)?;

        let created = self
            .db
            .write(&category.user_id, |store| insert_checked(store, category))?;

        info!(
            user_id = %created.user_id,
            id = created.id,
            path = %created.path,
            "Created category"
        );
        Ok(created)
    }

    /// Rename a category and rewrite the paths of its whole subtree
    pub fn rename(&self, user_id: &str, id: i64, new_name: &str) -> Result<PathRewrite> {
        path::validate_name(new_name)?;

        let rewrite = self.db.write(user_id, |store| {
            let node = require(store, user_id, id)?;
            ensure_unique_name(store, user_id, node.parent_id, new_name, Some(id))?;

            let parent_path = match node.parent_id {
                Some(pid) => Some(require(store, user_id, pid)?.path),
                None => None,
            };
            let new_path = path::compose(parent_path.as_deref(), new_name);

            rewrite_subtree(store, user_id, &node, new_name, node.parent_id, &new_path)
        })?;

        info!(
            user_id,
            id,
            old_path = %rewrite.old_path,
            new_path = %rewrite.new_path,
            rows = rewrite.rows_updated,
            "Renamed category"
        );
        Ok(rewrite)
    }

    /// Re-parent a category (`None` makes it a root) and rewrite its subtree
    pub fn move_to(
        &self,
        user_id: &str,
        id: i64,
        new_parent_id: Option<i64>,
    ) -> Result<PathRewrite> {
        let rewrite = self.db.write(user_id, |store| {
            let node = require(store, user_id, id)?;

            let parent_path = match new_parent_id {
                Some(pid) => {
                    let parent = require(store, user_id, pid)?;
                    ensure_not_descendant(store, user_id, id, &parent)?;
                    Some(parent.path)
                }
                None => None,
            };
            ensure_unique_name(store, user_id, new_parent_id, &node.name, Some(id))?;

            let new_path = path::compose(parent_path.as_deref(), &node.name);
            rewrite_subtree(store, user_id, &node, &node.name, new_parent_id, &new_path)
        })?;

        info!(
            user_id,
            id,
            new_parent_id = ?new_parent_id,
            old_path = %rewrite.old_path,
            new_path = %rewrite.new_path,
            rows = rewrite.rows_updated,
            "Moved category"
        );
        Ok(rewrite)
    }

    /// Delete a leaf category that no expense references
    pub fn delete(&self, user_id: &str, id: i64) -> Result<()> {
        let removed = self.db.write(user_id, |store| {
            let node = require(store, user_id, id)?;

            if store.has_children(user_id, id)? {
                return Err(Error::Conflict(format!(
                    "category '{}' has subcategories",
                    node.path
                )));
            }
            if store.exists_expense_for_category(user_id, id)? {
                return Err(Error::Conflict(format!(
                    "category '{}' is referenced by expenses",
                    node.path
                )));
            }

            store.delete_category(user_id, id)?;
            Ok(node)
        })?;

        info!(user_id, id, path = %removed.path, "Deleted category");
        Ok(())
    }

    /// All of a user's categories, ancestors before descendants
    pub fn list_ordered(&self, user_id: &str) -> Result<Vec<Category>> {
        let conn = self.db.conn()?;
        conn.find_all_categories_ordered(user_id)
    }

    pub fn get(&self, user_id: &str, id: i64) -> Result<Category> {
        let conn = self.db.conn()?;
        require(&*conn, user_id, id)
    }

    pub fn find_path(&self, user_id: &str, id: i64) -> Result<String> {
        Ok(self.get(user_id, id)?.path)
    }

    pub fn find_by_path(&self, user_id: &str, path: &str) -> Result<Option<Category>> {
        let conn = self.db.conn()?;
        conn.find_category_by_path(user_id, path)
    }

    pub fn exists_path(&self, user_id: &str, path: &str) -> Result<bool> {
        let conn = self.db.conn()?;
        conn.exists_category_path(user_id, path)
    }

    /// False for categories that do not exist
    pub fn has_children(&self, user_id: &str, id: i64) -> Result<bool> {
        let conn = self.db.conn()?;
        conn.has_children(user_id, id)
    }

    /// The user's categories as a nested tree
    pub fn tree(&self, user_id: &str) -> Result<Vec<CategoryNode>> {
        let all = self.list_ordered(user_id)?;

        fn build_subtree(
            categories: &[Category],
            parent_id: Option<i64>,
            depth: usize,
        ) -> Vec<CategoryNode> {
            categories
                .iter()
                .filter(|c| c.parent_id == parent_id)
                .map(|c| CategoryNode {
                    category: c.clone(),
                    depth,
                    children: build_subtree(categories, Some(c.id), depth + 1),
                })
                .collect()
        }

        Ok(build_subtree(&all, None, 0))
    }

    /// Recompute every path from its parent and report the ones that differ
    pub fn check_integrity(&self, user_id: &str) -> Result<Vec<PathMismatch>> {
        let all = self.db.read(|store| store.find_all_categories_ordered(user_id))?;
        let by_id: HashMap<i64, &Category> = all.iter().map(|c| (c.id, c)).collect();

        let mismatches: Vec<PathMismatch> = all
            .iter()
            .filter_map(|c| {
                let expected = match c.parent_id {
                    None => path::compose(None, &c.name),
                    Some(pid) => match by_id.get(&pid) {
                        Some(parent) => path::compose(Some(&parent.path), &c.name),
                        None => format!("<missing parent {}>{}{}", pid, path::SEPARATOR, c.name),
                    },
                };
                (expected != c.path).then(|| PathMismatch {
                    category_id: c.id,
                    stored: c.path.clone(),
                    expected,
                })
            })
            .collect();

        debug!(
            user_id,
            checked = all.len(),
            mismatches = mismatches.len(),
            "Checked category paths"
        );
        Ok(mismatches)
    }
}

/// Validate and insert a new category inside an open transaction
fn insert_checked<S: CategoryStore + ?Sized>(store: &S, category: &NewCategory) -> Result<Category> {
    let user_id = category.user_id.as_str();

    let parent_path = match category.parent_id {
        Some(pid) => Some(require(store, user_id, pid)?.path),
        None => None,
    };
    ensure_unique_name(store, user_id, category.parent_id, &category.name, None)?;

    let path = path::compose(parent_path.as_deref(), &category.name);
    let id = store.insert_category(category, &path)?;
    require(store, user_id, id)
}

fn require<S: CategoryStore + ?Sized>(store: &S, user_id: &str, id: i64) -> Result<Category> {
    store
        .find_category_by_id(user_id, id)?
        .ok_or_else(|| Error::NotFound(format!("category {}", id)))
}

fn ensure_unique_name<S: CategoryStore + ?Sized>(
    store: &S,
    user_id: &str,
    parent_id: Option<i64>,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<()> {
    let normalized = path::normalize_name(name);
    if !store.exists_category_name(user_id, parent_id, &normalized, exclude_id)? {
        return Ok(());
    }

    let parent = match parent_id {
        Some(pid) => require(store, user_id, pid)?.path,
        None => "root".to_string(),
    };
    Err(Error::DuplicateName {
        name: name.trim().to_string(),
        parent,
    })
}

/// Walk from `new_parent` up to its root, failing if `id` is on the way
fn ensure_not_descendant<S: CategoryStore + ?Sized>(
    store: &S,
    user_id: &str,
    id: i64,
    new_parent: &Category,
) -> Result<()> {
    let mut visited = HashSet::new();
    let mut current = new_parent.clone();

    loop {
        if current.id == id {
            return Err(Error::Cycle {
                id,
                new_parent: new_parent.id,
            });
        }
        if !visited.insert(current.id) {
            return Err(Error::InvalidData(format!(
                "category {} has a cyclic ancestor chain",
                current.id
            )));
        }
        match current.parent_id {
            Some(pid) => current = require(store, user_id, pid)?,
            None => return Ok(()),
        }
    }
}

/// Write the node's new name/parent/path and rebase every descendant
fn rewrite_subtree<S: CategoryStore + ?Sized>(
    store: &S,
    user_id: &str,
    node: &Category,
    new_name: &str,
    new_parent_id: Option<i64>,
    new_path: &str,
) -> Result<PathRewrite> {
    let unchanged =
        node.name == new_name && node.parent_id == new_parent_id && node.path == new_path;
    if unchanged {
        return Ok(PathRewrite {
            category_id: node.id,
            old_path: node.path.clone(),
            new_path: node.path.clone(),
            rows_updated: 0,
        });
    }

    // Scan before touching the node so the range still matches the old path
    let descendants = store.find_categories_by_path_prefix(user_id, &node.path)?;

    store.update_category(user_id, node.id, new_name, new_parent_id, new_path)?;

    for descendant in &descendants {
        let rebased = path::rebase(&descendant.path, &node.path, new_path).ok_or_else(|| {
            Error::InvalidData(format!(
                "'{}' is not below '{}'",
                descendant.path, node.path
            ))
        })?;
        store.update_category_path(user_id, descendant.id, &rebased)?;
    }

    debug!(
        user_id,
        id = node.id,
        descendants = descendants.len(),
        "Rewrote subtree paths"
    );

    Ok(PathRewrite {
        category_id: node.id,
        old_path: node.path.clone(),
        new_path: new_path.to_string(),
        rows_updated: descendants.len() + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExpenseKind, NewExpense};
    use chrono::Utc;
    use rust_decimal::Decimal;

    const USER: &str = "ana@example.com";

    fn setup() -> (Database, CategoryTree) {
        let db = Database::in_memory().unwrap();
        let tree = CategoryTree::new(db.clone());
        (db, tree)
    }

    /// Despesas > Lazer > Cinema, plus an empty Receitas root
    fn seed(tree: &CategoryTree) -> (Category, Category, Category, Category) {
        let despesas = tree.create_root(USER, "Despesas").unwrap();
        let lazer = tree.create_child(USER, "Lazer", despesas.id).unwrap();
        let cinema = tree.create_child(USER, "Cinema", lazer.id).unwrap();
        let receitas = tree.create_root(USER, "Receitas").unwrap();
        (despesas, lazer, cinema, receitas)
    }

    fn paths(tree: &CategoryTree) -> Vec<String> {
        tree.list_ordered(USER)
            .unwrap()
            .into_iter()
            .map(|c| c.path)
            .collect()
    }

    #[test]
    fn test_create_builds_paths() {
        let (_db, tree) = setup();
        let (despesas, lazer, cinema, _) = seed(&tree);

        assert_eq!(despesas.path, "Despesas");
        assert!(despesas.is_root());
        assert_eq!(lazer.path, "Despesas/Lazer");
        assert_eq!(lazer.parent_id, Some(despesas.id));
        assert_eq!(cinema.path, "Despesas/Lazer/Cinema");
        assert!(tree.check_integrity(USER).unwrap().is_empty());
    }

    #[test]
    fn test_create_child_missing_parent() {
        let (_db, tree) = setup();
        let err = tree.create_child(USER, "Lazer", 999).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_create_child_of_other_users_parent() {
        let (_db, tree) = setup();
        let theirs = tree.create_root("bruno@example.com", "Despesas").unwrap();

        let err = tree.create_child(USER, "Lazer", theirs.id).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_duplicate_sibling_names_case_insensitive() {
        let (_db, tree) = setup();
        let despesas = tree.create_root(USER, "Despesas").unwrap();
        tree.create_child(USER, "Lazer", despesas.id).unwrap();

        let err = tree.create_child(USER, "lazer", despesas.id).unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));

        let err = tree.create_child(USER, "  LAZER ", despesas.id).unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));
    }

    #[test]
    fn test_duplicate_root_names() {
        let (_db, tree) = setup();
        tree.create_root(USER, "Lazer").unwrap();

        let err = tree.create_root(USER, " lazer").unwrap_err();
        assert!(matches!(err, Error::DuplicateName { ref parent, .. } if parent == "root"));
    }

    #[test]
    fn test_same_name_allowed_under_different_parents_and_users() {
        let (_db, tree) = setup();
        let (despesas, _, _, receitas) = seed(&tree);

        assert!(tree.create_child(USER, "Outros", despesas.id).is_ok());
        assert!(tree.create_child(USER, "Outros", receitas.id).is_ok());
        assert!(tree.create_root("bruno@example.com", "Despesas").is_ok());
    }

    #[test]
    fn test_create_rejects_invalid_names() {
        let (_db, tree) = setup();
        assert!(matches!(
            tree.create_root(USER, "   ").unwrap_err(),
            Error::InvalidName(_)
        ));
        assert!(matches!(
            tree.create_root(USER, "A/B").unwrap_err(),
            Error::InvalidName(_)
        ));
    }

    #[test]
    fn test_rename_root_cascades() {
        let (_db, tree) = setup();
        let (despesas, lazer, cinema, _) = seed(&tree);

        let rewrite = tree.rename(USER, despesas.id, "Gastos").unwrap();
        assert_eq!(rewrite.old_path, "Despesas");
        assert_eq!(rewrite.new_path, "Gastos");
        assert_eq!(rewrite.rows_updated, 3);

        assert_eq!(tree.find_path(USER, despesas.id).unwrap(), "Gastos");
        assert_eq!(tree.find_path(USER, lazer.id).unwrap(), "Gastos/Lazer");
        assert_eq!(tree.find_path(USER, cinema.id).unwrap(), "Gastos/Lazer/Cinema");
        assert_eq!(tree.get(USER, despesas.id).unwrap().name, "Gastos");
        assert!(tree.check_integrity(USER).unwrap().is_empty());
    }

    #[test]
    fn test_rename_child_cascades() {
        let (_db, tree) = setup();
        let (_, lazer, cinema, _) = seed(&tree);

        tree.rename(USER, lazer.id, "Entretenimento").unwrap();

        assert_eq!(
            tree.find_path(USER, lazer.id).unwrap(),
            "Despesas/Entretenimento"
        );
        assert_eq!(
            tree.find_path(USER, cinema.id).unwrap(),
            "Despesas/Entretenimento/Cinema"
        );
    }

    #[test]
    fn test_rename_does_not_touch_prefix_sharing_sibling() {
        let (_db, tree) = setup();
        let car = tree.create_root(USER, "Car").unwrap();
        let oil = tree.create_child(USER, "Oil", car.id).unwrap();
        let cartao = tree.create_root(USER, "Cartao").unwrap();
        let fatura = tree.create_child(USER, "Fatura", cartao.id).unwrap();

        let rewrite = tree.rename(USER, car.id, "Auto").unwrap();
        assert_eq!(rewrite.rows_updated, 2);

        assert_eq!(tree.find_path(USER, oil.id).unwrap(), "Auto/Oil");
        assert_eq!(tree.find_path(USER, cartao.id).unwrap(), "Cartao");
        assert_eq!(tree.find_path(USER, fatura.id).unwrap(), "Cartao/Fatura");
    }

    /// Make any path write to `id` fail inside the transaction
    fn fail_path_writes_to(db: &Database, id: i64) {
        db.conn()
            .unwrap()
            .execute_batch(&format!(
                "CREATE TRIGGER fail_path BEFORE UPDATE OF path ON categories \
                 WHEN NEW.id = {} BEGIN SELECT RAISE(ABORT, 'path write failed'); END;",
                id
            ))
            .unwrap();
    }

    #[test]
    fn test_rename_failing_midway_rolls_back_every_row() {
        let (db, tree) = setup();
        let (despesas, lazer, cinema, _) = seed(&tree);
        let before = paths(&tree);
        // Cinema is rebased last, after Despesas and Lazer were rewritten
        fail_path_writes_to(&db, cinema.id);

        let err = tree.rename(USER, despesas.id, "Gastos").unwrap_err();
        assert!(err.is_storage());

        assert_eq!(paths(&tree), before);
        assert_eq!(tree.get(USER, despesas.id).unwrap().name, "Despesas");
        assert_eq!(tree.find_path(USER, lazer.id).unwrap(), "Despesas/Lazer");
        assert!(tree.check_integrity(USER).unwrap().is_empty());
    }

    #[test]
    fn test_move_failing_midway_rolls_back_every_row() {
        let (db, tree) = setup();
        let (despesas, lazer, cinema, receitas) = seed(&tree);
        let before = paths(&tree);
        fail_path_writes_to(&db, cinema.id);

        let err = tree.move_to(USER, lazer.id, Some(receitas.id)).unwrap_err();
        assert!(err.is_storage());

        assert_eq!(paths(&tree), before);
        assert_eq!(tree.get(USER, lazer.id).unwrap().parent_id, Some(despesas.id));
        assert!(tree.check_integrity(USER).unwrap().is_empty());
    }

    #[test]
    fn test_rename_to_sibling_name_fails_and_changes_nothing() {
        let (_db, tree) = setup();
        let (despesas, lazer, _, _) = seed(&tree);
        tree.create_child(USER, "Mercado", despesas.id).unwrap();
        let before = paths(&tree);

        let err = tree.rename(USER, lazer.id, "MERCADO").unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));
        assert_eq!(paths(&tree), before);
    }

    #[test]
    fn test_rename_case_only_is_allowed() {
        let (_db, tree) = setup();
        let (_, lazer, cinema, _) = seed(&tree);

        tree.rename(USER, lazer.id, "LAZER").unwrap();
        assert_eq!(tree.find_path(USER, cinema.id).unwrap(), "Despesas/LAZER/Cinema");
    }

    #[test]
    fn test_rename_same_name_is_noop() {
        let (_db, tree) = setup();
        let (_, lazer, _, _) = seed(&tree);

        let rewrite = tree.rename(USER, lazer.id, "Lazer").unwrap();
        assert_eq!(rewrite.rows_updated, 0);
        assert_eq!(rewrite.old_path, rewrite.new_path);
    }

    #[test]
    fn test_rename_missing_category() {
        let (_db, tree) = setup();
        let err = tree.rename(USER, 42, "Gastos").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_move_subtree_cascades() {
        let (_db, tree) = setup();
        let (despesas, lazer, cinema, receitas) = seed(&tree);

        let rewrite = tree.move_to(USER, lazer.id, Some(receitas.id)).unwrap();
        assert_eq!(rewrite.rows_updated, 2);

        let moved = tree.get(USER, lazer.id).unwrap();
        assert_eq!(moved.parent_id, Some(receitas.id));
        assert_eq!(moved.path, "Receitas/Lazer");
        assert_eq!(tree.find_path(USER, cinema.id).unwrap(), "Receitas/Lazer/Cinema");
        assert!(!tree.has_children(USER, despesas.id).unwrap());
        assert!(tree.check_integrity(USER).unwrap().is_empty());
    }

    #[test]
    fn test_move_to_root() {
        let (_db, tree) = setup();
        let (_, lazer, cinema, _) = seed(&tree);

        tree.move_to(USER, lazer.id, None).unwrap();

        assert!(tree.get(USER, lazer.id).unwrap().is_root());
        assert_eq!(tree.find_path(USER, cinema.id).unwrap(), "Lazer/Cinema");
    }

    #[test]
    fn test_move_into_self_or_descendant_is_cycle() {
        let (_db, tree) = setup();
        let (despesas, lazer, cinema, _) = seed(&tree);

        let err = tree.move_to(USER, despesas.id, Some(lazer.id)).unwrap_err();
        assert!(matches!(err, Error::Cycle { .. }));

        let err = tree.move_to(USER, despesas.id, Some(cinema.id)).unwrap_err();
        assert!(matches!(err, Error::Cycle { .. }));

        let err = tree.move_to(USER, lazer.id, Some(lazer.id)).unwrap_err();
        assert!(matches!(err, Error::Cycle { .. }));

        assert_eq!(
            paths(&tree),
            vec!["Despesas", "Despesas/Lazer", "Despesas/Lazer/Cinema", "Receitas"]
        );
    }

    #[test]
    fn test_move_missing_parent() {
        let (_db, tree) = setup();
        let (_, lazer, _, _) = seed(&tree);

        let err = tree.move_to(USER, lazer.id, Some(777)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_move_onto_existing_name_fails() {
        let (_db, tree) = setup();
        let (_, lazer, _, receitas) = seed(&tree);
        tree.create_child(USER, "lazer", receitas.id).unwrap();

        let err = tree.move_to(USER, lazer.id, Some(receitas.id)).unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));
        assert_eq!(tree.find_path(USER, lazer.id).unwrap(), "Despesas/Lazer");
    }

    #[test]
    fn test_delete_leaf() {
        let (_db, tree) = setup();
        let (_, lazer, cinema, _) = seed(&tree);

        tree.delete(USER, cinema.id).unwrap();
        assert!(matches!(
            tree.get(USER, cinema.id).unwrap_err(),
            Error::NotFound(_)
        ));
        assert!(!tree.has_children(USER, lazer.id).unwrap());
    }

    #[test]
    fn test_delete_with_children_conflicts() {
        let (_db, tree) = setup();
        let (despesas, _, _, _) = seed(&tree);

        let err = tree.delete(USER, despesas.id).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_delete_referenced_category_conflicts() {
        let (db, tree) = setup();
        let (_, _, cinema, _) = seed(&tree);

        db.write(USER, |store| {
            store.insert_expense(
                USER,
                &NewExpense {
                    amount: Decimal::new(3000, 2),
                    kind: ExpenseKind::Debit,
                    description: "Ingresso".to_string(),
                    timestamp: Utc::now(),
                    category_id: Some(cinema.id),
                },
            )
        })
        .unwrap();

        let err = tree.delete(USER, cinema.id).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_delete_missing() {
        let (_db, tree) = setup();
        assert!(matches!(
            tree.delete(USER, 5).unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[test]
    fn test_list_ordered() {
        let (_db, tree) = setup();
        // Create out of order on purpose
        let receitas = tree.create_root(USER, "Receitas").unwrap();
        let despesas = tree.create_root(USER, "Despesas").unwrap();
        let lazer = tree.create_child(USER, "Lazer", despesas.id).unwrap();
        tree.create_child(USER, "Cinema", lazer.id).unwrap();
        assert!(receitas.id < despesas.id);

        assert_eq!(
            paths(&tree),
            vec!["Despesas", "Despesas/Lazer", "Despesas/Lazer/Cinema", "Receitas"]
        );
    }

    #[test]
    fn test_find_path_missing() {
        let (_db, tree) = setup();
        assert!(matches!(
            tree.find_path(USER, 1).unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[test]
    fn test_find_by_path_and_exists() {
        let (_db, tree) = setup();
        let (_, lazer, _, _) = seed(&tree);

        let found = tree.find_by_path(USER, "Despesas/Lazer").unwrap().unwrap();
        assert_eq!(found.id, lazer.id);
        assert!(tree.exists_path(USER, "Despesas/Lazer").unwrap());
        assert!(!tree.exists_path(USER, "Despesas/lazer").unwrap());
        assert!(!tree.exists_path("bruno@example.com", "Despesas/Lazer").unwrap());
    }

    #[test]
    fn test_has_children() {
        let (_db, tree) = setup();
        let (despesas, _, cinema, _) = seed(&tree);

        assert!(tree.has_children(USER, despesas.id).unwrap());
        assert!(!tree.has_children(USER, cinema.id).unwrap());
        assert!(!tree.has_children(USER, 12345).unwrap());
    }

    #[test]
    fn test_tree_nesting() {
        let (_db, tree) = setup();
        seed(&tree);

        let roots = tree.tree(USER).unwrap();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].category.name, "Despesas");
        assert_eq!(roots[0].children[0].category.name, "Lazer");
        assert_eq!(roots[0].children[0].depth, 1);
        assert_eq!(roots[0].children[0].children[0].category.path, "Despesas/Lazer/Cinema");
        assert!(roots[1].children.is_empty());
    }

    #[test]
    fn test_check_integrity_reports_drift() {
        let (db, tree) = setup();
        let (_, lazer, _, _) = seed(&tree);

        // Corrupt a path behind the tree's back
        db.conn()
            .unwrap()
            .execute(
                "UPDATE categories SET path = 'Despesas/Wrong' WHERE id = ?",
                rusqlite::params![lazer.id],
            )
            .unwrap();

        let mismatches = tree.check_integrity(USER).unwrap();
        // Lazer itself and Cinema (whose parent path no longer matches)
        assert_eq!(mismatches.len(), 2);
        let lazer_mismatch = mismatches
            .iter()
            .find(|m| m.category_id == lazer.id)
            .unwrap();
        assert_eq!(lazer_mismatch.stored, "Despesas/Wrong");
        assert_eq!(lazer_mismatch.expected, "Despesas/Lazer");
    }
}
