//! Category command implementations

use anyhow::{Context, Result};
use tally_core::models::{Category, CategoryNode};
use tally_core::{path, CategoryTree, Database};

pub fn cmd_categories_list(db: &Database, user: &str, json: bool) -> Result<()> {
    let tree = CategoryTree::new(db.clone());
    let roots = tree.tree(user)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&roots)?);
        return Ok(());
    }

    if roots.is_empty() {
        println!("No categories found. Add one with:");
        println!("  tally categories add <path>");
        return Ok(());
    }

    println!();
    println!("🗂️  Categories");
    println!("   ─────────────────────────────────────────────────────────────");

    fn print_node(node: &CategoryNode) {
        let prefix = "  ".repeat(node.depth);
        println!(
            "   {}• {} (id: {})",
            prefix, node.category.name, node.category.id
        );
        for child in &node.children {
            print_node(child);
        }
    }

    for root in &roots {
        print_node(root);
    }

    Ok(())
}

/// Create a category from its full path; everything above the leaf must exist
pub fn cmd_categories_add(db: &Database, user: &str, full_path: &str, json: bool) -> Result<()> {
    let tree = CategoryTree::new(db.clone());
    let name = path::leaf_name(full_path);

    let category = match path::parent_path(full_path) {
        Some(parent_path) => {
            let parent = tree
                .find_by_path(user, parent_path)?
                .ok_or_else(|| anyhow::anyhow!("Parent category not found: {}", parent_path))?;
            tree.create_child(user, name, parent.id)?
        }
        None => tree.create_root(user, name)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&category)?);
    } else {
        println!(
            "✅ Created category '{}' (id: {})",
            category.path, category.id
        );
    }

    Ok(())
}

pub fn cmd_categories_rename(
    db: &Database,
    user: &str,
    category: &str,
    new_name: &str,
    json: bool,
) -> Result<()> {
    let tree = CategoryTree::new(db.clone());
    let target = resolve_category_arg(&tree, user, category)?;

    let rewrite = tree.rename(user, target.id, new_name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rewrite)?);
    } else {
        println!(
            "✅ Renamed '{}' to '{}' ({} paths updated)",
            rewrite.old_path, rewrite.new_path, rewrite.rows_updated
        );
    }

    Ok(())
}

pub fn cmd_categories_move(
    db: &Database,
    user: &str,
    category: &str,
    to: &str,
    json: bool,
) -> Result<()> {
    let tree = CategoryTree::new(db.clone());
    let target = resolve_category_arg(&tree, user, category)?;

    let new_parent_id = if to.eq_ignore_ascii_case("root") {
        None
    } else {
        Some(resolve_category_arg(&tree, user, to)?.id)
    };

    let rewrite = tree.move_to(user, target.id, new_parent_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rewrite)?);
    } else {
        println!(
            "✅ Moved '{}' to '{}' ({} paths updated)",
            rewrite.old_path, rewrite.new_path, rewrite.rows_updated
        );
    }

    Ok(())
}

pub fn cmd_categories_delete(db: &Database, user: &str, category: &str) -> Result<()> {
    let tree = CategoryTree::new(db.clone());
    let target = resolve_category_arg(&tree, user, category)?;

    tree.delete(user, target.id)
        .with_context(|| format!("Cannot delete '{}'", target.path))?;
    println!("✅ Deleted category '{}'", target.path);

    Ok(())
}

pub fn cmd_categories_path(db: &Database, user: &str, id: i64) -> Result<()> {
    let tree = CategoryTree::new(db.clone());
    println!("{}", tree.find_path(user, id)?);
    Ok(())
}

pub fn cmd_categories_check(db: &Database, user: &str, json: bool) -> Result<()> {
    let tree = CategoryTree::new(db.clone());
    let mismatches = tree.check_integrity(user)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&mismatches)?);
    } else if mismatches.is_empty() {
        println!("✅ All category paths match their parent chain");
    } else {
        println!("⚠️  Inconsistent category paths:");
        for m in &mismatches {
            println!(
                "   id {}: stored '{}', expected '{}'",
                m.category_id, m.stored, m.expected
            );
        }
    }

    if !mismatches.is_empty() {
        anyhow::bail!("{} categories have inconsistent paths", mismatches.len());
    }
    Ok(())
}

/// Resolve a category argument (path or numeric ID) to a Category
pub fn resolve_category_arg(tree: &CategoryTree, user: &str, path_or_id: &str) -> Result<Category> {
    // Paths win, so a category literally named "2024" is still reachable
    if let Some(category) = tree.find_by_path(user, path_or_id)? {
        return Ok(category);
    }

    if let Ok(id) = path_or_id.parse::<i64>() {
        return tree
            .get(user, id)
            .with_context(|| format!("Category not found: {}", path_or_id));
    }

    anyhow::bail!("Category not found: {}", path_or_id)
}
