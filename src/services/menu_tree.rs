//! Menu hierarchy: flat `menus` rows to a sorted forest, and the
//! parent-assignment guard used on update.
//!
//! Nodes are assembled from an index-based arena (row position keyed by menu
//! id), so no node ever holds a reference to its parent.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::{menu, MenuType};

/// A menu and its ordered sub-menus
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub route: Option<String>,
    pub menu_type: MenuType,
    pub parent_id: Option<i64>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub children: Vec<MenuNode>,
}

impl From<&menu::Model> for MenuNode {
    fn from(m: &menu::Model) -> Self {
        Self {
            id: m.id,
            name: m.name.clone(),
            display_name: m.display_name.clone(),
            description: m.description.clone(),
            icon: m.icon.clone(),
            route: m.route.clone(),
            menu_type: m.menu_type,
            parent_id: m.parent_id,
            sort_order: m.sort_order,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
            children: Vec::new(),
        }
    }
}

impl MenuNode {
    /// Number of nodes in this subtree, including itself
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(MenuNode::node_count).sum::<usize>()
    }
}

fn sort_key_cmp(a: &menu::Model, b: &menu::Model) -> Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| a.display_name.cmp(&b.display_name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Build the menu forest from rows already filtered by the caller.
///
/// Every input row appears exactly once in the output:
/// - a row whose parent is not part of the input (deleted, inactive or of
///   another menu type) is promoted to a root and logged;
/// - rows caught in a parent cycle are unreachable from any root, so the
///   first of them by sort key is promoted to a root as well.
///
/// Each level is ordered by `(sort_order, display_name)`.
pub fn build_menu_tree(menus: &[menu::Model]) -> Vec<MenuNode> {
    let index: HashMap<i64, usize> = menus
        .iter()
        .enumerate()
        .map(|(i, m)| (m.id, i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); menus.len()];
    let mut roots = Vec::new();

    for (i, m) in menus.iter().enumerate() {
        match m.parent_id.map(|parent_id| (parent_id, index.get(&parent_id))) {
            None => roots.push(i),
            Some((_, Some(&parent))) if parent == i => {
                tracing::warn!(menu_id = m.id, "Menu is its own parent, promoting to root");
                roots.push(i);
            }
            Some((_, Some(&parent))) => children[parent].push(i),
            Some((parent_id, None)) => {
                tracing::warn!(
                    menu_id = m.id,
                    parent_id,
                    "Menu parent is not part of the result set, promoting to root"
                );
                roots.push(i);
            }
        }
    }

    for list in children.iter_mut() {
        list.sort_by(|&a, &b| sort_key_cmp(&menus[a], &menus[b]));
    }
    roots.sort_by(|&a, &b| sort_key_cmp(&menus[a], &menus[b]));

    let mut visited = vec![false; menus.len()];
    let mut forest: Vec<MenuNode> = roots
        .into_iter()
        .map(|root| assemble(root, menus, &children, &mut visited))
        .collect();

    let mut stranded: Vec<usize> = (0..menus.len()).filter(|&i| !visited[i]).collect();
    stranded.sort_by(|&a, &b| sort_key_cmp(&menus[a], &menus[b]));
    if !stranded.is_empty() {
        for i in stranded {
            if visited[i] {
                continue;
            }
            tracing::warn!(
                menu_id = menus[i].id,
                "Menu hierarchy contains a cycle, promoting to root"
            );
            forest.push(assemble(i, menus, &children, &mut visited));
        }
        forest.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.display_name.cmp(&b.display_name))
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    forest
}

fn assemble(
    i: usize,
    menus: &[menu::Model],
    children: &[Vec<usize>],
    visited: &mut [bool],
) -> MenuNode {
    visited[i] = true;
    let mut node = MenuNode::from(&menus[i]);
    for &child in &children[i] {
        if !visited[child] {
            node.children.push(assemble(child, menus, children, visited));
        }
    }
    node
}

/// Find a node anywhere in the forest
pub fn find_node(forest: &[MenuNode], id: i64) -> Option<&MenuNode> {
    for node in forest {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_node(&node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Rejected parent assignment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParentError {
    #[error("A menu cannot be its own parent")]
    SelfReference,

    #[error("Menu {parent_id} is a descendant of this menu; assigning it as parent would create a circular reference")]
    Circular { parent_id: i64 },
}

/// Ids of every descendant of `menu_id`, walking the reverse-parent index
/// depth first. `links` holds `(id, parent_id)` for every known menu.
pub fn descendant_ids(menu_id: i64, links: &[(i64, Option<i64>)]) -> HashSet<i64> {
    let mut by_parent: HashMap<i64, Vec<i64>> = HashMap::new();
    for &(id, parent_id) in links {
        if let Some(parent_id) = parent_id {
            by_parent.entry(parent_id).or_default().push(id);
        }
    }

    let mut found = HashSet::new();
    let mut stack = vec![menu_id];
    while let Some(current) = stack.pop() {
        if let Some(kids) = by_parent.get(&current) {
            for &kid in kids {
                if kid != menu_id && found.insert(kid) {
                    stack.push(kid);
                }
            }
        }
    }
    found
}

/// Check that `proposed_parent` may become the parent of `menu_id`
pub fn ensure_valid_parent(
    menu_id: i64,
    proposed_parent: Option<i64>,
    links: &[(i64, Option<i64>)],
) -> Result<(), ParentError> {
    let Some(parent_id) = proposed_parent else {
        return Ok(());
    };

    if parent_id == menu_id {
        return Err(ParentError::SelfReference);
    }
    if descendant_ids(menu_id, links).contains(&parent_id) {
        return Err(ParentError::Circular { parent_id });
    }
    Ok(())
}
