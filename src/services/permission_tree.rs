//! Presentation tree of permissions: menu, then permission type, then the
//! permission itself. A type with a single permission skips the intermediate
//! node and hangs the permission directly under its menu.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::{menu, permission, PermissionType};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionTreeNode {
    pub id: String,
    pub key: String,
    pub label: String,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(flatten)]
    pub kind: PermissionNodeKind,
}

/// Variant-specific part of a node, serialized under the `type` tag
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PermissionNodeKind {
    Menu {
        icon: Option<String>,
        is_active: bool,
        children: Vec<PermissionTreeNode>,
    },
    PermissionType {
        children: Vec<PermissionTreeNode>,
    },
    Permission {
        is_active: bool,
        is_system_permission: bool,
        data: PermissionLeafData,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionLeafData {
    pub permission_id: i64,
    pub menu_id: i64,
    pub permission_type: PermissionType,
}

impl PermissionTreeNode {
    pub fn children(&self) -> &[PermissionTreeNode] {
        match &self.kind {
            PermissionNodeKind::Menu { children, .. }
            | PermissionNodeKind::PermissionType { children } => children,
            PermissionNodeKind::Permission { .. } => &[],
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, PermissionNodeKind::Permission { .. })
    }
}

struct MenuGroup {
    menu: menu::Model,
    by_type: BTreeMap<PermissionType, Vec<permission::Model>>,
}

/// Build the tree from permissions paired with their owning menu.
///
/// Permissions whose menu did not resolve are skipped.
pub fn build_permission_tree(
    rows: Vec<(permission::Model, Option<menu::Model>)>,
) -> Vec<PermissionTreeNode> {
    let mut groups: HashMap<i64, MenuGroup> = HashMap::new();

    for (perm, menu) in rows {
        let Some(menu) = menu else {
            tracing::warn!(
                permission_id = perm.id,
                menu_id = perm.menu_id,
                "Permission references a missing menu, skipping"
            );
            continue;
        };
        groups
            .entry(menu.id)
            .or_insert_with(|| MenuGroup {
                menu,
                by_type: BTreeMap::new(),
            })
            .by_type
            .entry(perm.permission_type)
            .or_default()
            .push(perm);
    }

    let mut groups: Vec<MenuGroup> = groups.into_values().collect();
    groups.sort_by(|a, b| {
        a.menu
            .sort_order
            .cmp(&b.menu.sort_order)
            .then_with(|| a.menu.display_name.cmp(&b.menu.display_name))
            .then_with(|| a.menu.id.cmp(&b.menu.id))
    });

    groups.into_iter().map(menu_node).collect()
}

fn menu_node(group: MenuGroup) -> PermissionTreeNode {
    let MenuGroup { menu, by_type } = group;
    let menu_node_id = format!("menu-{}", menu.id);

    let mut children = Vec::new();
    for (permission_type, mut perms) in by_type {
        perms.sort_by(|a, b| a.key.cmp(&b.key));

        if perms.len() == 1 {
            children.extend(perms.into_iter().map(|p| leaf(p, &menu_node_id)));
            continue;
        }

        let type_node_id = format!("type-{}-{}", menu.id, permission_type);
        let leaves = perms
            .into_iter()
            .map(|p| leaf(p, &type_node_id))
            .collect();
        children.push(PermissionTreeNode {
            key: format!("{}.{}", menu.name, permission_type.to_string().to_lowercase()),
            label: format!("{} Operations", permission_type),
            description: Some(format!(
                "{} operations for {}",
                permission_type, menu.display_name
            )),
            parent_id: Some(menu_node_id.clone()),
            kind: PermissionNodeKind::PermissionType { children: leaves },
            id: type_node_id,
        });
    }

    PermissionTreeNode {
        id: menu_node_id,
        key: menu.name,
        label: menu.display_name,
        description: menu.description,
        parent_id: None,
        kind: PermissionNodeKind::Menu {
            icon: menu.icon,
            is_active: menu.is_active,
            children,
        },
    }
}

fn leaf(perm: permission::Model, parent_id: &str) -> PermissionTreeNode {
    PermissionTreeNode {
        id: format!("permission-{}", perm.id),
        key: perm.key,
        label: perm.display_name,
        description: perm.description,
        parent_id: Some(parent_id.to_string()),
        kind: PermissionNodeKind::Permission {
            is_active: perm.is_active,
            is_system_permission: perm.is_system_permission,
            data: PermissionLeafData {
                permission_id: perm.id,
                menu_id: perm.menu_id,
                permission_type: perm.permission_type,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MenuType;
    use chrono::Utc;

    fn menu(id: i64, sort_order: i32, display_name: &str) -> menu::Model {
        let now = Utc::now();
        menu::Model {
            id,
            name: display_name.to_lowercase(),
            display_name: display_name.to_string(),
            description: None,
            icon: Some("icon".to_string()),
            route: None,
            menu_type: MenuType::Admin,
            parent_id: None,
            sort_order,
            is_active: true,
            created_at: now,
            updated_at: now,
            created_by: None,
            updated_by: None,
        }
    }

    fn perm(
        id: i64,
        key: &str,
        permission_type: PermissionType,
        menu_id: i64,
    ) -> permission::Model {
        let now = Utc::now();
        permission::Model {
            id,
            key: key.to_string(),
            display_name: key.to_string(),
            description: None,
            permission_type,
            menu_id,
            is_active: true,
            is_system_permission: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_single_permission_of_a_type_is_direct_leaf() {
        let users = menu(1, 0, "Users");
        let tree = build_permission_tree(vec![(
            perm(10, "users.view", PermissionType::View, 1),
            Some(users),
        )]);

        assert_eq!(tree.len(), 1);
        let children = tree[0].children();
        assert_eq!(children.len(), 1);
        assert!(children[0].is_leaf());
        assert_eq!(children[0].key, "users.view");
        assert_eq!(children[0].parent_id.as_deref(), Some("menu-1"));
    }

    #[test]
    fn test_multiple_permissions_of_a_type_get_operations_node() {
        let users = menu(1, 0, "Users");
        let tree = build_permission_tree(vec![
            (perm(11, "users.view_audit", PermissionType::View, 1), Some(users.clone())),
            (perm(10, "users.view", PermissionType::View, 1), Some(users)),
        ]);

        let children = tree[0].children();
        assert_eq!(children.len(), 1);
        let group = &children[0];
        assert_eq!(group.label, "View Operations");
        assert_eq!(group.id, "type-1-View");
        assert!(matches!(group.kind, PermissionNodeKind::PermissionType { .. }));

        let keys: Vec<&str> = group.children().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["users.view", "users.view_audit"]);
        assert!(group
            .children()
            .iter()
            .all(|c| c.parent_id.as_deref() == Some("type-1-View")));
    }

    #[test]
    fn test_type_groups_follow_enum_order() {
        let roles = menu(2, 0, "Roles");
        let tree = build_permission_tree(vec![
            (perm(4, "roles.delete", PermissionType::Delete, 2), Some(roles.clone())),
            (perm(2, "roles.create", PermissionType::Create, 2), Some(roles.clone())),
            (perm(3, "roles.edit", PermissionType::Edit, 2), Some(roles.clone())),
            (perm(1, "roles.view", PermissionType::View, 2), Some(roles)),
        ]);

        let keys: Vec<&str> = tree[0].children().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["roles.view", "roles.create", "roles.edit", "roles.delete"]
        );
    }

    #[test]
    fn test_menus_sorted_and_unresolved_skipped() {
        let tree = build_permission_tree(vec![
            (perm(1, "b.view", PermissionType::View, 2), Some(menu(2, 20, "B"))),
            (perm(2, "a.view", PermissionType::View, 1), Some(menu(1, 10, "A"))),
            (perm(3, "ghost.view", PermissionType::View, 99), None),
        ]);

        let labels: Vec<&str> = tree.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B"]);
    }

    #[test]
    fn test_serialized_shape() {
        let tree = build_permission_tree(vec![(
            perm(10, "users.view", PermissionType::View, 1),
            Some(menu(1, 0, "Users")),
        )]);

        let json = serde_json::to_value(&tree).unwrap();
        let menu_node = &json[0];
        assert_eq!(menu_node["type"], "menu");
        assert_eq!(menu_node["isActive"], true);
        assert_eq!(menu_node["icon"], "icon");

        let leaf = &menu_node["children"][0];
        assert_eq!(leaf["type"], "permission");
        assert_eq!(leaf["parentId"], "menu-1");
        assert_eq!(leaf["isSystemPermission"], false);
        assert_eq!(leaf["data"]["permissionType"], "View");
        assert!(leaf.get("children").is_none());
    }
}
