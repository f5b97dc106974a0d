//! Sidebar navigation built from the core sections and plugin entries.

use serde::Serialize;

use crate::registry::PluginNavItem;

/// Icon used by core sections and by plugins without their own.
pub const DEFAULT_ICON: &str = "SquareTerminal";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavSubItem {
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavItem {
    pub title: String,
    pub icon: String,
    pub is_active: bool,
    pub items: Vec<NavSubItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavData {
    pub nav_main: Vec<NavItem>,
    pub nav_secondary: Vec<NavItem>,
}

/// URL of a navigation sub-item inside a workspace.
///
/// Plugin sub-items carry a multi-segment route as their slug; those map to
/// `/workspace/{workspace}/{slug}`. Core sub-items are nested under the
/// kebab-cased parent title.
pub fn generate_nav_url(workspace_slug: &str, parent: &NavItem, sub: &NavSubItem) -> String {
    if sub.slug.contains('/') {
        format!("/workspace/{workspace_slug}/{}", sub.slug)
    } else {
        format!(
            "/workspace/{workspace_slug}/{}/{}",
            kebab_title(&parent.title),
            sub.slug
        )
    }
}

/// Core sections followed by one section per plugin.
pub fn create_nav_data(plugin_items: &[PluginNavItem]) -> NavData {
    let mut nav_main = vec![
        NavItem {
            title: "Dashboard".to_string(),
            icon: DEFAULT_ICON.to_string(),
            is_active: true,
            items: vec![NavSubItem {
                title: "Overview".to_string(),
                slug: "overview".to_string(),
            }],
        },
        NavItem {
            title: "Settings".to_string(),
            icon: "Settings2".to_string(),
            is_active: false,
            items: vec![NavSubItem {
                title: "General".to_string(),
                slug: "general".to_string(),
            }],
        },
    ];

    nav_main.extend(plugin_items.iter().map(|plugin| NavItem {
        title: plugin.name.clone(),
        icon: plugin.icon.clone().unwrap_or_else(|| DEFAULT_ICON.to_string()),
        is_active: false,
        items: vec![NavSubItem {
            title: plugin.name.clone(),
            slug: plugin.route.clone(),
        }],
    }));

    NavData {
        nav_main,
        nav_secondary: Vec::new(),
    }
}

/// Lowercase, with each whitespace run replaced by a single `-`.
fn kebab_title(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
