//! Dashboard repository for JSON storage
//!
//! Manages dashboards together with everything placed on them (widgets,
//! standalone layouts, groups, group members and group layouts) in
//! dashboards.json. Keeping the tables together lets the repository enforce
//! referential constraints the way a relational store would: children must
//! point at existing parents, and parents cannot be deleted while children
//! still reference them.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::PackError;
use crate::models::{
    Dashboard, DashboardId, Group, GroupId, GroupLayout, GroupMember, LayoutRect, Widget,
    WidgetId, WidgetLayout,
};

use super::file_io::{read_json, write_json_atomic};

/// Serializable dashboard data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct DashboardData {
    #[serde(default)]
    pub dashboards: Vec<Dashboard>,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub widget_layouts: Vec<WidgetLayout>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub group_members: Vec<GroupMember>,
    #[serde(default)]
    pub group_layouts: Vec<GroupLayout>,
}

#[derive(Default)]
struct Tables {
    dashboards: HashMap<DashboardId, Dashboard>,
    widgets: HashMap<WidgetId, Widget>,
    widget_layouts: HashMap<WidgetId, WidgetLayout>,
    groups: HashMap<GroupId, Group>,
    group_members: Vec<GroupMember>,
    group_layouts: HashMap<GroupId, GroupLayout>,
}

/// Repository for dashboard persistence
pub struct DashboardRepository {
    path: PathBuf,
    tables: RwLock<Tables>,
}

impl DashboardRepository {
    /// Create a new dashboard repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            tables: RwLock::new(Tables::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, PackError> {
        self.tables
            .read()
            .map_err(|e| PackError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, PackError> {
        self.tables
            .write()
            .map_err(|e| PackError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Load dashboards from disk
    pub fn load(&self) -> Result<(), PackError> {
        let file_data: DashboardData = read_json(&self.path)?;
        let mut tables = self.write()?;

        *tables = Tables {
            dashboards: file_data
                .dashboards
                .into_iter()
                .map(|d| (d.id, d))
                .collect(),
            widgets: file_data.widgets.into_iter().map(|w| (w.id, w)).collect(),
            widget_layouts: file_data
                .widget_layouts
                .into_iter()
                .map(|l| (l.widget_id, l))
                .collect(),
            groups: file_data.groups.into_iter().map(|g| (g.id, g)).collect(),
            group_members: file_data.group_members,
            group_layouts: file_data
                .group_layouts
                .into_iter()
                .map(|l| (l.group_id, l))
                .collect(),
        };

        Ok(())
    }

    /// Save dashboards to disk
    pub fn save(&self) -> Result<(), PackError> {
        let tables = self.read()?;

        let mut dashboards: Vec<_> = tables.dashboards.values().cloned().collect();
        sort_dashboards(&mut dashboards);

        let mut widgets: Vec<_> = tables.widgets.values().cloned().collect();
        widgets.sort_by_key(|w| (w.dashboard_id, w.created_at, w.id));

        let mut widget_layouts: Vec<_> = tables.widget_layouts.values().copied().collect();
        widget_layouts.sort_by_key(|l| (l.dashboard_id, l.rect.y, l.rect.x, l.widget_id));

        let mut groups: Vec<_> = tables.groups.values().cloned().collect();
        groups.sort_by_key(|g| (g.dashboard_id, g.created_at, g.id));

        let mut group_layouts: Vec<_> = tables.group_layouts.values().copied().collect();
        group_layouts.sort_by_key(|l| (l.dashboard_id, l.rect.y, l.rect.x, l.group_id));

        let file_data = DashboardData {
            dashboards,
            widgets,
            widget_layouts,
            groups,
            group_members: tables.group_members.clone(),
            group_layouts,
        };

        write_json_atomic(&self.path, &file_data)
    }

    // Dashboard operations

    /// Get a dashboard by ID
    pub fn get_dashboard(&self, id: DashboardId) -> Result<Option<Dashboard>, PackError> {
        Ok(self.read()?.dashboards.get(&id).cloned())
    }

    /// Get all dashboards, default first, then by name
    pub fn get_all_dashboards(&self) -> Result<Vec<Dashboard>, PackError> {
        let mut list: Vec<_> = self.read()?.dashboards.values().cloned().collect();
        sort_dashboards(&mut list);
        Ok(list)
    }

    /// Get a dashboard by name (case-insensitive)
    pub fn get_dashboard_by_name(&self, name: &str) -> Result<Option<Dashboard>, PackError> {
        let name_lower = name.to_lowercase();
        Ok(self
            .read()?
            .dashboards
            .values()
            .find(|d| d.name.to_lowercase() == name_lower)
            .cloned())
    }

    /// Whether any dashboard is flagged as default
    pub fn has_default_dashboard(&self) -> Result<bool, PackError> {
        Ok(self.read()?.dashboards.values().any(|d| d.is_default))
    }

    /// Insert or update a dashboard
    pub fn upsert_dashboard(&self, dashboard: Dashboard) -> Result<(), PackError> {
        dashboard
            .validate()
            .map_err(|e| PackError::Validation(e.to_string()))?;

        let mut tables = self.write()?;
        let name_lower = dashboard.name.to_lowercase();
        if tables
            .dashboards
            .values()
            .any(|d| d.id != dashboard.id && d.name.to_lowercase() == name_lower)
        {
            return Err(PackError::Duplicate {
                entity_type: "Dashboard",
                identifier: dashboard.name,
            });
        }

        tables.dashboards.insert(dashboard.id, dashboard);
        Ok(())
    }

    /// Delete a dashboard that no longer has widgets or groups
    pub fn delete_dashboard(&self, id: DashboardId) -> Result<bool, PackError> {
        let mut tables = self.write()?;

        let in_use = tables.widgets.values().any(|w| w.dashboard_id == id)
            || tables.groups.values().any(|g| g.dashboard_id == id);
        if in_use {
            return Err(PackError::Storage(format!(
                "Dashboard {} still has widgets or groups",
                id
            )));
        }

        Ok(tables.dashboards.remove(&id).is_some())
    }

    // Widget operations

    /// Get a widget by ID
    pub fn get_widget(&self, id: WidgetId) -> Result<Option<Widget>, PackError> {
        Ok(self.read()?.widgets.get(&id).cloned())
    }

    /// Get all widgets
    pub fn get_all_widgets(&self) -> Result<Vec<Widget>, PackError> {
        let mut list: Vec<_> = self.read()?.widgets.values().cloned().collect();
        list.sort_by_key(|w| (w.dashboard_id, w.created_at, w.id));
        Ok(list)
    }

    /// Get the widgets of one dashboard in creation order
    pub fn get_widgets_for(&self, dashboard_id: DashboardId) -> Result<Vec<Widget>, PackError> {
        let mut list: Vec<_> = self
            .read()?
            .widgets
            .values()
            .filter(|w| w.dashboard_id == dashboard_id)
            .cloned()
            .collect();
        list.sort_by_key(|w| (w.created_at, w.id));
        Ok(list)
    }

    /// Insert or update a widget; its dashboard must exist
    pub fn upsert_widget(&self, widget: Widget) -> Result<(), PackError> {
        widget
            .validate()
            .map_err(|e| PackError::Validation(e.to_string()))?;

        let mut tables = self.write()?;
        if !tables.dashboards.contains_key(&widget.dashboard_id) {
            return Err(PackError::dashboard_not_found(widget.dashboard_id.to_string()));
        }

        tables.widgets.insert(widget.id, widget);
        Ok(())
    }

    /// Insert a widget together with its standalone layout, if any. Either
    /// both are stored or neither is.
    pub fn insert_placed_widget(
        &self,
        widget: Widget,
        rect: Option<LayoutRect>,
    ) -> Result<(), PackError> {
        widget
            .validate()
            .map_err(|e| PackError::Validation(e.to_string()))?;

        let mut tables = self.write()?;
        if !tables.dashboards.contains_key(&widget.dashboard_id) {
            return Err(PackError::dashboard_not_found(widget.dashboard_id.to_string()));
        }

        if let Some(rect) = rect {
            tables.widget_layouts.insert(
                widget.id,
                WidgetLayout {
                    widget_id: widget.id,
                    dashboard_id: widget.dashboard_id,
                    rect,
                },
            );
        }
        tables.widgets.insert(widget.id, widget);
        Ok(())
    }

    // Layout operations

    /// Get the standalone layout of a widget
    pub fn get_widget_layout(&self, widget_id: WidgetId) -> Result<Option<WidgetLayout>, PackError> {
        Ok(self.read()?.widget_layouts.get(&widget_id).copied())
    }

    /// Place a widget on its dashboard
    pub fn set_widget_layout(&self, layout: WidgetLayout) -> Result<(), PackError> {
        let mut tables = self.write()?;

        let widget = tables
            .widgets
            .get(&layout.widget_id)
            .ok_or_else(|| PackError::widget_not_found(layout.widget_id.to_string()))?;
        if widget.dashboard_id != layout.dashboard_id {
            return Err(PackError::Validation(format!(
                "Widget {} does not belong to dashboard {}",
                layout.widget_id, layout.dashboard_id
            )));
        }

        tables.widget_layouts.insert(layout.widget_id, layout);
        Ok(())
    }

    // Group operations

    /// Get a group by ID
    pub fn get_group(&self, id: GroupId) -> Result<Option<Group>, PackError> {
        Ok(self.read()?.groups.get(&id).cloned())
    }

    /// Get all groups
    pub fn get_all_groups(&self) -> Result<Vec<Group>, PackError> {
        let mut list: Vec<_> = self.read()?.groups.values().cloned().collect();
        list.sort_by_key(|g| (g.dashboard_id, g.created_at, g.id));
        Ok(list)
    }

    /// Get the groups of one dashboard in creation order
    pub fn get_groups_for(&self, dashboard_id: DashboardId) -> Result<Vec<Group>, PackError> {
        let mut list: Vec<_> = self
            .read()?
            .groups
            .values()
            .filter(|g| g.dashboard_id == dashboard_id)
            .cloned()
            .collect();
        list.sort_by_key(|g| (g.created_at, g.id));
        Ok(list)
    }

    /// Insert or update a group; its dashboard must exist
    pub fn upsert_group(&self, group: Group) -> Result<(), PackError> {
        group.validate().map_err(PackError::Validation)?;

        let mut tables = self.write()?;
        if !tables.dashboards.contains_key(&group.dashboard_id) {
            return Err(PackError::dashboard_not_found(group.dashboard_id.to_string()));
        }

        tables.groups.insert(group.id, group);
        Ok(())
    }

    /// Insert a group together with its layout, if any. Either both are
    /// stored or neither is.
    pub fn insert_placed_group(
        &self,
        group: Group,
        rect: Option<LayoutRect>,
    ) -> Result<(), PackError> {
        group.validate().map_err(PackError::Validation)?;

        let mut tables = self.write()?;
        if !tables.dashboards.contains_key(&group.dashboard_id) {
            return Err(PackError::dashboard_not_found(group.dashboard_id.to_string()));
        }

        if let Some(rect) = rect {
            tables.group_layouts.insert(
                group.id,
                GroupLayout {
                    group_id: group.id,
                    dashboard_id: group.dashboard_id,
                    rect,
                },
            );
        }
        tables.groups.insert(group.id, group);
        Ok(())
    }

    /// Get the layout of a group
    pub fn get_group_layout(&self, group_id: GroupId) -> Result<Option<GroupLayout>, PackError> {
        Ok(self.read()?.group_layouts.get(&group_id).copied())
    }

    /// Place a group on its dashboard
    pub fn set_group_layout(&self, layout: GroupLayout) -> Result<(), PackError> {
        let mut tables = self.write()?;

        let group = tables
            .groups
            .get(&layout.group_id)
            .ok_or_else(|| PackError::group_not_found(layout.group_id.to_string()))?;
        if group.dashboard_id != layout.dashboard_id {
            return Err(PackError::Validation(format!(
                "Group {} does not belong to dashboard {}",
                layout.group_id, layout.dashboard_id
            )));
        }

        tables.group_layouts.insert(layout.group_id, layout);
        Ok(())
    }

    /// Members of a group ordered by position
    pub fn get_members(&self, group_id: GroupId) -> Result<Vec<GroupMember>, PackError> {
        let mut members: Vec<_> = self
            .read()?
            .group_members
            .iter()
            .filter(|m| m.group_id == group_id)
            .copied()
            .collect();
        members.sort_by_key(|m| m.position);
        Ok(members)
    }

    /// Add a widget to a group; both must exist and share a dashboard
    pub fn add_member(&self, member: GroupMember) -> Result<(), PackError> {
        let mut tables = self.write()?;

        let group = tables
            .groups
            .get(&member.group_id)
            .ok_or_else(|| PackError::group_not_found(member.group_id.to_string()))?;
        let widget = tables
            .widgets
            .get(&member.widget_id)
            .ok_or_else(|| PackError::widget_not_found(member.widget_id.to_string()))?;
        if group.dashboard_id != widget.dashboard_id {
            return Err(PackError::Validation(format!(
                "Widget {} and group {} are on different dashboards",
                member.widget_id, member.group_id
            )));
        }

        if tables
            .group_members
            .iter()
            .any(|m| m.group_id == member.group_id && m.widget_id == member.widget_id)
        {
            return Err(PackError::Duplicate {
                entity_type: "Group member",
                identifier: member.widget_id.to_string(),
            });
        }

        tables.group_members.push(member);
        Ok(())
    }

    /// Whether a widget belongs to any group
    pub fn is_grouped(&self, widget_id: WidgetId) -> Result<bool, PackError> {
        Ok(self
            .read()?
            .group_members
            .iter()
            .any(|m| m.widget_id == widget_id))
    }

    // Bulk deletion, child tables first

    /// Remove every group member row
    pub fn clear_group_members(&self) -> Result<usize, PackError> {
        let mut tables = self.write()?;
        let count = tables.group_members.len();
        tables.group_members.clear();
        Ok(count)
    }

    /// Remove every group layout row
    pub fn clear_group_layouts(&self) -> Result<usize, PackError> {
        let mut tables = self.write()?;
        let count = tables.group_layouts.len();
        tables.group_layouts.clear();
        Ok(count)
    }

    /// Remove every group; members and layouts must already be gone
    pub fn clear_groups(&self) -> Result<usize, PackError> {
        let mut tables = self.write()?;
        if !tables.group_members.is_empty() || !tables.group_layouts.is_empty() {
            return Err(PackError::Storage(
                "Cannot delete groups while members or layouts reference them".into(),
            ));
        }
        let count = tables.groups.len();
        tables.groups.clear();
        Ok(count)
    }

    /// Remove every standalone widget layout
    pub fn clear_widget_layouts(&self) -> Result<usize, PackError> {
        let mut tables = self.write()?;
        let count = tables.widget_layouts.len();
        tables.widget_layouts.clear();
        Ok(count)
    }

    /// Remove every widget; layouts and memberships must already be gone
    pub fn clear_widgets(&self) -> Result<usize, PackError> {
        let mut tables = self.write()?;
        if !tables.widget_layouts.is_empty() || !tables.group_members.is_empty() {
            return Err(PackError::Storage(
                "Cannot delete widgets while layouts or group members reference them".into(),
            ));
        }
        let count = tables.widgets.len();
        tables.widgets.clear();
        Ok(count)
    }

    /// Remove every dashboard; widgets and groups must already be gone
    pub fn clear_dashboards(&self) -> Result<usize, PackError> {
        let mut tables = self.write()?;
        if !tables.widgets.is_empty() || !tables.groups.is_empty() {
            return Err(PackError::Storage(
                "Cannot delete dashboards while widgets or groups reference them".into(),
            ));
        }
        let count = tables.dashboards.len();
        tables.dashboards.clear();
        Ok(count)
    }

    // Counts

    /// Count dashboards
    pub fn dashboard_count(&self) -> Result<usize, PackError> {
        Ok(self.read()?.dashboards.len())
    }

    /// Count widgets
    pub fn widget_count(&self) -> Result<usize, PackError> {
        Ok(self.read()?.widgets.len())
    }

    /// Count groups
    pub fn group_count(&self) -> Result<usize, PackError> {
        Ok(self.read()?.groups.len())
    }
}

/// Default dashboard first, then by name
fn sort_dashboards(list: &mut [Dashboard]) {
    list.sort_by(|a, b| {
        b.is_default
            .cmp(&a.is_default)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, DashboardRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dashboards.json");
        let repo = DashboardRepository::new(path);
        (temp_dir, repo)
    }

    fn seed(repo: &DashboardRepository) -> (Dashboard, Widget, Group) {
        let dashboard = Dashboard::new("Home");
        repo.upsert_dashboard(dashboard.clone()).unwrap();

        let widget = Widget::new(dashboard.id, "clock").with_title("Clock");
        repo.upsert_widget(widget.clone()).unwrap();
        repo.set_widget_layout(WidgetLayout {
            widget_id: widget.id,
            dashboard_id: dashboard.id,
            rect: LayoutRect::new(0, 0, 2, 2),
        })
        .unwrap();

        let group = Group::new(dashboard.id, "Status");
        repo.upsert_group(group.clone()).unwrap();
        repo.add_member(GroupMember {
            group_id: group.id,
            widget_id: widget.id,
            position: 0,
        })
        .unwrap();

        (dashboard, widget, group)
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.dashboard_count().unwrap(), 0);
    }

    #[test]
    fn test_dashboard_ordering_default_first() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert_dashboard(Dashboard::new("beta")).unwrap();
        let mut main = Dashboard::new("Zeta");
        main.is_default = true;
        repo.upsert_dashboard(main).unwrap();
        repo.upsert_dashboard(Dashboard::new("Alpha")).unwrap();

        let names: Vec<_> = repo
            .get_all_dashboards()
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "beta"]);
    }

    #[test]
    fn test_duplicate_dashboard_name_rejected() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert_dashboard(Dashboard::new("Home")).unwrap();
        let err = repo.upsert_dashboard(Dashboard::new("home")).unwrap_err();
        assert!(matches!(err, PackError::Duplicate { .. }));
    }

    #[test]
    fn test_widget_requires_dashboard() {
        let (_temp_dir, repo) = create_test_repo();
        let widget = Widget::new(DashboardId::new(), "clock");
        assert!(repo.upsert_widget(widget).unwrap_err().is_not_found());
    }

    #[test]
    fn test_placed_widget_is_all_or_nothing() {
        let (_temp_dir, repo) = create_test_repo();
        let dashboard = Dashboard::new("Home");
        repo.upsert_dashboard(dashboard.clone()).unwrap();

        let placed = Widget::new(dashboard.id, "clock");
        repo.insert_placed_widget(placed.clone(), Some(LayoutRect::new(0, 0, 2, 2)))
            .unwrap();
        assert!(repo.get_widget_layout(placed.id).unwrap().is_some());

        let orphan = Widget::new(DashboardId::new(), "clock");
        assert!(repo
            .insert_placed_widget(orphan.clone(), Some(LayoutRect::new(2, 0, 2, 2)))
            .is_err());
        let untyped = Widget::new(dashboard.id, " ");
        assert!(repo
            .insert_placed_widget(untyped.clone(), Some(LayoutRect::new(4, 0, 2, 2)))
            .is_err());

        assert_eq!(repo.widget_count().unwrap(), 1);
        assert!(repo.get_widget_layout(orphan.id).unwrap().is_none());
        assert!(repo.get_widget_layout(untyped.id).unwrap().is_none());
    }

    #[test]
    fn test_placed_group_is_all_or_nothing() {
        let (_temp_dir, repo) = create_test_repo();
        let orphan = Group::new(DashboardId::new(), "Status");
        assert!(repo
            .insert_placed_group(orphan.clone(), Some(LayoutRect::new(0, 0, 4, 2)))
            .is_err());
        assert_eq!(repo.group_count().unwrap(), 0);
        assert!(repo.get_group_layout(orphan.id).unwrap().is_none());
    }

    #[test]
    fn test_parent_delete_blocked_by_children() {
        let (_temp_dir, repo) = create_test_repo();
        let (dashboard, _, _) = seed(&repo);

        assert!(repo.delete_dashboard(dashboard.id).is_err());
        assert!(repo.clear_widgets().is_err());
        assert!(repo.clear_groups().is_err());
    }

    #[test]
    fn test_clear_child_before_parent() {
        let (_temp_dir, repo) = create_test_repo();
        seed(&repo);

        assert_eq!(repo.clear_group_members().unwrap(), 1);
        assert_eq!(repo.clear_group_layouts().unwrap(), 0);
        assert_eq!(repo.clear_groups().unwrap(), 1);
        assert_eq!(repo.clear_widget_layouts().unwrap(), 1);
        assert_eq!(repo.clear_widgets().unwrap(), 1);
        assert_eq!(repo.clear_dashboards().unwrap(), 1);
    }

    #[test]
    fn test_member_must_share_dashboard() {
        let (_temp_dir, repo) = create_test_repo();
        let (_, _, group) = seed(&repo);

        let other = Dashboard::new("Other");
        repo.upsert_dashboard(other.clone()).unwrap();
        let stray = Widget::new(other.id, "note");
        repo.upsert_widget(stray.clone()).unwrap();

        let err = repo
            .add_member(GroupMember {
                group_id: group.id,
                widget_id: stray.id,
                position: 1,
            })
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let (dashboard, widget, group) = seed(&repo);
        repo.save().unwrap();

        let repo2 = DashboardRepository::new(temp_dir.path().join("dashboards.json"));
        repo2.load().unwrap();

        assert_eq!(repo2.get_dashboard(dashboard.id).unwrap().unwrap().name, "Home");
        assert!(repo2.get_widget_layout(widget.id).unwrap().is_some());
        assert_eq!(repo2.get_members(group.id).unwrap().len(), 1);
        assert!(repo2.is_grouped(widget.id).unwrap());
    }
}
