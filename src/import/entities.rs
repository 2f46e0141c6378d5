//! Relational entity import: integrations, dashboards, widgets and groups
//!
//! Every record is imported on its own; a failure is reported against that
//! record and the loop moves on.

use chrono::Utc;
use tracing::debug;

use crate::models::{
    Dashboard, DashboardId, Group, GroupMember, Integration, IntegrationId, Widget, WidgetId,
};
use crate::package::{ExportedDashboard, ExportedGroup, ExportedIntegration, ExportedWidget};

use super::orchestrator::ImportContext;
use super::result::Outcome;

/// Import every integration, deduplicating by name and type
pub fn import_integrations(ctx: &mut ImportContext<'_>) {
    let snapshot = ctx.snapshot;
    for record in snapshot.integrations.iter().cloned() {
        let outcome = record
            .into_result("Integration")
            .and_then(|exported| import_integration(ctx, exported));
        ctx.result.integrations.record(outcome);
    }
}

fn import_integration(
    ctx: &mut ImportContext<'_>,
    exported: ExportedIntegration,
) -> Result<Outcome, String> {
    let label = format!("Integration '{}'", exported.name);

    let existing = ctx
        .storage
        .integrations
        .find_matching(&exported.name, &exported.integration_type)
        .map_err(|e| format!("{}: {}", label, e))?;
    if let Some(existing) = existing {
        debug!(name = %exported.name, "Reusing existing integration");
        ctx.remap.record_integration(&exported.id, existing.id);
        return Ok(Outcome::Skipped);
    }

    let mut config = exported.config;
    let secrets = ctx
        .credentials
        .as_ref()
        .and_then(|credentials| credentials.get(&exported.id));
    config.restore_secrets(secrets);

    let now = Utc::now();
    let integration = Integration {
        id: IntegrationId::new(),
        name: exported.name,
        integration_type: exported.integration_type,
        enabled: exported.enabled,
        config,
        created_at: now,
        updated_at: now,
    };
    let new_id = integration.id;

    ctx.storage
        .integrations
        .upsert(integration)
        .map_err(|e| format!("{}: {}", label, e))?;
    ctx.remap.record_integration(&exported.id, new_id);
    Ok(Outcome::Imported)
}

/// Import dashboards with their widgets and groups
pub fn import_dashboards(ctx: &mut ImportContext<'_>) {
    let snapshot = ctx.snapshot;
    for record in snapshot.dashboards.iter().cloned() {
        let exported = match record.into_result("Dashboard") {
            Ok(exported) => exported,
            Err(message) => {
                ctx.result.dashboards.record(Err(message));
                continue;
            }
        };

        match import_dashboard(ctx, &exported) {
            Ok(outcome) => ctx.result.dashboards.record(Ok(outcome)),
            Err(message) => {
                ctx.result.dashboards.record(Err(message));
                continue;
            }
        }
        let Some(dashboard_id) = ctx.remap.map_dashboard(&exported.id) else {
            continue;
        };

        for widget in exported.widgets {
            let outcome = widget
                .into_result("Widget")
                .and_then(|w| import_widget(ctx, dashboard_id, &w).map(|_| Outcome::Imported));
            ctx.result.widgets.record(outcome);
        }

        for group in exported.groups {
            let outcome = group
                .into_result("Group")
                .and_then(|g| import_group(ctx, dashboard_id, g));
            ctx.result.groups.record(outcome);
        }
    }
}

/// Reuse a same-named dashboard or create one, recording the id mapping
fn import_dashboard(
    ctx: &mut ImportContext<'_>,
    exported: &ExportedDashboard,
) -> Result<Outcome, String> {
    let label = format!("Dashboard '{}'", exported.name);
    let repo = &ctx.storage.dashboards;

    if let Some(existing) = repo
        .get_dashboard_by_name(&exported.name)
        .map_err(|e| format!("{}: {}", label, e))?
    {
        ctx.remap.record_dashboard(&exported.id, existing.id);
        return Ok(Outcome::Skipped);
    }

    let has_default = repo
        .has_default_dashboard()
        .map_err(|e| format!("{}: {}", label, e))?;

    let mut dashboard = Dashboard::new(exported.name.clone());
    dashboard.description = exported.description.clone();
    dashboard.is_default = exported.is_default && !has_default;
    dashboard.sort_order = exported.sort_order;
    dashboard.settings = exported.settings.clone();
    let id = dashboard.id;

    repo.upsert_dashboard(dashboard)
        .map_err(|e| format!("{}: {}", label, e))?;
    ctx.remap.record_dashboard(&exported.id, id);
    Ok(Outcome::Imported)
}

/// Create a widget under a fresh id. Integration references that do not
/// resolve through the remap table are dropped rather than kept dangling.
fn import_widget(
    ctx: &mut ImportContext<'_>,
    dashboard_id: DashboardId,
    exported: &ExportedWidget,
) -> Result<WidgetId, String> {
    let label = if exported.title.is_empty() {
        format!("Widget '{}'", exported.id)
    } else {
        format!("Widget '{}'", exported.title)
    };

    let mut config = exported.config.clone();
    let config_ref = config
        .integration_id
        .as_deref()
        .and_then(|old| ctx.remap.map_integration(old));
    if config.integration_id.is_some() {
        config.set_integration_ref(config_ref);
    }

    let mut widget = Widget::new(dashboard_id, exported.widget_type.clone());
    widget.title = exported.title.clone();
    widget.integration_id = exported
        .integration_id
        .as_deref()
        .and_then(|old| ctx.remap.map_integration(old));
    widget.config = config;
    let id = widget.id;

    ctx.storage
        .dashboards
        .insert_placed_widget(widget, exported.layout)
        .map_err(|e| format!("{}: {}", label, e))?;
    ctx.remap.record_widget(&exported.id, id);

    Ok(id)
}

fn import_group(
    ctx: &mut ImportContext<'_>,
    dashboard_id: DashboardId,
    exported: ExportedGroup,
) -> Result<Outcome, String> {
    let label = format!("Group '{}'", exported.name);

    let mut group = Group::new(dashboard_id, exported.name.clone());
    group.config = exported.config;
    let group_id = group.id;

    ctx.storage
        .dashboards
        .insert_placed_group(group, exported.layout)
        .map_err(|e| format!("{}: {}", label, e))?;

    for member in exported.members {
        let outcome = member.into_result("Group member").and_then(|member| {
            let widget_id = match ctx.remap.map_widget(&member.widget_id) {
                Some(id) => id,
                None => {
                    let widget = member.widget.as_ref().ok_or_else(|| {
                        format!(
                            "{}: member references unknown widget '{}'",
                            label, member.widget_id
                        )
                    })?;
                    let imported = import_widget(ctx, dashboard_id, widget);
                    let id = imported.as_ref().ok().copied();
                    ctx.result
                        .widgets
                        .record(imported.map(|_| Outcome::Imported));
                    id.ok_or_else(|| {
                        format!(
                            "{}: member '{}' skipped because its widget failed",
                            label, member.widget_id
                        )
                    })?
                }
            };

            ctx.storage
                .dashboards
                .add_member(GroupMember {
                    group_id,
                    widget_id,
                    position: member.position,
                })
                .map_err(|e| format!("{}: member '{}': {}", label, member.widget_id, e))?;
            Ok(Outcome::Imported)
        });
        ctx.result.group_members.record(outcome);
    }

    Ok(Outcome::Imported)
}
