//! Control panel command-line entry point.
//!
//! # Purpose
//! Drives the access-control store, editor, admin users, log feed and health
//! checks from the terminal.
//!
//! # Notes
//! Configuration comes from `PANEL_*` environment variables, optionally
//! overridden by the YAML file named in `PANEL_CONFIG`.
use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use controlpanel::api::AdminRole;
use controlpanel::app::PanelContext;
use controlpanel::config::PanelConfig;
use controlpanel::observability;
use controlpanel::view::format::PLACEHOLDER;
use controlpanel::view::{
    FeatureRow, GroupRow, StatusFilter, UserRolesDraft, VisibilityField, filter_features,
    filter_groups, summarize_users,
};
use panel_access::{AccessRole, FeatureStatus};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "controlpanel")]
#[command(about = "Admin control panel for feature access, users, logs and service health")]
struct Cli {
    /// JSON seed of access-control documents; reads bypass the admin backend
    #[arg(long, global = true)]
    documents: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List feature-access rules
    Features {
        /// Case-insensitive match on route, title key and area
        #[arg(long, default_value = "")]
        search: String,
        /// Status to show, or "all"
        #[arg(long, default_value = "all")]
        status: String,
    },
    /// List access groups
    Groups {
        /// Case-insensitive match on id and label
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Edit a feature-access rule and save the changed fields
    EditFeature {
        id: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        min_role: Option<String>,
        /// Add or remove a role from the allowed roles (repeatable)
        #[arg(long = "toggle-role")]
        toggle_roles: Vec<String>,
        /// Add or remove a group from the allowed groups (repeatable)
        #[arg(long = "toggle-group")]
        toggle_groups: Vec<String>,
        #[arg(long)]
        sidebar: Option<Switch>,
        #[arg(long)]
        topbar: Option<Switch>,
    },
    /// Edit an access group and save the changed fields
    EditGroup {
        id: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        min_role: Option<String>,
        #[arg(long = "toggle-role")]
        toggle_roles: Vec<String>,
        #[arg(long = "toggle-user")]
        toggle_users: Vec<String>,
    },
    /// Flip a feature's sidebar or topbar visibility
    SetVisibility {
        id: String,
        #[arg(long)]
        field: VisibilityField,
    },
    /// List admin users
    Users,
    /// Replace a user's roles
    SetRoles {
        user_id: String,
        #[arg(required = true)]
        roles: Vec<String>,
    },
    /// Print the admin log stream
    Logs {
        /// Number of pages to fetch
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Run every service health check once
    Health,
    /// Repeat health checks and serve /metrics until interrupted
    Watch {
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Switch {
    On,
    Off,
}

impl Switch {
    fn enabled(self) -> bool {
        matches!(self, Switch::On)
    }
}

fn parse_role(value: &str) -> AccessRole {
    AccessRole::from(value.trim().to_lowercase().as_str())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let metrics_handle = observability::init_observability("controlpanel");
    let config = PanelConfig::from_env_or_yaml().context("load control panel config")?;
    let ctx = PanelContext::new(config, cli.documents.as_deref())?;

    match cli.command {
        Command::Features { search, status } => {
            load_snapshot(&ctx).await?;
            let filter: StatusFilter = status.parse().unwrap_or_default();
            let features = ctx.store.features();
            let rows = filter_features(&features, &search, &filter);
            let now = Utc::now();
            println!("{} features", rows.len());
            for feature in rows {
                let row = FeatureRow::new(feature, now);
                println!(
                    "{:<10} {:<28} {:<14} {:<24} {:<10} {:<30} {:<24} {}",
                    row.status,
                    row.route,
                    row.area,
                    row.title_key,
                    row.min_role,
                    row.audience,
                    row.visibility,
                    row.updated
                );
            }
        }
        Command::Groups { search } => {
            load_snapshot(&ctx).await?;
            let groups = ctx.store.groups();
            let rows = filter_groups(&groups, &search);
            println!("{} groups", rows.len());
            for group in rows {
                let row = GroupRow::new(group);
                println!(
                    "{:<20} {:<20} {:<30} {:<10} {:<24} {:>5} {}",
                    row.id,
                    row.label,
                    row.description,
                    row.min_role,
                    row.allowed_roles,
                    row.members,
                    row.kind
                );
            }
        }
        Command::EditFeature {
            id,
            status,
            min_role,
            toggle_roles,
            toggle_groups,
            sidebar,
            topbar,
        } => {
            load_snapshot(&ctx).await?;
            ctx.editor.begin_feature_edit(&id)?;
            let draft = ctx.editor.edit_feature(&id, |draft| {
                if let Some(status) = &status {
                    draft.status = FeatureStatus::from(status.trim().to_lowercase().as_str());
                }
                if let Some(role) = &min_role {
                    draft.min_role = parse_role(role);
                }
                for role in &toggle_roles {
                    draft.toggle_role(parse_role(role));
                }
                for group in &toggle_groups {
                    draft.toggle_group(group.trim());
                }
                if let Some(switch) = sidebar {
                    draft.show_in_sidebar = switch.enabled();
                }
                if let Some(switch) = topbar {
                    draft.show_in_topbar = switch.enabled();
                }
            })?;
            if !draft.is_dirty() {
                println!("{id}: no changes");
                return Ok(());
            }
            ctx.editor.save_feature(&id).await?;
            if let Some(feature) = ctx.store.feature(&id) {
                let row = FeatureRow::new(&feature, Utc::now());
                println!(
                    "{id}: saved ({}, min role {}, {}, {})",
                    row.status, row.min_role, row.audience, row.visibility
                );
            }
        }
        Command::EditGroup {
            id,
            label,
            description,
            min_role,
            toggle_roles,
            toggle_users,
        } => {
            load_snapshot(&ctx).await?;
            ctx.editor.begin_group_edit(&id)?;
            let draft = ctx.editor.edit_group(&id, |draft| {
                if let Some(label) = label {
                    draft.label = label;
                }
                if let Some(description) = description {
                    draft.description = description;
                }
                if let Some(role) = &min_role {
                    draft.set_min_role(parse_role(role));
                }
                for role in &toggle_roles {
                    draft.toggle_role(parse_role(role));
                }
                for user in &toggle_users {
                    draft.toggle_user(user);
                }
            })?;
            if !draft.is_dirty() {
                println!("{id}: no changes");
                return Ok(());
            }
            ctx.editor.save_group(&id).await?;
            if let Some(group) = ctx.store.group(&id) {
                let row = GroupRow::new(&group);
                println!("{id}: saved ({}, {} members)", row.label, row.members);
            }
        }
        Command::SetVisibility { id, field } => {
            load_snapshot(&ctx).await?;
            let visible = ctx.editor.toggle_visibility(&id, field).await?;
            println!("{id}: {field} {}", if visible { "on" } else { "off" });
        }
        Command::Users => {
            let users = ctx.client.fetch_admin_users().await?;
            let summary = summarize_users(&users);
            println!(
                "{} users ({} admins, {} moderators, {} developers, {} suspended, {} banned)",
                summary.total,
                summary.admins,
                summary.moderators,
                summary.developers,
                summary.suspended,
                summary.banned
            );
            for user in &users {
                let roles: Vec<&str> = user.roles.iter().map(AdminRole::label).collect();
                println!(
                    "{:<28} {:<24} {:<10} {:<36} {}",
                    user.user_id,
                    user.display_name.as_deref().unwrap_or(PLACEHOLDER),
                    user.status.as_str(),
                    roles.join(", "),
                    if user.is_system { "system" } else { "" }
                );
            }
        }
        Command::SetRoles { user_id, roles } => {
            let users = ctx.client.fetch_admin_users().await?;
            let user = users
                .iter()
                .find(|user| user.user_id == user_id || user.id == user_id)
                .with_context(|| format!("unknown user: {user_id}"))?;
            let mut draft = UserRolesDraft::new(user);
            let wanted = roles
                .iter()
                .map(|role| {
                    AdminRole::from_alias(role).with_context(|| format!("unknown role: {role}"))
                })
                .collect::<Result<Vec<_>>>()?;
            for role in AdminRole::ALL {
                if draft.roles().contains(&role) != wanted.contains(&role) {
                    draft.toggle(role);
                }
            }
            if !draft.is_dirty() {
                println!("{user_id}: no changes");
                return Ok(());
            }
            let updated = ctx
                .client
                .update_user_roles(draft.user_id(), &draft.roles())
                .await?;
            let labels: Vec<&str> = updated.roles.iter().map(AdminRole::label).collect();
            println!("{}: {}", updated.user_id, labels.join(", "));
        }
        Command::Logs { pages } => {
            let mut feed = ctx.log_feed();
            feed.load_initial().await?;
            for _ in 1..pages.max(1) {
                if !feed.has_more() {
                    break;
                }
                feed.load_more().await?;
            }
            for entry in feed.entries() {
                println!(
                    "{:<24} {:<8} {:<16} {}",
                    entry.timestamp, entry.level, entry.service, entry.message
                );
            }
            if feed.has_more() {
                println!("(more available)");
            }
        }
        Command::Health => {
            print_health(&ctx).await;
        }
        Command::Watch { interval_secs } => {
            let metrics_bind = ctx.config.metrics_bind;
            let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
            let metrics_task = tokio::spawn(observability::serve_metrics_with_shutdown(
                metrics_handle,
                metrics_bind,
                async move {
                    let _ = shutdown_rx.await;
                },
            ));
            tracing::info!(%metrics_bind, "metrics listening");
            watch_health(&ctx, Duration::from_secs(interval_secs.max(1)), async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await;
            let _ = shutdown_tx.send(());
            metrics_task
                .await
                .context("join metrics server")?
                .context("serve metrics")?;
        }
    }
    Ok(())
}

async fn load_snapshot(ctx: &PanelContext) -> Result<()> {
    ctx.store.load().await;
    if let Some(error) = ctx.store.error() {
        bail!(error);
    }
    Ok(())
}

/// Print a health sweep every `every` until `shutdown` resolves, including
/// while a sweep is still in flight.
async fn watch_health<F>(ctx: &PanelContext, every: Duration, shutdown: F)
where
    F: Future<Output = ()>,
{
    let mut interval = tokio::time::interval(every);
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = interval.tick() => {
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = print_health(ctx) => {}
                }
            }
        }
    }
}

async fn print_health(ctx: &PanelContext) {
    let results = ctx.health.check_all(&ctx.config.services).await;
    for (id, health) in results {
        let latency = health
            .latency_ms
            .map(|ms| format!("{ms}ms"))
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        println!(
            "{:<18} {:<9} {:>8} {}",
            id,
            health.status,
            latency,
            health.error_message.as_deref().unwrap_or("")
        );
    }
}
