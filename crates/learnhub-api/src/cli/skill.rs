//! Skill CLI commands: create, list, show, update, delete, refresh.

use anyhow::{Result, anyhow};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::{Confirm, Input};

use learnhub_core::repository::SortOrder;
use learnhub_core::repository::resource::ResourceFilter;
use learnhub_core::repository::skill::SkillFilter;
use learnhub_types::skill::{CreateSkillRequest, Skill, SkillCategory, UpdateSkillRequest};

use crate::cli::spinner;
use crate::state::AppState;

/// Skill management subcommands.
#[derive(Subcommand)]
pub enum SkillCommand {
    /// Create a new skill.
    Create {
        /// Skill name (prompted when omitted).
        name: Option<String>,

        /// Short description.
        #[arg(long)]
        description: Option<String>,

        /// Audience: children, students, senior_citizens, professionals, all.
        #[arg(long)]
        category: Option<String>,
    },

    /// List skills.
    #[command(alias = "ls")]
    List {
        /// Filter by audience category.
        #[arg(long)]
        category: Option<String>,

        /// Sort by: name, created_at, updated_at, popularity.
        #[arg(long, default_value = "name")]
        sort: String,

        /// Include soft-deleted skills.
        #[arg(long)]
        deleted: bool,
    },

    /// Show a skill with its statistics and resources.
    Show {
        /// Skill slug or ID.
        skill: String,
    },

    /// Update a skill's name, description or category.
    Update {
        /// Skill slug or ID.
        skill: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        category: Option<String>,
    },

    /// Soft-delete a skill (refused while it owns active resources).
    Delete {
        /// Skill slug or ID.
        skill: String,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },

    /// Recompute statistics for one skill, or every active skill.
    Refresh {
        /// Skill slug or ID. Omit to refresh all.
        skill: Option<String>,
    },
}

pub async fn handle_skill_command(cmd: SkillCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        SkillCommand::Create {
            name,
            description,
            category,
        } => create_skill(state, name, description, category, json).await,
        SkillCommand::List {
            category,
            sort,
            deleted,
        } => list_skills(state, category, &sort, deleted, json).await,
        SkillCommand::Show { skill } => show_skill(state, &skill, json).await,
        SkillCommand::Update {
            skill,
            name,
            description,
            category,
        } => update_skill(state, &skill, name, description, category, json).await,
        SkillCommand::Delete { skill, force } => delete_skill(state, &skill, force, json).await,
        SkillCommand::Refresh { skill } => refresh(state, skill.as_deref(), json).await,
    }
}

fn parse_category(raw: Option<String>) -> Result<Option<SkillCategory>> {
    raw.map(|c| c.parse::<SkillCategory>().map_err(|e| anyhow!(e)))
        .transpose()
}

async fn create_skill(
    state: &AppState,
    name: Option<String>,
    description: Option<String>,
    category: Option<String>,
    json: bool,
) -> Result<()> {
    let name = match name {
        Some(n) => n,
        None => Input::<String>::new()
            .with_prompt("Skill name")
            .interact_text()?,
    };

    let request = CreateSkillRequest {
        name,
        description,
        category: parse_category(category)?,
    };
    let skill = state.skill_service.create_skill(request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&skill)?);
        return Ok(());
    }

    println!();
    println!("  {} Skill created!", style("✓").green().bold());
    println!();
    println!("  {}      {}", style("Name:").bold(), style(&skill.name).cyan());
    println!("  {}      {}", style("Slug:").bold(), skill.slug);
    println!("  {}  {}", style("Audience:").bold(), skill.category);
    println!(
        "  {}        {}",
        style("ID:").bold(),
        style(skill.id.to_string()).dim()
    );
    println!();
    println!(
        "  Add a resource: {}",
        style(format!(
            "lhub resource add {} --title ... --url ...",
            skill.slug
        ))
        .yellow()
    );
    println!();
    Ok(())
}

async fn list_skills(
    state: &AppState,
    category: Option<String>,
    sort: &str,
    include_deleted: bool,
    json: bool,
) -> Result<()> {
    let sort_order = match sort {
        "name" | "slug" => SortOrder::Asc,
        _ => SortOrder::Desc,
    };
    let filter = SkillFilter {
        category: parse_category(category)?,
        include_deleted,
        sort_by: Some(sort.to_string()),
        sort_order: Some(sort_order),
        ..Default::default()
    };
    let skills = state.skill_service.list_skills(Some(filter)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&skills)?);
        return Ok(());
    }

    if skills.is_empty() {
        println!();
        println!(
            "  {} No skills found. Create one with: {}",
            style("i").blue().bold(),
            style("lhub skill create").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Slug").fg(Color::White),
        Cell::new("Audience").fg(Color::White),
        Cell::new("Resources").fg(Color::White),
        Cell::new("Rating").fg(Color::White),
        Cell::new("Popularity").fg(Color::White),
    ]);

    for skill in &skills {
        let name = if skill.is_active {
            Cell::new(&skill.name)
        } else {
            Cell::new(format!("{} (deleted)", skill.name)).fg(Color::DarkGrey)
        };
        let stats = &skill.statistics;
        table.add_row(vec![
            name,
            Cell::new(&skill.slug).fg(Color::DarkGrey),
            Cell::new(skill.category.to_string()),
            Cell::new(format!(
                "{} ({} free)",
                stats.total_resources, stats.free_resources
            )),
            Cell::new(format_rating(stats.average_rating)),
            Cell::new(format!("{:.1}", stats.popularity_score)).fg(Color::Cyan),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!("  {} skill(s)", skills.len());
    println!();
    Ok(())
}

async fn show_skill(state: &AppState, id_or_slug: &str, json: bool) -> Result<()> {
    let skill = state.skill_service.resolve_skill(id_or_slug).await?;
    let filter = ResourceFilter {
        skill_id: Some(skill.id.clone()),
        include_deleted: true,
        sort_by: Some("created_at".to_string()),
        sort_order: Some(SortOrder::Asc),
        ..Default::default()
    };
    let resources = state.resource_service.list_resources(Some(filter)).await?;

    if json {
        let value = serde_json::json!({
            "skill": skill,
            "resources": resources,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print_skill_header(&skill);

    if resources.is_empty() {
        println!("  {}", style("No resources yet.").dim());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Title", "Type", "Access", "Rating", "State", "ID"]);
    for resource in &resources {
        let state_cell = if resource.deleted_at.is_some() {
            Cell::new("◌ deleted").fg(Color::DarkGrey)
        } else if !resource.is_active {
            Cell::new("○ inactive").fg(Color::Yellow)
        } else if resource.verified {
            Cell::new("● public").fg(Color::Green)
        } else {
            Cell::new("✗ unverified").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(&resource.title),
            Cell::new(resource.resource_type.to_string()),
            Cell::new(resource.learning_type.to_string()),
            Cell::new(format_rating(resource.rating)),
            state_cell,
            Cell::new(resource.id.to_string()).fg(Color::DarkGrey),
        ]);
    }
    println!("{table}");
    println!();
    Ok(())
}

fn print_skill_header(skill: &Skill) {
    let stats = &skill.statistics;
    println!();
    println!(
        "  {} ({})",
        style(&skill.name).cyan().bold(),
        style(&skill.slug).dim()
    );
    if !skill.description.is_empty() {
        println!("  {}", skill.description);
    }
    if !skill.is_active {
        println!("  {}", style("This skill is deleted.").red());
    }
    println!();
    println!("  {}", style("── Statistics ──").dim());
    println!("  Public resources: {}", style(stats.total_resources).bold());
    println!(
        "  Free / premium:   {} / {}",
        stats.free_resources, stats.premium_resources
    );
    println!("  Average rating:   {}", format_rating(stats.average_rating));
    println!("  Learners:         {}", stats.total_learners);
    println!(
        "  Popularity:       {}",
        style(format!("{:.1}", stats.popularity_score)).cyan()
    );
    println!();
}

async fn update_skill(
    state: &AppState,
    id_or_slug: &str,
    name: Option<String>,
    description: Option<String>,
    category: Option<String>,
    json: bool,
) -> Result<()> {
    let skill = state.skill_service.resolve_skill(id_or_slug).await?;
    let request = UpdateSkillRequest {
        name,
        description,
        category: parse_category(category)?,
    };
    let updated = state.skill_service.update_skill(&skill.id, request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!(
            "  {} Skill '{}' updated.",
            style("✓").green().bold(),
            updated.name
        );
    }
    Ok(())
}

async fn delete_skill(state: &AppState, id_or_slug: &str, force: bool, json: bool) -> Result<()> {
    let skill = state.skill_service.resolve_skill(id_or_slug).await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete skill '{}'? It will disappear from listings.",
                style(&skill.name).red().bold()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let deleted = state.skill_service.delete_skill(&skill.id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "slug": deleted.slug})
        );
    } else {
        println!(
            "  {} Skill '{}' deleted.",
            style("✓").red().bold(),
            deleted.name
        );
    }
    Ok(())
}

async fn refresh(state: &AppState, id_or_slug: Option<&str>, json: bool) -> Result<()> {
    let skills = match id_or_slug {
        Some(s) => vec![state.skill_service.resolve_skill(s).await?],
        None => state.skill_service.list_skills(None).await?,
    };

    let spinner = spinner(format!("Refreshing {} skill(s)...", skills.len()));
    let mut refreshed = Vec::with_capacity(skills.len());
    for skill in &skills {
        let stats = state
            .resource_service
            .stats()
            .refresh_statistics(&skill.id)
            .await?;
        refreshed.push((skill, stats));
    }
    spinner.finish_and_clear();

    if json {
        let value: Vec<_> = refreshed
            .iter()
            .map(|(skill, stats)| serde_json::json!({"slug": skill.slug, "statistics": stats}))
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for (skill, stats) in &refreshed {
        println!(
            "  {} {:<30} {} public, popularity {}",
            style("✓").green().bold(),
            skill.name,
            stats.total_resources,
            style(format!("{:.1}", stats.popularity_score)).cyan()
        );
    }
    Ok(())
}

pub(crate) fn format_rating(rating: f64) -> String {
    if rating <= 0.0 {
        "-".to_string()
    } else {
        format!("★ {rating:.1}")
    }
}
