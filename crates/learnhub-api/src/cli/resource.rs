//! Resource CLI commands.
//!
//! Mutations that run a verification decision print the outcome, including
//! the warning shown when a URL could not be confirmed.

use anyhow::{Result, anyhow};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::{Confirm, Input};

use learnhub_core::repository::SortOrder;
use learnhub_core::repository::resource::{FlagFilter, ResourceFilter};
use learnhub_core::service::resource::{BulkOutcome, ResourceOutcome};
use learnhub_types::resource::{
    CreateResourceRequest, LearningType, Resource, ResourceType, UpdateResourceRequest,
};
use learnhub_types::skill::SkillCategory;

use crate::cli::skill::format_rating;
use crate::cli::{parse_resource_id, parse_tags, spinner};
use crate::state::AppState;

#[derive(Subcommand)]
pub enum ResourceCommand {
    /// Add a resource to a skill. The URL is verified before saving.
    Add {
        /// Owning skill (slug or ID).
        skill: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Audience category (defaults to the skill's).
        #[arg(long)]
        category: Option<String>,

        /// Content source, inferred from the URL when omitted.
        #[arg(long = "type")]
        resource_type: Option<String>,

        /// Access model: free, premium, freemium.
        #[arg(long)]
        access: Option<String>,

        /// Seed rating (0-5).
        #[arg(long)]
        rating: Option<f64>,

        /// Reported number of enrolled learners.
        #[arg(long)]
        enrollment: Option<u64>,

        /// Comma-separated tags.
        #[arg(long)]
        tags: Option<String>,
    },

    /// List resources (admin view: everything unless filtered).
    #[command(alias = "ls")]
    List {
        /// Only resources of this skill (slug or ID).
        #[arg(long)]
        skill: Option<String>,

        /// Only what end users see (active and verified).
        #[arg(long, conflicts_with = "unverified")]
        public: bool,

        /// Only resources whose URL is not verified.
        #[arg(long)]
        unverified: bool,

        #[arg(long = "type")]
        resource_type: Option<String>,

        #[arg(long)]
        access: Option<String>,

        /// Include soft-deleted resources.
        #[arg(long)]
        deleted: bool,

        /// Sort by: title, rating, created_at, updated_at, verified_at.
        #[arg(long, default_value = "created_at")]
        sort: String,
    },

    /// Show a resource.
    Show { id: String },

    /// Update resource fields. A new URL is re-verified.
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long = "type")]
        resource_type: Option<String>,

        #[arg(long)]
        access: Option<String>,

        #[arg(long)]
        enrollment: Option<u64>,

        /// Replace tags (comma-separated).
        #[arg(long)]
        tags: Option<String>,
    },

    /// Soft-delete one or more resources.
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        force: bool,
    },

    /// Re-verify a resource URL and overwrite its verified flag.
    Verify { id: String },

    /// Move a resource to another skill.
    Move {
        id: String,

        /// Target skill (slug or ID).
        #[arg(long)]
        to: String,
    },

    /// Record a learner rating (0-5).
    Rate { id: String, score: f64 },

    /// Make resources visible again.
    Activate {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Hide resources without deleting them.
    Deactivate {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

pub async fn handle_resource_command(
    cmd: ResourceCommand,
    state: &AppState,
    json: bool,
) -> Result<()> {
    match cmd {
        ResourceCommand::Add {
            skill,
            title,
            url,
            description,
            category,
            resource_type,
            access,
            rating,
            enrollment,
            tags,
        } => {
            let skill = state.skill_service.resolve_skill(&skill).await?;
            let title = prompt_if_missing(title, "Title")?;
            let url = prompt_if_missing(url, "URL")?;
            let request = CreateResourceRequest {
                skill_id: skill.id,
                title,
                url,
                description,
                category: parse_opt::<SkillCategory>(category)?,
                resource_type: parse_opt::<ResourceType>(resource_type)?,
                learning_type: parse_opt::<LearningType>(access)?,
                rating,
                enrollment_count: enrollment,
                tags: tags.as_deref().map(parse_tags),
            };

            let spinner = spinner("Verifying URL...");
            let outcome = state.resource_service.create_resource(request).await?;
            spinner.finish_and_clear();

            print_outcome(&outcome, "Resource added", json)
        }
        ResourceCommand::List {
            skill,
            public,
            unverified,
            resource_type,
            access,
            deleted,
            sort,
        } => {
            let skill_id = match skill {
                Some(s) => Some(state.skill_service.resolve_skill(&s).await?.id),
                None => None,
            };
            let flags = if public {
                FlagFilter::PUBLIC
            } else if unverified {
                FlagFilter {
                    active: None,
                    verified: Some(false),
                }
            } else {
                FlagFilter::ANY
            };
            let filter = ResourceFilter {
                skill_id,
                resource_type: parse_opt::<ResourceType>(resource_type)?,
                learning_type: parse_opt::<LearningType>(access)?,
                flags,
                include_deleted: deleted,
                sort_by: Some(sort),
                sort_order: Some(SortOrder::Desc),
                ..Default::default()
            };
            let resources = state.resource_service.list_resources(Some(filter)).await?;
            list_resources(&resources, json)
        }
        ResourceCommand::Show { id } => {
            let resource = state
                .resource_service
                .get_resource(&parse_resource_id(&id)?)
                .await?;
            show_resource(&resource, json)
        }
        ResourceCommand::Update {
            id,
            title,
            url,
            description,
            category,
            resource_type,
            access,
            enrollment,
            tags,
        } => {
            let id = parse_resource_id(&id)?;
            let url_changed = url.is_some();
            let request = UpdateResourceRequest {
                title,
                url,
                description,
                category: parse_opt::<SkillCategory>(category)?,
                resource_type: parse_opt::<ResourceType>(resource_type)?,
                learning_type: parse_opt::<LearningType>(access)?,
                enrollment_count: enrollment,
                tags: tags.as_deref().map(parse_tags),
                ..Default::default()
            };

            let spinner = url_changed.then(|| spinner("Verifying URL..."));
            let outcome = state.resource_service.update_resource(&id, request).await?;
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }

            print_outcome(&outcome, "Resource updated", json)
        }
        ResourceCommand::Delete { ids, force } => {
            let ids = ids
                .iter()
                .map(|s| parse_resource_id(s))
                .collect::<Result<Vec<_>>>()?;

            if !force && !json {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete {} resource(s)?", style(ids.len()).red().bold()))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("  Cancelled.");
                    return Ok(());
                }
            }

            let outcome = state.resource_service.bulk_delete(&ids).await?;
            print_bulk(&outcome, "deleted", json)
        }
        ResourceCommand::Verify { id } => {
            let id = parse_resource_id(&id)?;
            let spinner = spinner("Verifying URL...");
            let outcome = state.resource_service.verify_resource(&id).await?;
            spinner.finish_and_clear();
            print_outcome(&outcome, "Verification recorded", json)
        }
        ResourceCommand::Move { id, to } => {
            let id = parse_resource_id(&id)?;
            let target = state.skill_service.resolve_skill(&to).await?;
            let resource = state.resource_service.move_resource(&id, &target.id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&resource)?);
            } else {
                println!(
                    "  {} '{}' moved to {}",
                    style("✓").green().bold(),
                    resource.title,
                    style(&target.name).cyan()
                );
            }
            Ok(())
        }
        ResourceCommand::Rate { id, score } => {
            let id = parse_resource_id(&id)?;
            let resource = state.resource_service.rate_resource(&id, score).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&resource)?);
            } else {
                println!(
                    "  {} '{}' now {} from {} rating(s)",
                    style("✓").green().bold(),
                    resource.title,
                    format_rating(resource.rating),
                    resource.ratings_count
                );
            }
            Ok(())
        }
        ResourceCommand::Activate { ids } => set_active(state, &ids, true, json).await,
        ResourceCommand::Deactivate { ids } => set_active(state, &ids, false, json).await,
    }
}

fn parse_opt<T>(raw: Option<String>) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    raw.map(|v| v.parse::<T>().map_err(|e| anyhow!(e))).transpose()
}

fn prompt_if_missing(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::<String>::new().with_prompt(prompt).interact_text()?),
    }
}

async fn set_active(state: &AppState, ids: &[String], active: bool, json: bool) -> Result<()> {
    let ids = ids
        .iter()
        .map(|s| parse_resource_id(s))
        .collect::<Result<Vec<_>>>()?;
    let outcome = state.resource_service.bulk_set_active(&ids, active).await?;
    print_bulk(
        &outcome,
        if active { "activated" } else { "deactivated" },
        json,
    )
}

fn print_outcome(outcome: &ResourceOutcome, headline: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    let resource = &outcome.resource;
    println!();
    println!("  {} {headline}", style("✓").green().bold());
    println!();
    println!("  {}  {}", style("Title:").bold(), style(&resource.title).cyan());
    println!("  {}    {}", style("URL:").bold(), resource.url);
    println!("  {}     {}", style("ID:").bold(), style(resource.id.to_string()).dim());
    if let Some(decision) = &outcome.decision {
        let method = match decision.status_code {
            Some(code) => format!("{} (HTTP {code})", decision.method),
            None => decision.method.to_string(),
        };
        println!("  {}  {}", style("Check:").bold(), style(method).dim());
    }
    println!("  {}", verified_label(resource));
    if let Some(warning) = &outcome.warning {
        println!();
        println!("  {} {warning}", style("⚠").yellow().bold());
        println!(
            "  {}",
            style("The resource is hidden from learners until it verifies.").dim()
        );
    }
    println!();
    Ok(())
}

fn verified_label(resource: &Resource) -> String {
    if resource.verified {
        format!("{}", style("● verified").green())
    } else {
        format!("{}", style("✗ unverified").red())
    }
}

fn print_bulk(outcome: &BulkOutcome, verb: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }
    if !outcome.succeeded.is_empty() {
        println!(
            "  {} {} resource(s) {verb}",
            style("✓").green().bold(),
            outcome.succeeded.len()
        );
    }
    for (id, error) in &outcome.failed {
        println!("  {} {id}: {error}", style("✗").red().bold());
    }
    Ok(())
}

fn list_resources(resources: &[Resource], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(resources)?);
        return Ok(());
    }

    if resources.is_empty() {
        println!();
        println!("  {} No resources found.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Title").fg(Color::White),
        Cell::new("Type").fg(Color::White),
        Cell::new("Access").fg(Color::White),
        Cell::new("Rating").fg(Color::White),
        Cell::new("Verified").fg(Color::White),
        Cell::new("ID").fg(Color::White),
    ]);

    for resource in resources {
        let verified = match (resource.verified, &resource.verification_error) {
            (true, _) => Cell::new("✓").fg(Color::Green),
            (false, Some(err)) => Cell::new(format!("✗ {err}")).fg(Color::Red),
            (false, None) => Cell::new("✗").fg(Color::Red),
        };
        let title = if resource.deleted_at.is_some() {
            Cell::new(format!("{} (deleted)", resource.title)).fg(Color::DarkGrey)
        } else if !resource.is_active {
            Cell::new(format!("{} (inactive)", resource.title)).fg(Color::Yellow)
        } else {
            Cell::new(&resource.title)
        };
        table.add_row(vec![
            title,
            Cell::new(resource.resource_type.to_string()),
            Cell::new(resource.learning_type.to_string()),
            Cell::new(format_rating(resource.rating)),
            verified,
            Cell::new(resource.id.to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!("  {} resource(s)", resources.len());
    println!();
    Ok(())
}

fn show_resource(resource: &Resource, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(resource)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(&resource.title).cyan().bold());
    if !resource.description.is_empty() {
        println!("  {}", resource.description);
    }
    println!();
    println!("  {}", style("── Details ──").dim());
    println!("  URL:        {}", resource.url);
    println!("  Type:       {}", resource.resource_type);
    println!("  Access:     {}", resource.learning_type);
    println!("  Audience:   {}", resource.category);
    println!(
        "  Rating:     {} ({} rating(s))",
        format_rating(resource.rating),
        resource.ratings_count
    );
    if let Some(enrolled) = resource.enrollment_count {
        println!("  Enrolled:   {enrolled}");
    }
    if !resource.tags.is_empty() {
        println!("  Tags:       {}", resource.tags.join(", "));
    }
    println!();
    println!("  {}", style("── Trust ──").dim());
    println!("  {}", verified_label(resource));
    if let Some(at) = resource.verified_at {
        println!("  Checked:    {}", at.format("%Y-%m-%d %H:%M UTC"));
    }
    if let Some(error) = &resource.verification_error {
        println!("  Error:      {}", style(error).red());
    }
    let visibility = match (resource.deleted_at.is_some(), resource.is_public()) {
        (true, _) => style("deleted").dim(),
        (false, true) => style("public").green(),
        (false, false) => style("hidden").yellow(),
    };
    println!("  Visibility: {visibility}");
    println!();
    Ok(())
}
