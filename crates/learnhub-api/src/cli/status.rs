//! Catalog status dashboard command.

use anyhow::Result;
use console::style;

use learnhub_types::resource::LearningType;

use crate::state::AppState;

/// Display catalog status: skill and resource counts, trust health, config.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let skills = state.skill_service.list_skills(None).await?;
    let resources = state.resource_service.list_resources(None).await?;

    let public = resources.iter().filter(|r| r.is_public()).count();
    let unverified = resources.iter().filter(|r| !r.verified).count();
    let inactive = resources.iter().filter(|r| !r.is_active).count();
    let free = resources
        .iter()
        .filter(|r| r.is_public() && r.learning_type == LearningType::Free)
        .count();
    let learners: u64 = skills.iter().map(|s| s.statistics.total_learners).sum();
    let top = skills.iter().max_by(|a, b| {
        a.statistics
            .popularity_score
            .total_cmp(&b.statistics.popularity_score)
    });

    let config = &state.config;

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "deployment_mode": config.deployment_mode,
            "skills": skills.len(),
            "resources": {
                "total": resources.len(),
                "public": public,
                "free": free,
                "unverified": unverified,
                "inactive": inactive,
            },
            "learners": learners,
            "top_skill": top.map(|s| &s.slug),
            "trusted_domains": config.verification.trusted_domains.len(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} LearnHub v{}",
        style("📚").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Catalog ──").dim());
    println!("  Skills:     {}", style(skills.len()).bold());
    println!("  Resources:  {}", style(resources.len()).bold());
    println!("  Public:     {} ({} free)", style(public).green(), free);
    if unverified > 0 {
        println!("  Unverified: {}", style(unverified).red());
    }
    if inactive > 0 {
        println!("  Inactive:   {}", style(inactive).yellow());
    }
    println!("  Learners:   {learners}");
    if let Some(top) = top.filter(|s| s.statistics.popularity_score > 0.0) {
        println!(
            "  Top skill:  {} ({:.1})",
            style(&top.name).cyan(),
            top.statistics.popularity_score
        );
    }
    println!();

    println!("  {}", style("── Verification ──").dim());
    println!("  Mode:            {}", config.deployment_mode);
    println!(
        "  Trusted domains: {}",
        config.verification.trusted_domains.len()
    );
    println!(
        "  Probe timeout:   {}s, {} concurrent",
        config.verification.timeout_secs, config.verification.concurrency
    );
    println!();

    println!("  {}", style("── Storage ──").dim());
    println!("  Data dir: {}", state.data_dir.display());
    println!();

    Ok(())
}
