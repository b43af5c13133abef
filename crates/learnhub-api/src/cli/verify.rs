//! Catalog-wide trust commands: `verify-all` and `check-url`.

use anyhow::Result;
use console::style;

use learnhub_core::repository::resource::{FlagFilter, ResourceFilter};

use crate::cli::spinner;
use crate::state::AppState;

/// Re-verify every matching resource, overwriting stored flags.
pub async fn verify_all(
    state: &AppState,
    skill: Option<&str>,
    unverified_only: bool,
    json: bool,
) -> Result<()> {
    let skill_id = match skill {
        Some(s) => Some(state.skill_service.resolve_skill(s).await?.id),
        None => None,
    };
    let filter = ResourceFilter {
        skill_id,
        flags: FlagFilter {
            active: None,
            verified: unverified_only.then_some(false),
        },
        ..Default::default()
    };

    let spinner = spinner("Re-verifying resource URLs...");
    let report = state.resource_service.reverify_all(Some(filter)).await?;
    spinner.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("  {}", style("── Verification sweep ──").dim());
    println!("  Checked:  {}", style(report.checked).bold());
    println!("  Verified: {}", style(report.verified).green());
    if report.promoted > 0 {
        println!("  Promoted: {}", style(report.promoted).green());
    }
    if report.demoted > 0 {
        println!("  Demoted:  {}", style(report.demoted).red());
    }
    for (id, error) in &report.failures {
        println!("  {} {id}: {error}", style("✗").red().bold());
    }
    println!();
    Ok(())
}

/// Probe a URL and report the allow-list verdict next to the live result.
pub async fn check_url(state: &AppState, url: &str, json: bool) -> Result<()> {
    let verifier = state.resource_service.verifier();
    let known = verifier.is_known_authentic_platform(url);

    let spinner = spinner(format!("Checking {url}..."));
    let check = verifier.verify_url(url).await;
    spinner.finish_and_clear();

    if json {
        let value = serde_json::json!({
            "url": url,
            "known_platform": known,
            "check": check,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let mark = |ok: bool| {
        if ok {
            format!("{}", style("✓").green())
        } else {
            format!("{}", style("✗").red())
        }
    };

    println!();
    println!("  {}", style(url).cyan());
    println!();
    println!("  {} Trusted platform", mark(known));
    match (&check.status_code, &check.error) {
        (Some(code), None) => println!("  {} Reachable (HTTP {code})", mark(true)),
        (_, Some(error)) => println!("  {} Unreachable: {error}", mark(false)),
        (None, None) => println!("  {} Reachable", mark(check.is_valid)),
    }
    println!();
    Ok(())
}
