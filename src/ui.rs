//! Terminal output for the CLI.

use crate::boundary::BoundaryWarning;
use crate::ci::CiContext;
use crate::publish::PublishVerdict;
use crate::resolver::ReleaseDecision;
use console::style;

pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning with yellow formatting.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    println!("{} {}", style("⚠").yellow(), warning);
}

pub fn display_ci_context(ci: &CiContext) {
    let kind = if ci.is_pull_request { "pull request" } else { "push" };
    display_status(&format!(
        "CI: {} ({}), branch: {}, target: {}",
        ci.ci_system,
        kind,
        ci.current_branch.as_deref().unwrap_or("-"),
        ci.target_branch.as_deref().unwrap_or("-"),
    ));
}

/// Shows either "From: old -> To: new", "Initial release: new" or that
/// nothing was released.
pub fn display_release(release: Option<&ReleaseDecision>, dry_run: bool) {
    let Some(decision) = release else {
        display_status("No release needed");
        return;
    };

    let verb = if dry_run { "Would release" } else { "Released" };
    match &decision.previous_version {
        Some(previous) => display_success(&format!(
            "{} {} (from {})",
            verb,
            style(decision.version.as_tag()).bold(),
            previous.as_tag()
        )),
        None => display_success(&format!(
            "{} {} (initial release)",
            verb,
            style(decision.version.as_tag()).bold()
        )),
    }
}

pub fn display_publish_verdict(verdict: &PublishVerdict) {
    match verdict {
        PublishVerdict::Publish { version } => {
            display_success(&format!("Package {} may be published", version))
        }
        PublishVerdict::Skip { reason } => {
            display_status(&format!("Publishing skipped: {}", reason))
        }
    }
}
