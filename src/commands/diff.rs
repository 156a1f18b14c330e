use std::path::Path;

use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use perfcal_core::Reconciler;
use perfcal_core::output::{OutputFormat, write_file};

use super::{Context, Source};
use crate::render::Render;
use crate::reporter::ConsoleReporter;

/// Fail before any source is opened if the arguments cannot work.
pub fn check(current: Source, against: Source, output: Option<&Path>) -> Result<OutputFormat> {
    if current == against {
        bail!(
            "--current and --against are both the {}; compare the workbook with the feed",
            current
        );
    }

    match output {
        Some(path) => Ok(OutputFormat::from_path(path)?),
        None => Ok(against.output_format()),
    }
}

pub fn run(ctx: &Context, current: Source, against: Source, output: Option<&Path>) -> Result<()> {
    let format = check(current, against, output)?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| ctx.default_output(format));

    println!(
        "Comparing {} ({}) against {} ({})",
        current,
        ctx.source_path(current).display(),
        against,
        ctx.source_path(against).display()
    );

    let current_schedule = ctx.load(current)?;
    let old_schedule = ctx.load(against)?;

    let mut reconciler = Reconciler::new(ctx.settings.protected_uid_suffix.as_str())
        .with_reporter(ConsoleReporter::default());
    let changes = reconciler.reconcile(&current_schedule.events, Some(&old_schedule.events));

    for line in reconciler.reporter().lines() {
        println!("{}", line);
    }
    println!();
    println!("{}", changes.render());
    println!("{}", changes.counts().render());

    // Cancelled events only exist on the old side, so both venue tables are needed
    let mut venues = old_schedule.venues.clone();
    venues.extend(&current_schedule.venues);

    let written = write_file(format, &changes, &ctx.output_context(&venues), &path)?;
    if written == 0 {
        println!("{}", "Nothing to write".dimmed());
    } else {
        println!("{}", format!("Wrote {} events to {}", written, path.display()).green());
    }

    Ok(())
}
