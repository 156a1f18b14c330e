use std::path::Path;

use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use perfcal_core::Reconciler;
use perfcal_core::output::{OutputFormat, write_file};

use super::{Context, Format, Source};
use crate::render::Render;

pub fn run(ctx: &Context, current: Source, format: Format, output: Option<&Path>) -> Result<()> {
    let format = OutputFormat::from(format);
    let path = match output {
        Some(path) => {
            if OutputFormat::from_path(path)? != format {
                bail!(
                    "{} does not match --format (expected a .{} file)",
                    path.display(),
                    format.extension()
                );
            }
            path.to_path_buf()
        }
        None => ctx.default_output(format),
    };

    let schedule = ctx.load(current)?;

    // Against nothing, every event is an addition
    let changes = Reconciler::new(ctx.settings.protected_uid_suffix.as_str())
        .reconcile(&schedule.events, None);
    println!("{}", changes.counts().render());

    let written = write_file(format, &changes, &ctx.output_context(&schedule.venues), &path)?;
    if written == 0 {
        println!("{}", "Nothing to write".dimmed());
    } else {
        println!("{}", format!("Wrote {} events to {}", written, path.display()).green());
    }

    Ok(())
}
