use anyhow::Result;
use owo_colors::OwoColorize;

use super::{Context, Source};
use crate::render::Render;

pub fn run(ctx: &Context, current: Source) -> Result<()> {
    let schedule = ctx.load(current)?;

    println!(
        "{}",
        format!("Listing events from {}", ctx.source_path(current).display()).bold()
    );
    println!();
    println!("{}", schedule.events.render());

    Ok(())
}
