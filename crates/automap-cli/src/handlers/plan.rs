//! Plan command handler

use crate::cli::PlanArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use tracing::{info, instrument};

use super::utils::{build_mapper, load_shapes, parse_shape};

/// Handle the plan command
#[instrument(skip(config, output), fields(source = %args.source, target = %args.target))]
pub fn handle_plan(args: PlanArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details(
        "plan_command",
        &format!("{} -> {}", args.source, args.target),
    );

    let source = parse_shape(&args.source)?;
    let target = parse_shape(&args.target)?;
    let shapes = load_shapes(args.shapes.as_deref(), config)?;
    let mapper = build_mapper(shapes, config)?;

    let plan = mapper.plan(&source, &target)?;
    info!(
        mapper = %plan.mapper_name,
        members = plan.members.len(),
        dependencies = plan.dependencies.len(),
        "Plan built"
    );

    output.plan(&plan)?;

    let related: Vec<String> = mapper
        .registry()
        .mapper_pairs()
        .into_iter()
        .filter(|pair| pair.source != source || pair.target != target)
        .map(|pair| pair.to_string())
        .collect();
    if !related.is_empty() {
        output.debug(&format!("Also built: {}", related.join(", ")))?;
    }

    Ok(())
}
