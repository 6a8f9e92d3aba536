//! Map command handler

use crate::cli::MapArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use automap_core::{AutoMapper, MapOptions, ShapeId, Value};
use std::fs;
use tracing::{debug, info, instrument};

use super::utils::{build_mapper, load_shapes, parse_shape, read_document, render_for_file};

/// Handle the map command
#[instrument(skip(config, output), fields(
    input = %args.input.display(),
    target = %args.target
))]
pub fn handle_map(args: MapArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::with_details("map_command", &format!("target: {}", args.target));

    let target = parse_shape(&args.target)?;
    let source_shape = args
        .source_shape
        .as_deref()
        .map(parse_shape)
        .transpose()?;
    if matches!(&source_shape, Some(shape) if shape.is_generic()) {
        return Err(Error::invalid_args("--source-shape must name a class"));
    }
    let options = map_options(&args);
    options.validate()?;

    let mapper = {
        let _load_timer = Timer::new("shape_loading");
        let shapes = load_shapes(args.shapes.as_deref(), config)?;
        build_mapper(shapes, config)?
    };

    let input = Value::from_json(read_document(&args.input)?);
    debug!(options = ?options, "Mapping options");

    output.info(&format!(
        "Mapping {} to {}",
        args.input.display(),
        target
    ))?;

    let result = map_document(&mapper, &input, source_shape.as_ref(), &target, &options)?;
    info!(
        duration_ms = timer.elapsed().as_millis() as u64,
        "Mapping completed"
    );

    if config.output.show_shapes {
        let source = source_shape
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| ShapeId::Map.to_string());
        output.section(&format!("{} -> {}", source, target))?;
    }

    let json = result.to_json();
    output.data(&json)?;

    if let Some(path) = &args.save_to {
        fs::write(path, render_for_file(&json, path)?)?;
        output.success(&format!("✓ Output saved to {}", path.display()))?;
    }

    Ok(())
}

fn map_options(args: &MapArgs) -> MapOptions {
    let mut options = MapOptions::new();
    if !args.groups.is_empty() {
        options = options.with_groups(args.groups.iter().cloned());
    }
    if let Some(depth) = args.max_depth {
        options = options.with_max_depth(depth);
    }
    if let Some(format) = &args.datetime_format {
        options = options.with_datetime_format(format.clone());
    }
    if args.skip_null {
        options = options.skip_null_values();
    }
    options
}

/// Map a document, or each element of a top-level list.
///
/// With a source shape the input is first lifted into an instance of that
/// class so the class-to-class plan applies.
fn map_document(
    mapper: &AutoMapper,
    input: &Value,
    source_shape: Option<&ShapeId>,
    target: &ShapeId,
    options: &MapOptions,
) -> Result<Value> {
    if let Value::List(items) = input {
        return items
            .iter()
            .map(|item| map_document(mapper, item, source_shape, target, options))
            .collect::<Result<Vec<_>>>()
            .map(Value::List);
    }

    let lifted;
    let source = match source_shape {
        Some(shape) => {
            lifted = mapper.map(input, shape.clone(), &MapOptions::default())?;
            &lifted
        }
        None => input,
    };

    Ok(mapper.map(source, target.clone(), options)?)
}
