use crate::cli::CompactArgs;
use crate::exit_codes;
use crate::output;
use crate::params;
use curve_engine::{compact_ranges, Sample};

pub fn execute(args: CompactArgs) -> i32 {
    let model = params::index_model(&args.index);

    let (full, selected) = match params::read_index_values(&args.full, &model)
        .and_then(|full| Ok((full, params::read_index_values(&args.selected, &model)?)))
    {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    let full: Vec<Sample> = full.into_iter().map(Sample::new).collect();
    let selected: Vec<Sample> = selected.into_iter().map(Sample::new).collect();

    if !model.is_ordered(&full) {
        eprintln!(
            "Error: '{}' is not in {} {} order",
            args.full,
            model.kind.name(),
            model.direction.name()
        );
        return exit_codes::INPUT_ERROR;
    }

    // Every selected value must exist in the full sequence
    if let Some(missing) = selected.iter().find(|s| {
        full.binary_search_by(|f| model.compare(&f.index, &s.index))
            .is_err()
    }) {
        eprintln!(
            "Error: selected index {} is not part of '{}'",
            missing.index, args.full
        );
        return exit_codes::INPUT_ERROR;
    }

    let ranges = compact_ranges(&full, &selected, &model);
    log::info!(
        "Compacted {} selected values into {} ranges",
        selected.len(),
        ranges.len()
    );

    if let Err(e) = output::emit(&ranges, args.compact, args.output.as_deref()) {
        eprintln!("Error: {}", e);
        return exit_codes::EXECUTION_ERROR;
    }

    exit_codes::SUCCESS
}
