use crate::cli::FilterArgs;
use crate::exit_codes;
use crate::output;
use crate::params;
use curve_engine::apply_filters;

pub fn execute(args: FilterArgs) -> i32 {
    let samples = match params::read_samples(&args.input) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    let options = match params::build_filter_options(&args) {
        Ok(o) => o,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    let report = apply_filters(&samples, &args.index_curve, &options);
    log::info!(
        "Removed {} values from {} samples",
        report.total_removed(),
        samples.len()
    );

    if let Err(e) = output::emit(&report, args.compact, args.output.as_deref()) {
        eprintln!("Error: {}", e);
        return exit_codes::EXECUTION_ERROR;
    }

    exit_codes::SUCCESS
}
