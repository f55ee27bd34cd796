use crate::cli::ReplayArgs;
use crate::exit_codes;
use crate::output;
use crate::params;
use curve_engine::{AcquisitionTarget, InMemoryLog, StreamConfig, StreamingController};
use std::sync::Arc;
use std::time::Duration;

pub async fn execute(args: ReplayArgs) -> i32 {
    let samples = match params::read_samples(&args.input) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };
    if samples.is_empty() {
        eprintln!("Error: '{}' contains no samples", args.input);
        return exit_codes::INPUT_ERROR;
    }
    if args.batch == 0 {
        eprintln!("Error: --batch must be a positive integer");
        return exit_codes::INPUT_ERROR;
    }

    let model = params::index_model(&args.index);
    if let Some(s) = samples.iter().find(|s| s.index.kind() != model.kind) {
        eprintln!(
            "Error: sample index {} is not a {} value",
            s.index,
            model.kind.name()
        );
        return exit_codes::INPUT_ERROR;
    }

    let initial = args.initial.clamp(1, samples.len());
    let mut pending = samples[initial..].chunks(args.batch).take(args.polls);
    let expected_end = {
        let fed = initial + args.batch.saturating_mul(args.polls);
        model.last_in_order(&samples[..fed.min(samples.len())])
    };

    let growing = Arc::new(InMemoryLog::new(model, samples[..initial].to_vec()));
    let config = StreamConfig::default().with_poll_interval(Duration::from_millis(args.interval_ms));
    let controller = match StreamingController::new(growing.clone(), config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::INPUT_ERROR;
        }
    };
    controller.set_target(AcquisitionTarget::new(
        args.input.clone(),
        args.index_curve.clone(),
        args.curves.clone(),
        model,
    ));

    if let Err(e) = controller.start() {
        eprintln!("Error: {}", e);
        return exit_codes::EXECUTION_ERROR;
    }

    let interval = controller.config().poll_interval();
    // Wait for the last fed sample to arrive, with generous slack for slow polls
    let mut remaining_ticks = args.polls * 2 + 20;
    loop {
        tokio::time::sleep(interval).await;

        if let Some(batch) = pending.next() {
            log::info!("Log grew by {} samples", batch.len());
            growing.append(batch.iter().cloned());
        }

        if let Some(error) = controller.last_error() {
            eprintln!("Error: {}", error);
            return exit_codes::EXECUTION_ERROR;
        }

        let held = model.last_in_order(&controller.snapshot());
        if held.is_some() && held == expected_end {
            break;
        }

        remaining_ticks = remaining_ticks.saturating_sub(1);
        if remaining_ticks == 0 {
            log::warn!("Replay finished before the last sample was acquired");
            break;
        }
    }
    controller.stop();

    let stats = controller.stats();
    log::info!(
        "Replay done: {} fetches applied, {} samples held",
        stats.fetches_applied,
        stats.buffer_len
    );

    if let Err(e) = output::emit(&controller.snapshot(), args.compact, args.output.as_deref()) {
        eprintln!("Error: {}", e);
        return exit_codes::EXECUTION_ERROR;
    }

    exit_codes::SUCCESS
}
