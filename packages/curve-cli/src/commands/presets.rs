use crate::cli::PresetsArgs;
use crate::exit_codes;
use crate::output;
use curve_engine::Sensitivity;
use serde::Serialize;

#[derive(Serialize)]
struct PresetInfo {
    name: &'static str,
    global_z: f64,
    local_z: f64,
    window_size: usize,
}

pub fn execute(args: PresetsArgs) -> i32 {
    let presets: Vec<PresetInfo> = Sensitivity::all()
        .into_iter()
        .map(|s| {
            let preset = s.preset();
            PresetInfo {
                name: s.name(),
                global_z: preset.global_z,
                local_z: preset.local_z,
                window_size: preset.window_size,
            }
        })
        .collect();

    if args.json {
        if let Err(e) = output::emit(&presets, false, None) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    } else {
        println!("Outlier Sensitivity Presets:\n");
        println!(
            "  {:<8} {:<10} {:<10} {:<8}",
            "Name", "Global Z", "Local Z", "Window"
        );
        println!("  {}", "-".repeat(40));
        for p in &presets {
            println!(
                "  {:<8} {:<10} {:<10} {:<8}",
                p.name, p.global_z, p.local_z, p.window_size
            );
        }
        println!();
        println!("A value is removed only when both |Z| thresholds are exceeded.");
        println!("Example: --sensitivity high  or  --global-z 1.0 --local-z 1.2 --window 16");
    }

    exit_codes::SUCCESS
}
