use std::fs;
use std::path::Path;

use tracing::{error, info};
use wheelpath::{JobFile, ToolpathError};

fn output_path(base: &str, index: usize, count: usize) -> String {
    if count == 1 {
        return base.to_string();
    }
    let path = Path::new(base);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("nc");
    let name = format!("{}-{}.{}", stem, index + 1, ext);
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(name).to_string_lossy().into_owned(),
        _ => name,
    }
}

fn run(input_path: &str, output: &str) -> Result<(), ToolpathError> {
    let job = JobFile::from_file(input_path)?;
    let built = job.construct_all()?;

    for (i, pass) in built.iter().enumerate() {
        let gcode = pass.gcode()?;
        let path = output_path(output, i, built.len());
        fs::write(&path, gcode.to_string())?;
        info!(pass = %pass.name, lines = gcode.len(), path = %path, "wrote program");
        println!("Generated: {}", path);
    }

    Ok(())
}

fn main() {
    wheelpath::init_logging();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: wheelpath <job.json> [output.nc]");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  wheelpath demos/wheel-gap.json wheel.nc");
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output = args.get(2).map(|s| s.as_str()).unwrap_or("output.nc");

    if let Err(e) = run(input_path, output) {
        error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
