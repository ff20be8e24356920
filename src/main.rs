use std::process::ExitCode;
use voxmap::config::USAGE;
use voxmap::{Pipeline, RenderConfig};
use voxmap_logger::{log, LogSeverity};

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|arg| arg == "-h" || arg == "--help") {
        println!("{}", USAGE);
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    let config = match RenderConfig::from_args(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}\n\n{}", err, USAGE);
            return ExitCode::FAILURE;
        }
    };

    log(
        format!(
            "Rendering {} ({}, {})",
            config.world_root().display(),
            config.orientation,
            config.shading
        ),
        LogSeverity::Info,
    );

    let print_status = |message: &str| println!("{}", message);
    match Pipeline::new(config).run(&print_status).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
