//! Build command implementation

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use crate::builder::{BuildError, ImageBuilder};
use crate::logging::{self, LogFormat};
use crate::pi::PiConnection;
use crate::progress::{ConsoleProgress, JsonProgress, ProgressReporter};
use crate::registry::PaletteRegistry;
use crate::validate::{validate, RenderParams};
use crate::world::{RecordingWorld, TilePos};

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Arguments of the build command
#[derive(Debug, Clone)]
pub struct BuildArgs {
    pub image: PathBuf,
    pub height: Option<i32>,
    pub max_size: Option<u32>,
    pub palette: Option<String>,
    pub flip: bool,
    pub host: String,
    pub port: u16,
    pub timeout_secs: Option<u64>,
    pub config: Option<PathBuf>,
    pub dry_run: bool,
    pub json: bool,
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

/// Execute the build command
pub fn run_build(args: BuildArgs) -> ExitCode {
    let format = if args.json { LogFormat::Json } else { LogFormat::Text };
    if let Err(e) = logging::init_logging(args.verbose, format, args.log_file.as_deref()) {
        eprintln!("Error: Cannot open log file: {}", e);
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let registry = match PaletteRegistry::load(args.config.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let params = RenderParams {
        height: args.height,
        max_size: args.max_size,
        palette: args.palette.clone(),
        flip_palette: args.flip,
    };
    let config = match validate(&registry, params) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let reporter: Box<dyn ProgressReporter> = if args.json {
        Box::new(JsonProgress::new())
    } else {
        Box::new(ConsoleProgress::new().with_verbose(args.verbose))
    };
    let builder = ImageBuilder::new(&registry, config).with_reporter(reporter.as_ref());

    if args.dry_run {
        // Nothing is paced in memory
        let mut world = RecordingWorld::new(TilePos::default());
        let result = builder.with_delay(Duration::ZERO).build(&mut world, &args.image);
        for command in world.commands() {
            println!("{}", command);
        }
        return finish(result.map(|_| ()));
    }

    let timeout = args.timeout_secs.map(Duration::from_secs);
    let connection = match PiConnection::connect(&args.host, args.port, timeout) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: Cannot connect to {}:{}: {}", args.host, args.port, e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    finish(builder.build(connection, &args.image).map(|_| ()))
}

fn finish(result: Result<(), BuildError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
