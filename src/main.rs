//! Annotation layout CLI
//!
//! Usage:
//!   anno-layout <KIND> <SCENE> [OPTIONS]
//!
//! Runs one layout operation over a TOML scene file and prints what
//! moved. With --out the updated scene is written back to disk.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use anno_layout::host::MarkerId;
use anno_layout::{run_layout, LayoutKind, LayoutOutcome, LayoutRequest, RunConfig, Scene};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Left,
    Right,
    Up,
    Down,
    Center,
    Middle,
    DistributeHorizontal,
    DistributeVertical,
    UntangleHorizontal,
    UntangleVertical,
    Arrange,
}

impl From<KindArg> for LayoutKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Left => LayoutKind::AlignLeft,
            KindArg::Right => LayoutKind::AlignRight,
            KindArg::Up => LayoutKind::AlignUp,
            KindArg::Down => LayoutKind::AlignDown,
            KindArg::Center => LayoutKind::AlignCenter,
            KindArg::Middle => LayoutKind::AlignMiddle,
            KindArg::DistributeHorizontal => LayoutKind::DistributeHorizontal,
            KindArg::DistributeVertical => LayoutKind::DistributeVertical,
            KindArg::UntangleHorizontal => LayoutKind::UntangleHorizontal,
            KindArg::UntangleVertical => LayoutKind::UntangleVertical,
            KindArg::Arrange => LayoutKind::Arrange,
        }
    }
}

#[derive(Parser)]
#[command(name = "anno-layout")]
#[command(about = "Align, distribute, untangle and arrange annotation markers")]
struct Cli {
    /// Layout operation to run
    #[arg(value_enum)]
    kind: KindArg,

    /// Scene file (TOML format)
    scene: PathBuf,

    /// Marker ids to lay out, comma separated (defaults to all markers)
    #[arg(long, value_delimiter = ',')]
    ids: Vec<u64>,

    /// Write the updated scene to this file
    #[arg(long)]
    out: Option<PathBuf>,

    /// Debug mode: dump computed targets to stderr
    #[arg(short, long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut scene = match Scene::from_file(&cli.scene) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading scene '{}': {}", cli.scene.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let selection: Vec<MarkerId> = if cli.ids.is_empty() {
        scene.marker_ids()
    } else {
        cli.ids.iter().map(|&id| MarkerId(id)).collect()
    };

    let request = LayoutRequest {
        kind: cli.kind.into(),
        selection,
    };
    let config = RunConfig {
        debug: cli.debug,
        ..Default::default()
    };

    let outcome = LayoutOutcome::from(run_layout(&mut scene, &request, &config));
    let summary = match outcome {
        LayoutOutcome::Succeeded(summary) => summary,
        LayoutOutcome::Cancelled => {
            eprintln!("Cancelled.");
            return ExitCode::SUCCESS;
        }
        LayoutOutcome::Failed(msg) => {
            eprintln!("Error: {}", msg);
            return ExitCode::FAILURE;
        }
    };

    println!(
        "moved {} marker(s), skipped {} pinned, {} in place, {} unmeasured",
        summary.moved, summary.skipped_pinned, summary.skipped_zero, summary.skipped_unmeasured
    );

    if let Some(out) = &cli.out {
        let text = match toml::to_string_pretty(&scene.to_scene_file()) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Error serializing scene: {}", e);
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = std::fs::write(out, text) {
            eprintln!("Error writing '{}': {}", out.display(), e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
