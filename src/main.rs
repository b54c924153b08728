//! `tflite2onnx` command-line tool

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::info;

use tflite2onnx::io::{convert_file, ConvertOptions};
use tflite2onnx::layout::LayoutApproach;
use tflite2onnx::logger::{init_log, level_for};

#[derive(Parser, Debug)]
#[command(name = "tflite2onnx")]
#[command(about = "Convert a TensorFlow Lite model to ONNX")]
#[command(version)]
struct Args {
    /// Input TFLite model
    input: PathBuf,

    /// Output ONNX model
    output: PathBuf,

    /// How layout mismatches are resolved
    #[arg(long, value_enum, default_value_t = LayoutArg::Propagation)]
    layout: LayoutArg,

    /// Skip the conformance check before saving
    #[arg(long)]
    no_validate: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LayoutArg {
    /// Keep channel-first tensors between layout-sensitive operators
    Propagation,
    /// Wrap every layout-sensitive operator in its own transposes
    Transpose,
}

impl From<LayoutArg> for LayoutApproach {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Propagation => LayoutApproach::Propagation,
            LayoutArg::Transpose => LayoutApproach::Transpose,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_log(level_for(args.verbose)) {
        eprintln!("failed to initialize logging: {}", e);
    }

    let options = ConvertOptions {
        approach: args.layout.into(),
        validate: !args.no_validate,
        ..Default::default()
    };

    match convert_file(&args.input, &args.output, &options) {
        Ok(stats) => {
            info!(
                "{} -> {}: {} operators, {} nodes ({} transposes), {} bytes",
                args.input.display(),
                args.output.display(),
                stats.source_operators,
                stats.nodes,
                stats.transposes,
                stats.output_size
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
