use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "rita", version, about = "Compile RITA rules into matchers or pipeline patterns")]
pub struct Args {
    /// Rules file to compile
    #[arg(short, long, value_name = "FILE")]
    pub file: PathBuf,

    /// Output JSONL file (default: stdout)
    #[arg(value_name = "OUT")]
    pub out: Option<PathBuf>,

    /// Compile target
    #[arg(long, default_value = "standalone", value_parser = ["standalone", "spacy"])]
    pub engine: String,

    /// Run the compiled rules against this text file and print matches
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Print the preprocessed rule groups instead of compiling them
    #[arg(long)]
    pub emit_ir: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}
