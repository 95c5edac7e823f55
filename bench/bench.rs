//! Benchmark rule compilation and execution on a generated corpus.
//!
//! Usage:
//!   cargo run --release --bin bench_rita             # compile + execute + report
//!   cargo run --release --bin bench_rita -- compile  # compile timing only
//!   cargo run --release --bin bench_rita -- execute  # execution timing only

use std::fmt::Write;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use rita::no_variables;

// --- CLI ---

#[derive(Parser)]
#[command(about = "Benchmark rita. Writes results to bench/results.md.")]
struct Args {
    /// Subcommand: compile, execute, or omit for all
    #[arg(default_value = "all")]
    mode: String,

    /// Timed runs per case
    #[arg(long, default_value_t = 5)]
    runs: u32,

    /// Sentences in the generated corpus
    #[arg(long, default_value_t = 20_000)]
    sentences: usize,

    /// Output markdown file path (relative to project root)
    #[arg(long)]
    output: Option<PathBuf>,
}

// --- Cases ---

struct BenchCase {
    name: &'static str,
    rules: &'static str,
}

static CASES: &[BenchCase] = &[
    BenchCase {
        name: "colored-car",
        rules: r#"
colors = {"red", "green", "blue", "white", "black"}
{IN_LIST(colors), WORD("car")}->MARK("CAR_COLOR")
"#,
    },
    BenchCase {
        name: "branching",
        rules: r#"
models = {"Model S", "Model 3", "Roadster", "Cybertruck", "Leaf"}
{IN_LIST(models), WORD("is")?, WORD("fast")|WORD("cheap")}->MARK("CAR_TRAIT")
"#,
    },
    BenchCase {
        name: "fuzzy",
        rules: r#"
!IMPORT("rita.modules.fuzzy")
FUZZY("squirrel")->MARK("CRITTER")
FUZZY("good")->MARK("QUALITY")
"#,
    },
    BenchCase {
        name: "numbers",
        rules: r#"
{NUM, WORD("dollars")|WORD("euros")}->MARK("PRICE")
{WORD("phone"), ANY, NUM+}->MARK("PHONE_PRICE")
"#,
    },
];

static WORDS: &[&str] = &[
    "the", "a", "red", "car", "is", "very", "fast", "cheap", "Model", "S", "squirrel", "squirel",
    "good", "gooood", "phone", "costs", "100", "dollars", "euros", "green", "Leaf", "runs",
];

// --- Helpers ---

fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Deterministic pseudo-random text, so runs are comparable.
fn generate_corpus(sentences: usize) -> String {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    let mut text = String::new();
    for _ in 0..sentences {
        let len = 4 + (next() % 8) as usize;
        for i in 0..len {
            if i > 0 {
                text.push(' ');
            }
            text.push_str(WORDS[(next() % WORDS.len() as u64) as usize]);
        }
        text.push_str(". ");
    }
    text
}

fn format_time(seconds: f64) -> String {
    if seconds < 1.0 {
        format!("{:.1}ms", seconds * 1000.0)
    } else {
        format!("{seconds:.2}s")
    }
}

fn median(mut samples: Vec<f64>) -> f64 {
    samples.sort_by(f64::total_cmp);
    samples[samples.len() / 2]
}

// --- Bench ---

struct CaseResult {
    name: &'static str,
    groups: usize,
    compile: Option<f64>,
    execute: Option<f64>,
    matches: usize,
}

fn run_case(case: &'static BenchCase, corpus: &str, args: &Args) -> CaseResult {
    let mut compile_times = Vec::new();
    let mut artifact = None;
    for _ in 0..args.runs.max(1) {
        let start = Instant::now();
        let compiled = rita::compile_string(case.rules, "standalone", no_variables())
            .unwrap_or_else(|e| panic!("{}: {e}", case.name));
        compile_times.push(start.elapsed().as_secs_f64());
        artifact = Some(compiled);
    }
    let artifact = artifact.unwrap();
    let groups = artifact.executor().map_or(0, |e| e.len());

    let timed_execute = args.mode != "compile";
    let mut execute_times = Vec::new();
    let mut matches = 0;
    if timed_execute {
        for _ in 0..args.runs.max(1) {
            let start = Instant::now();
            matches = artifact.execute(corpus).unwrap().len();
            execute_times.push(start.elapsed().as_secs_f64());
        }
    }

    CaseResult {
        name: case.name,
        groups,
        compile: (args.mode != "execute").then(|| median(compile_times)),
        execute: timed_execute.then(|| median(execute_times)),
        matches,
    }
}

// --- Report generation ---

fn generate_report(results: &[CaseResult], args: &Args, corpus_bytes: usize) -> String {
    let mut md = String::new();
    writeln!(md, "# rita Benchmark Results").unwrap();
    writeln!(md).unwrap();
    writeln!(
        md,
        "**Corpus:** {} sentences ({} KiB), **runs:** {} (median)",
        args.sentences,
        corpus_bytes / 1024,
        args.runs
    )
    .unwrap();
    writeln!(md).unwrap();
    writeln!(md, "| Case | Rule groups | Compile | Execute | Matches |").unwrap();
    writeln!(md, "|------|------------:|--------:|--------:|--------:|").unwrap();
    for r in results {
        writeln!(
            md,
            "| {} | {} | {} | {} | {} |",
            r.name,
            r.groups,
            r.compile.map_or("-".to_string(), format_time),
            r.execute.map_or("-".to_string(), format_time),
            r.matches
        )
        .unwrap();
    }
    md
}

fn main() {
    let args = Args::parse();
    if !matches!(args.mode.as_str(), "compile" | "execute" | "all") {
        eprintln!("Unknown mode: {}. Use: compile, execute, or all.", args.mode);
        std::process::exit(1);
    }
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| project_root().join("bench/results.md"));

    let corpus = generate_corpus(args.sentences);
    let start = Instant::now();
    let results: Vec<CaseResult> = CASES
        .iter()
        .map(|case| {
            eprintln!("Running {}...", case.name);
            run_case(case, &corpus, &args)
        })
        .collect();
    eprintln!("Total: {}", format_time(start.elapsed().as_secs_f64()));

    let md = generate_report(&results, &args, corpus.len());
    fs::write(&output_path, &md).unwrap();
    eprintln!("\nWrote {}", output_path.display());
}
