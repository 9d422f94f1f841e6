//! `inject` subcommand

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use bugsmith_engine::{BugInjector, EngineConfig, ErrorResponse, MutationResponse, MutationResult};

/// Mutation succeeded
pub(crate) const EXIT_OK: i32 = 0;
/// Engine rejected the input
pub(crate) const EXIT_INJECTION: i32 = 1;
/// Bad usage, unreadable input or unwritable output
pub(crate) const EXIT_USAGE: i32 = 2;

/// Where the source comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Input {
    File(PathBuf),
    Stdin,
}

/// Parsed `inject` arguments
#[derive(Debug, Clone)]
pub(crate) struct InjectArgs {
    pub(crate) input: Input,
    pub(crate) level: i64,
    pub(crate) seed: Option<u64>,
    pub(crate) output: Option<PathBuf>,
    pub(crate) json: bool,
    pub(crate) header: bool,
}

/// Run the subcommand, returning the process exit code
pub(crate) fn run(args: &InjectArgs, stdout: &mut impl Write, stderr: &mut impl Write) -> i32 {
    let source = match read_input(&args.input) {
        Ok(source) => source,
        Err(e) => {
            let _ = writeln!(stderr, "Error: {:#}", e);
            return EXIT_USAGE;
        }
    };

    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::debug!("Using seed {}", seed);

    let injector = BugInjector::with_config(EngineConfig::default().with_header(args.header));
    match injector.inject_seeded(&source, args.level, seed) {
        Ok(result) => match emit(args, seed, result, stdout, stderr) {
            Ok(()) => EXIT_OK,
            Err(e) => {
                let _ = writeln!(stderr, "Error: {:#}", e);
                EXIT_USAGE
            }
        },
        Err(e) => {
            if args.json {
                let response = ErrorResponse::from(&e);
                if let Ok(json) = serde_json::to_string_pretty(&response) {
                    let _ = writeln!(stdout, "{}", json);
                }
            } else {
                let _ = writeln!(stderr, "Error: {}", e);
            }
            EXIT_INJECTION
        }
    }
}

fn read_input(input: &Input) -> anyhow::Result<String> {
    let bytes = match input {
        Input::File(path) => {
            ensure_python(path)?;
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?
        }
        Input::Stdin => {
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .context("Failed to read standard input")?;
            bytes
        }
    };
    decode(bytes)
}

fn ensure_python(path: &Path) -> anyhow::Result<()> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("py") {
        bail!("{} is not a Python (.py) file", path.display());
    }
    Ok(())
}

fn decode(bytes: Vec<u8>) -> anyhow::Result<String> {
    String::from_utf8(bytes).map_err(|_| anyhow!("File contains invalid UTF-8 characters"))
}

fn emit(
    args: &InjectArgs,
    seed: u64,
    result: MutationResult,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> anyhow::Result<()> {
    if let Some(path) = &args.output {
        std::fs::write(path, &result.mutated_text)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if args.json {
        let response = MutationResponse::from(result);
        let json = serde_json::to_string_pretty(&response).context("Failed to encode result")?;
        writeln!(stdout, "{}", json)?;
        writeln!(stderr, "Seed: {}", seed)?;
        return Ok(());
    }

    if args.output.is_none() {
        stdout.write_all(result.mutated_text.as_bytes())?;
    }

    writeln!(
        stderr,
        "Injected {} bugs at chaos level {} (seed {})",
        result.bug_count(),
        result.chaos_level,
        seed
    )?;
    for record in &result.bug_log {
        writeln!(stderr, "  - {}", record.description)?;
    }
    Ok(())
}
