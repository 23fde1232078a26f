mod cli;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, FilterArgs, ProfileArg, QualityArgs};
use mb_av::actions::{encode_task, SplitOptions};
use mb_av::{workdir, SystemRunner, ToolRegistry, FFMPEG, MPLAYER};
use mb_core::config::Config;
use mb_core::{BatchReport, FilterSweep, RunContext};

/// Everything a batch command needs, resolved from config and flags.
struct Session {
    config: Config,
    ctx: RunContext,
    tools: ToolRegistry,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self> {
        let config = match cli.config.as_deref() {
            Some(path) => Config::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => Config::default(),
        };
        for warning in config.validate() {
            tracing::warn!("config: {warning}");
        }

        let workdir = match cli.workdir {
            Some(ref dir) => absolute(dir)?,
            None => std::env::current_dir()?,
        };
        if !workdir.is_dir() {
            anyhow::bail!("Working directory does not exist: {:?}", workdir);
        }

        let log_file = cli.log_file.as_ref().unwrap_or(&config.log_file);
        let ctx = RunContext::new(workdir, log_file)?;
        tracing::debug!("run log: {}", ctx.log().path().display());

        let tools = ToolRegistry::discover(&config.tools);
        Ok(Self { config, ctx, tools })
    }
}

/// Resolve `path` against the process working directory. Tools run inside
/// the session workdir, so every path handed to them must be absolute.
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediabatch=trace,mb_av=trace,mb_core=debug".to_string()
        } else {
            "mediabatch=info,mb_av=info,mb_core=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Split {
            ref device,
            ref out_dir,
            ref ext,
        } => rt.block_on(split(&cli, device.as_deref(), out_dir.as_deref(), ext.as_deref())),
        Commands::Encode {
            ref inputs,
            ref dir,
            ref ext,
            recursive,
            profile,
            ref output,
            keep_name,
            ref quality,
            ref filters,
        } => rt.block_on(encode(
            &cli,
            EncodeRequest {
                inputs,
                dir: dir.as_deref(),
                ext: ext.as_deref(),
                recursive,
                profile,
                output: output.as_deref(),
                keep_name,
                quality,
                filters,
            },
        )),
        Commands::Sweep {
            ref input,
            profile,
            ref denoise,
            ref deband,
            ref sharpen,
            no_deinterlace,
            ref quality,
        } => {
            let candidates = FilterSweep {
                deband: deband.clone(),
                denoise: denoise.clone(),
                sharpen: sharpen.clone(),
            };
            rt.block_on(sweep(&cli, input, profile, candidates, no_deinterlace, quality))
        }
        Commands::CheckTools { json } => rt.block_on(check_tools(&cli, json)),
        Commands::Validate { ref config } => {
            let path = config.as_deref().or(cli.config.as_deref());
            validate_config(path)
        }
    }
}

async fn split(
    cli: &Cli,
    device: Option<&Path>,
    out_dir: Option<&Path>,
    ext: Option<&str>,
) -> Result<()> {
    let session = Session::open(cli)?;
    let mplayer = session.tools.require(MPLAYER)?;

    let device = device.unwrap_or(&session.config.split.device);
    let out_dir = match out_dir.or(session.config.split.out_dir.as_deref()) {
        Some(dir) => absolute(dir)?,
        None => session.ctx.workdir().to_path_buf(),
    };
    let opts = SplitOptions {
        device: absolute(device)?,
        out_dir,
        extension: ext.unwrap_or(&session.config.split.extension).to_string(),
    };

    tracing::info!("Splitting {:?} into {:?}", opts.device, opts.out_dir);
    let report = mb_av::split_disc(&session.ctx, &SystemRunner, mplayer, &opts)
        .await
        .with_context(|| format!("cannot split {}", opts.device.display()))?;

    if report.is_empty() {
        println!("No titles to extract.");
        return Ok(());
    }
    finish(&report)
}

struct EncodeRequest<'a> {
    inputs: &'a [PathBuf],
    dir: Option<&'a Path>,
    ext: Option<&'a str>,
    recursive: bool,
    profile: ProfileArg,
    output: Option<&'a Path>,
    keep_name: bool,
    quality: &'a QualityArgs,
    filters: &'a FilterArgs,
}

async fn encode(cli: &Cli, req: EncodeRequest<'_>) -> Result<()> {
    let session = Session::open(cli)?;
    let ffmpeg = session.tools.require(FFMPEG)?;

    let mut profile = req.profile.profile(&session.config.encode);
    req.quality.apply(&mut profile)?;
    req.filters.apply(profile.filters_mut());
    profile.validate()?;

    let inputs = if req.inputs.is_empty() {
        let dir = match req.dir {
            Some(d) => absolute(d)?,
            None => session.ctx.workdir().to_path_buf(),
        };
        let ext = req.ext.unwrap_or(&session.config.encode.input_extension);
        let found = if req.recursive || session.config.encode.recursive {
            workdir::find_by_extension_recursive(&dir, ext)?
        } else {
            workdir::find_by_extension(&dir, ext)?
        };
        tracing::info!("found {} .{ext} file(s) in {}", found.len(), dir.display());
        found
    } else {
        let mut inputs = Vec::with_capacity(req.inputs.len());
        for input in req.inputs {
            if !input.exists() {
                anyhow::bail!("Input file does not exist: {:?}", input);
            }
            inputs.push(absolute(input)?);
        }
        inputs
    };

    if inputs.is_empty() {
        println!("No input files found.");
        return Ok(());
    }
    if req.output.is_some() && inputs.len() > 1 {
        anyhow::bail!("--output can only be used with a single input file");
    }

    let mut tasks = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let output = match req.output {
            Some(o) => Some(absolute(o)?),
            None if req.keep_name => Some(input.with_extension(profile.container())),
            None => None,
        };
        let task = encode_task(input, output, profile.clone());
        if task.output == task.input {
            anyhow::bail!("Output would overwrite input: {:?}", task.input);
        }
        tasks.push(task);
    }

    let report = mb_av::encode_batch(&session.ctx, &SystemRunner, ffmpeg, &tasks).await?;
    finish(&report)
}

async fn sweep(
    cli: &Cli,
    input: &Path,
    profile: ProfileArg,
    candidates: FilterSweep,
    no_deinterlace: bool,
    quality: &QualityArgs,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let session = Session::open(cli)?;
    let ffmpeg = session.tools.require(FFMPEG)?;

    let mut base = profile.profile(&session.config.encode);
    quality.apply(&mut base)?;
    if no_deinterlace {
        base.filters_mut().deinterlace = false;
    }

    println!(
        "Sweeping {} filter combination(s) over {}",
        candidates.len(),
        input.display()
    );
    let input = absolute(input)?;
    let report =
        mb_av::sweep(&session.ctx, &SystemRunner, ffmpeg, &input, &base, &candidates).await?;
    finish(&report)
}

/// Print the per-task summary; fail if any task failed.
fn finish(report: &BatchReport) -> Result<()> {
    println!();
    for task in &report.tasks {
        let status = if task.outcome.is_success() { "✓" } else { "✗" };
        println!(
            "{} {} [{:.2} min] {}",
            status,
            task.label,
            task.elapsed.as_secs_f64() / 60.0,
            task.outcome
        );
    }
    println!(
        "\n{} succeeded, {} failed, {:.2} min total",
        report.succeeded(),
        report.failed(),
        report.total_elapsed().as_secs_f64() / 60.0
    );

    if report.failed() > 0 {
        let labels: Vec<&str> = report.failures().map(|t| t.label.as_str()).collect();
        anyhow::bail!(
            "{} of {} task(s) failed: {}",
            report.failed(),
            report.len(),
            labels.join(", ")
        );
    }
    Ok(())
}

async fn check_tools(cli: &Cli, json: bool) -> Result<()> {
    let config = Config::load_or_default(cli.config.as_deref());
    let tools = ToolRegistry::discover(&config.tools).check_all().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    println!("Checking external tools...\n");
    let mut all_ok = true;
    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = Config::load(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Log file: {}", config.log_file.display());
    println!(
        "  Split: {} -> *.{}",
        config.split.device.display(),
        config.split.extension
    );
    println!("  Encode inputs: *.{}", config.encode.input_extension);
    for profile in config.encode.profiles() {
        println!(
            "  {}: {}",
            profile,
            profile.filters().expression().unwrap_or_else(|| "no filters".into())
        );
    }

    let warnings = config.validate();
    for warning in &warnings {
        println!("  ⚠ {}", warning);
    }

    Ok(())
}
