use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use package_builder::config::{PackageConfig, CONFIG_FILENAME};
use package_builder::recipe::settings::split_override;
use package_builder::{CoverageConfig, CoveragePipeline, Recipe, SystemTool};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "package-builder", version, about = "Build and package CMake libraries")]
struct Cli {
    /// Directory holding CMakeLists.txt
    #[arg(long, global = true, default_value = ".")]
    recipe_dir: PathBuf,

    /// Config file (default: <recipe-dir>/package.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print identity, target name, options and toolchain variables
    Inspect {
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Export, build, package and archive the library
    Create {
        #[command(flatten)]
        overrides: Overrides,

        /// Package version recorded in metadata and the archive name
        #[arg(long)]
        version: Option<String>,
    },
    /// Capture, filter and render code coverage
    Coverage {
        /// Directory holding the build tree (default: recipe dir)
        #[arg(long)]
        root: Option<PathBuf>,

        #[arg(long)]
        build_dir: Option<PathBuf>,

        /// Ignore-pattern file, relative to the root (default: utility/Coverage_Ignores.txt)
        #[arg(long)]
        ignores: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct Overrides {
    /// Setting override, e.g. -s compiler.cppstd=20
    #[arg(short = 's', long = "setting", value_name = "KEY=VALUE")]
    settings: Vec<String>,

    /// Option override, e.g. -o shared=False
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "package_builder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.recipe_dir.join(CONFIG_FILENAME));
    let config = PackageConfig::load(&config_path)?;

    match cli.command {
        Command::Inspect { overrides } => inspect(&cli.recipe_dir, &config, &overrides),
        Command::Create { overrides, version } => {
            create(&cli.recipe_dir, &config, &overrides, version.as_deref())
        }
        Command::Coverage {
            root,
            build_dir,
            ignores,
        } => coverage(&cli.recipe_dir, &config, root, build_dir, ignores),
    }
}

fn evaluate(
    recipe_dir: &Path,
    config: &PackageConfig,
    overrides: &Overrides,
    version: Option<&str>,
) -> Result<Recipe> {
    let mut settings = config.settings()?;
    for raw in &overrides.settings {
        let (key, value) = split_override(raw)?;
        settings.apply(key, value)?;
    }

    let options = overrides
        .options
        .iter()
        .map(|raw| split_override(raw).map(|(k, v)| (k.to_string(), v.to_string())))
        .collect::<Result<Vec<_>, _>>()?;

    Recipe::evaluate(recipe_dir, config, settings, &options, version)
        .with_context(|| format!("evaluating recipe in '{}'", recipe_dir.display()))
}

fn inspect(recipe_dir: &Path, config: &PackageConfig, overrides: &Overrides) -> Result<()> {
    let recipe = evaluate(recipe_dir, config, overrides, None)?;
    let settings = recipe.settings();

    println!("name:        {}", recipe.identity().name());
    println!("target:      {}", recipe.identity().cmake_target_name());
    if let Some(version) = recipe.version() {
        println!("version:     {version}");
    }
    println!("os:          {}", settings.os);
    println!("build_type:  {}", settings.build_type);
    if let Some(cppstd) = settings.compiler_cppstd {
        println!("cppstd:      {cppstd}");
    }
    for (name, value) in recipe.options().entries() {
        println!("option:      {name}={}", if value { "True" } else { "False" });
    }
    println!();
    print!("{}", recipe.toolchain().render());
    Ok(())
}

fn create(
    recipe_dir: &Path,
    config: &PackageConfig,
    overrides: &Overrides,
    version: Option<&str>,
) -> Result<()> {
    let recipe = evaluate(recipe_dir, config, overrides, version)?;
    let cmake = SystemTool::resolve("cmake", config.tools.cmake.as_deref());

    let artifact = recipe.create(&cmake)?;
    println!("package:  {}", artifact.package_dir.display());
    println!("archive:  {}", artifact.archive.display());
    println!("target:   {}", artifact.info.cmake_target_name);
    println!("libs:     {}", artifact.info.libs.join(", "));
    Ok(())
}

fn coverage(
    recipe_dir: &Path,
    config: &PackageConfig,
    root: Option<PathBuf>,
    build_dir: Option<PathBuf>,
    ignores: Option<PathBuf>,
) -> Result<()> {
    let root = root.unwrap_or_else(|| recipe_dir.to_path_buf());
    let coverage = CoverageConfig::from_section(&root, &config.coverage)
        .with_overrides(build_dir.as_deref(), ignores.as_deref());

    let lcov = SystemTool::resolve("lcov", config.tools.lcov.as_deref());
    let genhtml = SystemTool::resolve("genhtml", config.tools.genhtml.as_deref());
    let report = CoveragePipeline::new(&lcov, &genhtml, coverage).run()?;

    println!("report:   {}", report.report_dir.display());
    println!("files:    {}", report.source_files);
    println!("sha256:   {}", report.digest);
    Ok(())
}
