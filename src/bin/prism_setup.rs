use std::process::ExitCode;
use std::thread;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use prism_setup::config::ConfigLoader;
use prism_setup::console::Console;
use prism_setup::generator::SystemGenerator;
use prism_setup::pipeline::Pipeline;
use prism_setup::transfer::HttpTransferClient;

#[derive(Parser)]
#[command(name = "prism-setup")]
#[command(about = "First-run setup for the Prism engine: download dependencies and generate project files")]
#[command(version, author)]
struct Cli {
    #[arg(long, help = "Dependency bundle URL (overrides the config file)")]
    url: Option<String>,

    #[arg(long, help = "Path to a prism-setup.json config file")]
    config: Option<String>,

    #[arg(long, help = "Local filename for the downloaded archive")]
    archive: Option<String>,

    #[arg(long, help = "Directory the archive is extracted into")]
    dest: Option<String>,

    #[arg(long, help = "Project-file generation script")]
    script: Option<String>,

    #[arg(long, help = "Program used to launch the generation script")]
    launcher: Option<String>,

    #[arg(long, help = "Do not delete the archive after extraction")]
    keep_archive: bool,

    #[arg(long)]
    no_color: bool,

    #[arg(long)]
    non_interactive: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let console = Console::new(!cli.no_color, !cli.non_interactive);

    ctrlc::set_handler(move || {
        console.blank();
        console.warning("Setup interrupted by user");
        std::process::exit(1);
    })
    .into_diagnostic()?;

    let mut config = ConfigLoader::load(cli.config.as_deref()).into_diagnostic()?;
    if let Some(url) = cli.url {
        config.bundle_url = Some(url);
    }
    if let Some(archive) = cli.archive {
        config.archive_file = Some(archive);
    }
    if let Some(dest) = cli.dest {
        config.extract_to = Some(dest);
    }
    if let Some(script) = cli.script {
        config.generator_script = Some(script);
    }
    if let Some(launcher) = cli.launcher {
        config.generator_launcher = Some(launcher);
    }
    if cli.keep_archive {
        config.keep_archive = Some(true);
    }
    let resolved = ConfigLoader::resolve_config(config).into_diagnostic()?;
    let exit_pause = resolved.exit_pause;

    console.header("PRISM ENGINE SETUP");
    console.plain("Welcome to the Prism engine setup utility.");
    console.plain("This will download dependencies and configure your project.");

    let transfer = HttpTransferClient::new().into_diagnostic()?;
    let generator = SystemGenerator::new(
        resolved
            .generator_launcher
            .as_ref()
            .map(|path| path.as_std_path().to_path_buf()),
    );
    let pipeline = Pipeline::new(resolved, console, transfer, generator);
    pipeline.run().into_diagnostic()?;

    if !exit_pause.is_zero() {
        // cosmetic pause so the closing message is readable when the tool is
        // launched from a desktop shortcut
        console.plain(&format!(
            "This window will close in {} seconds.",
            exit_pause.as_secs()
        ));
        thread::sleep(exit_pause);
    }
    Ok(())
}
