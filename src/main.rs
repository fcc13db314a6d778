use clap::Parser;
use miette::Result;
use mct::cli::{Cli, Commands, GlobalOpts};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_logging(&global);

    match cli.command {
        Commands::Init(args) => mct::cli::commands::init::run(args, &global),
        Commands::Rpt(cmd) => mct::cli::commands::rpt::run(cmd, &global),
        Commands::Cert(cmd) => mct::cli::commands::cert::run(cmd, &global),
        Commands::Eval(cmd) => mct::cli::commands::eval::run(cmd, &global),
        Commands::Config(cmd) => mct::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => mct::cli::commands::completions::run(args),
    }
}

/// Log to stderr; `MCT_LOG` takes filter directives, `--verbose` forces debug
fn init_logging(global: &GlobalOpts) {
    let filter = if global.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("MCT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .try_init();
}
