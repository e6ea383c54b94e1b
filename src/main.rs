//! kind-bootstrap - bring a local kind cluster up or tear it down
//!
//! Exit codes: 0 success or help, 2 wrong argument count, 3 unrecognized
//! command, 4 missing configuration, otherwise the failing tool's own status.

use std::ffi::OsString;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use kind_bootstrap::runner::ProcessRunner;
use kind_bootstrap::usage::{missing_manifest_guidance, usage};
use kind_bootstrap::{
    BootstrapError, ClusterConfig, CommandError, ConfigError, ConfigLoader, Sequencer, StepError,
};

#[derive(Parser)]
#[command(name = "kind-bootstrap")]
#[command(
    disable_help_flag = true,
    disable_version_flag = true,
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Bootstrap the cluster
    Create,
    /// Destroy the cluster
    Delete,
    /// Print usage
    Help,
}

/// Select the command from the raw argument list (program name first)
fn parse_command<I, T>(args: I) -> Result<Commands, CommandError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let given = args.len().saturating_sub(1);
    if given != 1 {
        return Err(CommandError::BadArity(given));
    }

    Cli::try_parse_from(&args)
        .map(|cli| cli.command)
        .map_err(|_| CommandError::Unrecognized(args[1].to_string_lossy().into_owned()))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("kind-bootstrap: failed to set tracing subscriber");
    }
}

/// Sequencer backed by real processes, cancelled on Ctrl-C
fn process_sequencer() -> Sequencer {
    let sequencer = Sequencer::new(Arc::new(ProcessRunner::new()));
    let interrupt = sequencer.interrupt_handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Received Ctrl-C");
            interrupt.notify_one();
        }
    });

    sequencer
}

async fn run(args: Vec<OsString>) -> Result<(), BootstrapError> {
    match parse_command(args)? {
        Commands::Help => {
            print!("{}", usage());
            Ok(())
        }
        Commands::Create => {
            let config = ConfigLoader::new().load().await?;
            process_sequencer().create(&config).await
        }
        Commands::Delete => {
            let tools = ConfigLoader::new().load_tools().await;
            let config = ClusterConfig::default().with_tools(tools);
            info!("Deleting cluster");
            process_sequencer().delete(&config).await?;
            Ok(())
        }
    }
}

/// Print whatever the user needs to see for `err`
///
/// External tool failures print nothing: the tool's own output already
/// reached the terminal.
fn report(err: &BootstrapError) {
    match err {
        BootstrapError::Command(CommandError::BadArity(_)) => print!("{}", usage()),
        BootstrapError::Command(CommandError::Unrecognized(_)) => {
            println!("bad command");
            print!("{}", usage());
        }
        BootstrapError::Config(ConfigError::MissingManifest) => {
            println!("{}", missing_manifest_guidance());
            print!("{}", usage());
        }
        BootstrapError::Config(e) => {
            eprintln!("kind-bootstrap: {}", e);
            print!("{}", usage());
        }
        BootstrapError::Step(StepError::ExternalFailure { .. }) => {}
        BootstrapError::Step(e) => eprintln!("kind-bootstrap: {}", e),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_logging();

    match run(std::env::args_os().collect()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("Exiting: {}", e);
            report(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(parse_command(["kb", "create"]), Ok(Commands::Create));
        assert_eq!(parse_command(["kb", "delete"]), Ok(Commands::Delete));
        assert_eq!(parse_command(["kb", "help"]), Ok(Commands::Help));
    }

    #[test]
    fn test_parse_wrong_arity() {
        assert_eq!(parse_command(["kb"]), Err(CommandError::BadArity(0)));
        assert_eq!(
            parse_command(["kb", "create", "extra"]),
            Err(CommandError::BadArity(2))
        );
    }

    #[test]
    fn test_parse_unrecognized() {
        assert_eq!(
            parse_command(["kb", "destroy"]),
            Err(CommandError::Unrecognized("destroy".to_string()))
        );
        assert_eq!(
            parse_command(["kb", "--help"]),
            Err(CommandError::Unrecognized("--help".to_string()))
        );
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
