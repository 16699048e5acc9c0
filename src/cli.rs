// src/cli.rs
use anyhow::Context as _;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser, Subcommand};

use crate::commands;
use crate::config::{find_kubeconfig, HelperConfig};
use crate::credentials::exec::EXEC_INFO_ENV;
use crate::credentials::{own_executable, AssumeYes, ConsolePrompter, ExecCredentialError, Prompter};
use crate::utils::logging::{ConsoleLogger, FileLogger, Logger, MultiLogger};
use crate::vault::KeyringVault;

#[derive(Parser, Debug)]
#[command(
    name = "kubectl-credentials-helper",
    version,
    about = "Keeps kubeconfig credentials in the OS secret store",
    long_about = "Without a subcommand, answers the exec credential request kubectl passes in KUBERNETES_EXEC_INFO."
)]
pub struct Args {
    // Print diagnostics to stderr. Any env value but 0/false/no/off/n/f
    // turns it on; no value aborts parsing.
    #[arg(
        short,
        long,
        global = true,
        env = "KUBECTL_CREDENTIALS_HELPER_DEBUG",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub debug: bool,

    // Helper config file, defaults to ~/.kube/kubectl-credentials-helper.json
    #[arg(long, global = true, env = "KUBECTL_CREDENTIALS_HELPER_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// This makes your kubeconfig secure!
    Secure {
        /// Kubeconfig path
        #[arg(short = 'c', long)]
        kubeconfig: Option<String>,
        /// Secure specific user instead of all
        #[arg(short, long)]
        user: Option<String>,
        /// Answer yes to every question
        #[arg(short, long)]
        yes: bool,
    },
    /// This makes your kubeconfig insecure!
    Undo {
        /// Kubeconfig path
        #[arg(short = 'c', long)]
        kubeconfig: Option<String>,
    },
}

fn build_logger(config: &HelperConfig, debug: bool) -> anyhow::Result<Box<dyn Logger>> {
    let mut logger = MultiLogger::new().with(Box::new(ConsoleLogger::new(debug)));
    if let Some(path) = config.log_file_path() {
        let file_logger = FileLogger::new(&path, debug)
            .with_context(|| format!("cannot open log file {}", path))?;
        logger = logger.with(Box::new(file_logger));
    }
    Ok(Box::new(logger))
}

pub fn run(args: Args) -> anyhow::Result<()> {
    let config = HelperConfig::load(args.config.as_deref())?;
    let debug = args.debug || config.debug;
    let mut logger = build_logger(&config, debug)?;
    let vault = KeyringVault::new(&config.service);

    match args.command {
        None => {
            let raw = std::env::var(EXEC_INFO_ENV)
                .map_err(|_| ExecCredentialError::MissingEnv(EXEC_INFO_ENV))?;
            let stdout = std::io::stdout();
            commands::answer_request(&raw, &vault, logger.as_mut(), &mut stdout.lock())?;
        }
        Some(Command::Secure { kubeconfig, user, yes }) => {
            let path = find_kubeconfig(kubeconfig.as_deref(), logger.as_mut())?;
            let executable = own_executable()?;
            let mut prompter: Box<dyn Prompter> = if yes || config.assume_yes {
                Box::new(AssumeYes)
            } else {
                Box::new(ConsolePrompter)
            };
            let only_user = user.as_deref().filter(|u| !u.is_empty());
            commands::secure_file(
                &path,
                only_user,
                &vault,
                prompter.as_mut(),
                logger.as_mut(),
                &executable,
            )?;
        }
        Some(Command::Undo { kubeconfig }) => {
            let path = find_kubeconfig(kubeconfig.as_deref(), logger.as_mut())?;
            let executable = own_executable()?;
            commands::undo_file(&path, &vault, logger.as_mut(), &executable)?;
        }
    }

    Ok(())
}
