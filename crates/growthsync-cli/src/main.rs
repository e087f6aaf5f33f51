use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use growthsync_cli::config::DEFAULT_CONFIG_FILE;
use growthsync_cli::{draft_file, logging, AppConfig, StatusReport};
use growthsync_core::{
    evaluate, DraftEditor, DraftStore, Notifier, SyncAction, SyncController, TracingNotifier,
};
use growthsync_gateway::{ExperimentGateway, HttpGateway};
use growthsync_model::EntryLink;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

fn draft_arg() -> Arg {
    Arg::new("draft")
        .long("draft")
        .required(true)
        .value_name("FILE")
        .help("Draft JSON file, created if missing")
}

fn cli() -> Command {
    Command::new("growthsync")
        .version(growthsync_cli::VERSION)
        .about("Keep a CMS experiment draft in step with Growthbook")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("PATH")
                .help("Configuration file (default: ./growthsync.toml, optional)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("status")
                .about("Show the sync state and the offered action")
                .arg(draft_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(Command::new("create").about("Create the experiment on Growthbook").arg(draft_arg()))
        .subcommand(Command::new("update").about("Push variations to the experiment").arg(draft_arg()))
        .subcommand(Command::new("start").about("Start the experiment").arg(draft_arg()))
        .subcommand(
            Command::new("add-variation")
                .about("Append the next default variation name")
                .arg(draft_arg()),
        )
        .subcommand(
            Command::new("remove-variation")
                .about("Remove a variation and its linked entry")
                .arg(Arg::new("name").required(true).value_name("NAME"))
                .arg(draft_arg()),
        )
        .subcommand(
            Command::new("link")
                .about("Link an entry to a variation")
                .arg(Arg::new("name").required(true).value_name("NAME"))
                .arg(Arg::new("entry").required(true).value_name("ENTRY_ID"))
                .arg(draft_arg()),
        )
        .subcommand(
            Command::new("rename")
                .about("Set the experiment name")
                .arg(Arg::new("name").required(true).value_name("NAME"))
                .arg(draft_arg()),
        )
}

fn required<'a>(args: &'a ArgMatches, id: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("missing argument <{id}>"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    let log_json = matches
        .subcommand()
        .is_some_and(|(_, args)| args.get_flag("log-json"));
    logging::init_tracing(log_json);

    match run(&matches).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(matches: &ArgMatches) -> anyhow::Result<ExitCode> {
    let (command, args) = matches.subcommand().context("no command given")?;

    let config = match args.get_one::<String>("config") {
        Some(path) => AppConfig::load(Path::new(path), true)?,
        None => AppConfig::load(Path::new(DEFAULT_CONFIG_FILE), false)?,
    }
    .with_env();

    let draft_path = PathBuf::from(required(args, "draft")?);
    let store = Arc::new(DraftStore::from_draft(draft_file::load(&draft_path)?));

    match command {
        "status" => {
            let draft = store.snapshot();
            let url = draft.experiment_id().map(|id| config.sync.experiment_url(id));
            let report = StatusReport::new(&evaluate(&draft), url);
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.to_text());
            }
            Ok(ExitCode::SUCCESS)
        }
        "create" => sync(SyncAction::Create, &config, store, &draft_path).await,
        "update" => sync(SyncAction::Update, &config, store, &draft_path).await,
        "start" => sync(SyncAction::Start, &config, store, &draft_path).await,
        edit => {
            let editor = DraftEditor::new(Arc::clone(&store), Arc::new(TracingNotifier));
            match edit {
                "add-variation" => println!("added {}", editor.add_variation()?),
                "remove-variation" => editor.remove_variation(required(args, "name")?)?,
                "link" => editor.link_entry(
                    required(args, "name")?,
                    EntryLink::new(required(args, "entry")?),
                )?,
                "rename" => editor.set_experiment_name(required(args, "name")?),
                other => anyhow::bail!("unknown command {other}"),
            }
            draft_file::save(&draft_path, &store.snapshot())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Run one remote action, persist the draft, and wait for follow-up calls
async fn sync(
    action: SyncAction,
    config: &AppConfig,
    store: Arc<DraftStore>,
    draft_path: &Path,
) -> anyhow::Result<ExitCode> {
    let gateway: Arc<dyn ExperimentGateway> =
        Arc::new(HttpGateway::new(&config.gateway).context("configuring gateway")?);
    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let controller = SyncController::new(Arc::clone(&store), gateway, notifier, config.sync.clone());

    let outcome = controller.run(action).await;
    // Create commits the name and slug even when the call fails.
    draft_file::save(draft_path, &store.snapshot())?;

    match outcome {
        Ok(experiment) => {
            println!("experiment {} is {}", experiment.id, experiment.status);
            if let Some(url) = controller.experiment_url() {
                println!("{url}");
            }
            if controller.pending_tasks() > 0 {
                tracing::info!(
                    delay_ms = config.sync.feature_flag_delay_ms,
                    "waiting for feature flag creation"
                );
            }
            controller.shutdown().await;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{} failed: {e}", action.label());
            Ok(ExitCode::FAILURE)
        }
    }
}
