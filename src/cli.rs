use crate::Diagnose;
use clap::{Args, Parser, Subcommand};
use clipflow_api::client::HttpClient;
use clipflow_api::models::{Item, ItemStatus, ResourceId, ResourceKind};
use clipflow_api::{ClientHandle, Filters};
use clipflow_browser::upload::UploadState;
use clipflow_browser::{Browser, Notice, Notifier, Session, SessionHandle, load_folder_tree};
use clipflow_config::Config;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "clipflow", version, about = "Browse and upload to clipflow resource libraries")]
pub struct Cli {
    /// Config file (TOML, YAML or JSON). Merged over the platform config file.
    #[arg(long, short, global = true, env = "CLIPFLOW_CONFIG")]
    pub config: Option<PathBuf>,
    /// More detailed logging (overridden by `RUST_LOG` / `CLIPFLOW_LOG`).
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the signed-in user and their permissions.
    Whoami,
    /// List one page of a collection.
    List(ListArgs),
    /// Print the folder tree of a folder collection.
    Folders {
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,
    },
    /// Upload files into a library.
    Upload(UploadArgs),
    /// Delete rows by id.
    Delete {
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,
        #[arg(required = true)]
        ids: Vec<String>,
        /// Skip the trash, where the collection has one.
        #[arg(long)]
        hard: bool,
    },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(value_parser = parse_kind)]
    pub kind: ResourceKind,
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    /// Rows per page (defaults to the configured page size).
    #[arg(long)]
    pub per_page: Option<u32>,
    #[arg(long, short)]
    pub search: Option<String>,
    #[arg(long, value_parser = parse_status)]
    pub status: Option<ItemStatus>,
    #[arg(long)]
    pub folder: Option<String>,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    #[arg(value_parser = parse_kind)]
    pub kind: ResourceKind,
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Destination path inside the library.
    #[arg(long, default_value = "")]
    pub path: String,
    /// Files transferred at once (defaults to the configured value).
    #[arg(long)]
    pub concurrency: Option<usize>,
}

fn parse_kind(raw: &str) -> Result<ResourceKind, String> {
    raw.parse().map_err(|_| {
        let known: Vec<&str> = ResourceKind::ALL.iter().map(ResourceKind::path).collect();
        format!("expected one of: {}", known.join(", "))
    })
}

fn parse_status(raw: &str) -> Result<ItemStatus, String> {
    raw.parse().map_err(|_| "expected one of: ready, processing, pending, failed".to_string())
}

/// Prints notices for the person at the terminal.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        eprintln!("{}: {}", notice.level, notice.message);
    }
}

struct Context {
    config: Config,
    client: ClientHandle,
    session: SessionHandle,
}

impl Context {
    async fn open(config: Config) -> miette::Result<Self> {
        let http = HttpClient::new("default", &config.api.base_url, config.api.token.clone(), config.timeout());
        let client: ClientHandle = Arc::new(http.diagnose()?);
        let session = Session::start(client.as_ref(), Arc::new(ConsoleNotifier)).await.diagnose()?;
        Ok(Self {
            config,
            client,
            session,
        })
    }

    fn browser(&self, kind: ResourceKind) -> Browser<Item> {
        Browser::new(kind, self.client.clone(), self.session.clone())
            .with_per_page(self.config.browser.per_page)
            .with_upload_concurrency(self.config.browser.upload_concurrency)
    }
}

pub async fn run(command: Command, config: Config) -> miette::Result<()> {
    let ctx = Context::open(config).await?;
    match command {
        Command::Whoami => whoami(&ctx),
        Command::List(args) => list(&ctx, args).await,
        Command::Folders { kind } => folders(&ctx, kind).await,
        Command::Upload(args) => upload(&ctx, args).await,
        Command::Delete { kind, ids, hard } => delete(&ctx, kind, ids, hard).await,
    }
}

fn whoami(ctx: &Context) -> miette::Result<()> {
    let profile = ctx.session.profile();
    println!("{} (#{}, {:?})", profile.name, profile.id, profile.role);
    if let Some(email) = &profile.email {
        println!("{email}");
    }
    for slug in &profile.permissions {
        println!("  {slug}");
    }
    Ok(())
}

async fn list(ctx: &Context, args: ListArgs) -> miette::Result<()> {
    let mut filters = Filters::default();
    filters.status = args.status;
    filters.folder_id = args.folder.map(ResourceId::from);
    if let Some(search) = &args.search {
        filters.set_search(search.as_str());
    }
    let per_page = args.per_page.unwrap_or(ctx.config.browser.per_page);
    let mut browser = ctx.browser(args.kind).with_per_page(per_page).with_filters(filters);
    browser.reload().await.diagnose()?;
    if args.page > 1 && !browser.go_to_page(args.page).await.diagnose()? {
        miette::bail!("page {} does not exist; there are {} pages", args.page, browser.paginator().total_pages());
    }
    if browser.is_empty() {
        println!("Nothing found.");
        return Ok(());
    }
    for item in browser.items() {
        let size = item.dimensions().map(|(w, h)| format!("{w}x{h}")).unwrap_or_default();
        println!("{:>8}  {:<10}  {:<9}  {}", item.id, item.status, size, item.name);
    }
    let paginator = browser.paginator();
    println!("{} (page {} of {})", paginator.summary(), paginator.page(), paginator.total_pages());
    Ok(())
}

async fn folders(ctx: &Context, kind: ResourceKind) -> miette::Result<()> {
    if !kind.is_folder() {
        miette::bail!("{kind} is not a folder collection");
    }
    let tree = load_folder_tree(ctx.client.as_ref(), kind, ctx.config.browser.per_page).await.diagnose()?;
    for (depth, folder) in tree.walk() {
        println!("{}{} ({} items) [#{}]", "  ".repeat(depth), folder.name, folder.item_count, folder.id);
    }
    Ok(())
}

async fn read_file(path: &Path) -> miette::Result<(String, Vec<u8>)> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| miette::miette!("not a file: {}", path.display()))?;
    let bytes = tokio::fs::read(path).await.map_err(|err| miette::miette!("could not read {}: {err}", path.display()))?;
    Ok((name.to_string(), bytes))
}

async fn upload(ctx: &Context, args: UploadArgs) -> miette::Result<()> {
    let mut browser = ctx.browser(args.kind);
    if let Some(concurrency) = args.concurrency {
        browser = browser.with_upload_concurrency(concurrency);
    }
    for path in &args.files {
        let (name, bytes) = read_file(path).await?;
        browser.enqueue(&name, bytes, &args.path).diagnose()?;
    }
    let summary = browser.upload_queued().await.diagnose()?;
    for task in browser.uploads().tasks() {
        match task.state() {
            UploadState::Ready { remote_id } => println!("ready       {}  #{remote_id}", task.file_name()),
            UploadState::Processing { remote_id } => println!("processing  {}  #{remote_id}", task.file_name()),
            UploadState::Failed { reason, .. } => println!("failed      {}  {reason}", task.file_name()),
            other => println!("{:<10}  {}", other.name(), task.file_name()),
        }
    }
    if summary.failed > 0 {
        miette::bail!("{} of {} uploads failed", summary.failed, summary.total());
    }
    Ok(())
}

async fn delete(ctx: &Context, kind: ResourceKind, ids: Vec<String>, hard: bool) -> miette::Result<()> {
    let mut browser = ctx.browser(kind);
    browser.reload().await.diagnose()?;
    for id in ids {
        browser.toggle(ResourceId::from(id));
    }
    let outcome = browser.delete_selected(hard).await.diagnose()?;
    for id in &outcome.deleted {
        println!("deleted  #{id}");
    }
    for (id, reason) in &outcome.failed {
        println!("failed   #{id}  {reason}");
    }
    if !outcome.failed.is_empty() {
        miette::bail!("{} of {} deletions failed", outcome.failed.len(), outcome.failed.len() + outcome.deleted.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["clipflow", "whoami"])]
    #[case(&["clipflow", "list", "footage", "--page", "2", "--status", "ready", "-s", "beach"])]
    #[case(&["clipflow", "folders", "media_folders"])]
    #[case(&["clipflow", "upload", "bgm", "a.mp3", "b.mp3", "--path", "summer", "--concurrency", "2"])]
    #[case(&["clipflow", "-v", "delete", "images", "4", "5", "--hard"])]
    fn test_parses(#[case] argv: &[&str]) {
        Cli::try_parse_from(argv).unwrap();
    }

    #[rstest]
    #[case(&["clipflow", "list", "podcasts"])]
    #[case(&["clipflow", "list", "footage", "--status", "done"])]
    #[case(&["clipflow", "upload", "bgm"])]
    #[case(&["clipflow", "delete", "images"])]
    fn test_rejects(#[case] argv: &[&str]) {
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_list_arguments() {
        let cli = Cli::try_parse_from(["clipflow", "list", "video-overlays", "--folder", "9"]).unwrap();
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.kind, ResourceKind::VideoOverlays);
        assert_eq!((args.page, args.per_page), (1, None));
        assert_eq!(args.folder.as_deref(), Some("9"));
    }
}
