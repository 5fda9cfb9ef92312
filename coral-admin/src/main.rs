use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::Context;
use coral_client::{
    api::{CommentId, Uuid},
    Client, ClientConfig, RenderContext, ThreadComposer, TracingSink,
};
use coral_mock_server::{Fixture, MockServer};

mod audit;
mod print;

#[derive(structopt::StructOpt)]
struct Opt {
    /// JSON fixture the data layer is seeded with
    #[structopt(short, long)]
    fixture: PathBuf,

    /// Only render the thread of this top-level comment
    #[structopt(short, long)]
    comment: Option<Uuid>,

    /// Check every rendered tree and log the problems found
    #[structopt(long)]
    audit: bool,

    /// Insert live replies to top-level comments directly
    #[structopt(long)]
    live_direct_insertion: bool,

    /// Load every remaining reply of the top-level comments
    #[structopt(long)]
    show_all: bool,

    /// JSON client configuration
    #[structopt(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = <Opt as structopt::StructOpt>::from_args();
    tracing_subscriber::fmt::init();

    let mut config = match &opt.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if opt.live_direct_insertion {
        config.live_direct_replies_insertion = true;
    }
    let fixture = Fixture::load(&opt.fixture)?;
    let server = Arc::new(
        MockServer::from_fixture(&fixture)
            .with_context(|| format!("seeding data layer from {:?}", opt.fixture))?,
    );
    tracing::info!(
        comments = fixture.comments.len(),
        ?config,
        "seeded data layer"
    );

    let context = RenderContext {
        viewer: fixture.viewer.clone(),
        story: fixture.story.clone(),
        settings: fixture.settings.clone(),
        live_direct_replies_insertion: config.live_direct_replies_insertion,
    };
    let client = Client::new(server.clone(), config);
    let composer = ThreadComposer::new(client, Arc::new(TracingSink))
        .context("wiring thread levels")?;
    let auditor = opt
        .audit
        .then(|| audit::Auditor::new(composer.max_depth()));

    let roots = match opt.comment {
        Some(id) => vec![CommentId(id)],
        None => server.top_level().into_iter().map(|c| c.id).collect(),
    };
    for id in roots {
        let top = server
            .comment(id)
            .with_context(|| format!("comment {id:?} is not in the fixture"))?;
        let mut thread = composer.thread(id, context.clone());
        thread
            .load()
            .await
            .with_context(|| format!("loading replies of {id:?}"))?;
        if opt.show_all {
            if let Some(root) = thread.root_list() {
                root.show_all()
                    .await
                    .with_context(|| format!("loading all replies of {id:?}"))?;
            }
        }

        let tree = thread.render()?;
        if let (Some(auditor), Some(tree)) = (&auditor, &tree) {
            let found = auditor.inspect(tree);
            tracing::info!(comment = ?id, replies = tree.len(), found, "audited thread");
        }
        let mut out = std::io::stdout().lock();
        writeln!(out, "* {}", top.body)?;
        if let Some(tree) = &tree {
            print::write_tree(&mut out, tree)?;
        }
        drop(out);
        thread.unmount();
    }

    Ok(())
}
