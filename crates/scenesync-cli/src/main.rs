// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use clap::{Parser, Subcommand};
use scenesync_client::{
    AnnotationClient, ClientConfig, Error, HttpTransport, MediaItem, MediaKind, Progress,
    SceneFileReader, Transport, WorkspaceID, platform_version,
};
use std::{path::PathBuf, sync::Arc};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Annotation platform server URL
    #[clap(long, env = "SCENESYNC_SERVER")]
    server: Option<String>,

    /// Personal access token
    #[clap(long, env = "SCENESYNC_TOKEN")]
    token: Option<String>,

    /// Workspace ID
    #[clap(long, env = "SCENESYNC_WORKSPACE_ID")]
    workspace: Option<String>,

    /// Project ID
    #[clap(long, env = "SCENESYNC_PROJECT_ID")]
    project: Option<String>,

    /// Configuration file, defaults to config.toml in the user's config
    /// directory
    #[clap(long)]
    config: Option<PathBuf>,

    /// Client Command
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Returns the annotation platform version.
    Version,
    /// List the labels of the project.
    Labels,
    /// List the media of the project, or of a single dataset.
    Media {
        /// Dataset ID
        #[clap(long)]
        dataset: Option<String>,

        /// Media kind: image or video
        #[clap(long, default_value = "image")]
        kind: String,
    },
    /// Download the latest annotations of the project's media into the
    /// `annotations` folder of the output directory.
    Download {
        /// Output directory
        output: PathBuf,

        /// Only download annotations of this dataset
        #[clap(long)]
        dataset: Option<String>,

        /// Media kind: image or video. Videos are downloaded frame by frame.
        #[clap(long, default_value = "image")]
        kind: String,

        /// Append the media ID to every annotation file name
        #[clap(long)]
        append_uid: bool,
    },
    /// Upload annotations previously downloaded to the input directory.
    Upload {
        /// Input directory
        input: PathBuf,

        /// Only upload annotations for media of this dataset
        #[clap(long)]
        dataset: Option<String>,

        /// Media kind: image or video
        #[clap(long, default_value = "image")]
        kind: String,

        /// Append to the existing annotations instead of replacing them
        #[clap(long)]
        append: bool,

        /// Labels covering the full media item, defaults to the labels of the
        /// project's classification tasks
        #[clap(long, value_delimiter = ',')]
        global_labels: Vec<String>,
    },
}

fn progress_bar() -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template(
        "[{elapsed_precise} ETA: {eta}] {msg}: {wide_bar:.yellow} {human_pos}/{human_len}",
    ) {
        bar.set_style(style.progress_chars("█▇▆▅▄▃▂▁  "));
    }
    bar
}

/// Spawns a task driving a progress bar from progress updates.
fn progress_channel(message: &'static str) -> tokio::sync::mpsc::Sender<Progress> {
    let bar = progress_bar();
    bar.set_message(message);
    let (tx, mut rx) = tokio::sync::mpsc::channel::<Progress>(1);

    tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            if progress.total > 0 {
                bar.set_length(progress.total as u64);
                bar.set_position(progress.current as u64);
            }
        }
        bar.finish();
    });

    tx
}

/// Replaces videos by their annotatable frames.
fn expand_videos(items: Vec<MediaItem>) -> Vec<MediaItem> {
    items
        .into_iter()
        .flat_map(|item| match item {
            MediaItem::Video(video) => video.frames().into_iter().map(MediaItem::from).collect(),
            other => vec![other],
        })
        .collect()
}

async fn list_media(
    client: &AnnotationClient,
    dataset: Option<String>,
    kind: &str,
) -> Result<Vec<MediaItem>, Error> {
    let kind: MediaKind = kind.parse()?;
    match dataset {
        Some(dataset) => client.list_media(&dataset.parse()?, kind).await,
        None => client.all_media(kind).await,
    }
}

async fn handle_version(transport: &dyn Transport, config: &ClientConfig) -> Result<(), Error> {
    let version = platform_version(transport).await?;
    println!(
        "Annotation Platform [{}]: {} Client: {}",
        config.server.as_deref().unwrap_or_default(),
        version,
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

fn handle_labels(client: &AnnotationClient) -> Result<(), Error> {
    let global = client.project().global_label_names();
    for label in client.project().labels() {
        if global.iter().any(|name| name == label.name()) {
            println!("[{}] {} (global)", label.id(), label.name());
        } else {
            println!("[{}] {}", label.id(), label.name());
        }
    }
    Ok(())
}

async fn handle_media(
    client: &AnnotationClient,
    dataset: Option<String>,
    kind: String,
) -> Result<(), Error> {
    for item in list_media(client, dataset, &kind).await? {
        let dims = item.dimensions();
        match &item {
            MediaItem::Video(video) => println!(
                "{} {} {}x{} frames={} stride={}",
                video.id(),
                video.name(),
                dims.width,
                dims.height,
                video.frame_count(),
                video.frame_stride()
            ),
            _ => println!("{} {}x{}", item, dims.width, dims.height),
        }
    }
    Ok(())
}

async fn handle_download(
    client: &AnnotationClient,
    output: PathBuf,
    dataset: Option<String>,
    kind: String,
    append_uid: bool,
) -> Result<(), Error> {
    let items = expand_videos(list_media(client, dataset, &kind).await?);
    let tx = progress_channel("Downloading annotations");
    let elapsed = client
        .download_annotations(&items, &output, append_uid, Some(tx))
        .await?;
    println!("Finished in {:.1} seconds", elapsed);
    Ok(())
}

async fn handle_upload(
    client: AnnotationClient,
    input: PathBuf,
    dataset: Option<String>,
    kind: String,
    append: bool,
    global_labels: Vec<String>,
) -> Result<(), Error> {
    let global_labels = if global_labels.is_empty() {
        client.project().global_label_names()
    } else {
        global_labels
    };
    let reader = SceneFileReader::new(input).with_global_labels(global_labels);
    let mut client = client.with_reader(Box::new(reader));

    let items = expand_videos(list_media(&client, dataset, &kind).await?);
    let tx = progress_channel("Uploading annotations");
    let uploaded = client.upload_annotations(&items, append, Some(tx)).await?;
    println!("Uploaded annotations for {} media items", uploaded);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ClientConfig::load_from(Some(path))?,
        None => ClientConfig::load()?,
    };
    if args.server.is_some() {
        config.server = args.server;
    }
    if args.token.is_some() {
        config.token = args.token;
    }
    if args.workspace.is_some() {
        config.workspace_id = args.workspace;
    }
    if args.project.is_some() {
        config.project_id = args.project;
    }

    log::debug!(
        "Using server {:?}, workspace {:?}, project {:?}",
        config.server,
        config.workspace_id,
        config.project_id
    );
    let transport = Arc::new(HttpTransport::new(&config)?);

    if args.cmd == Command::Version {
        return handle_version(transport.as_ref(), &config).await;
    }

    let workspace: WorkspaceID = config
        .workspace_id
        .as_deref()
        .ok_or_else(|| Error::InvalidParameters("no workspace configured".to_string()))?
        .parse()?;
    let project = config
        .project_id
        .as_deref()
        .ok_or_else(|| Error::InvalidParameters("no project configured".to_string()))?
        .parse()?;
    let client = AnnotationClient::connect(transport, workspace, &project).await?;

    match args.cmd {
        Command::Version => Ok(()),
        Command::Labels => handle_labels(&client),
        Command::Media { dataset, kind } => handle_media(&client, dataset, kind).await,
        Command::Download {
            output,
            dataset,
            kind,
            append_uid,
        } => handle_download(&client, output, dataset, kind, append_uid).await,
        Command::Upload {
            input,
            dataset,
            kind,
            append,
            global_labels,
        } => handle_upload(client, input, dataset, kind, append, global_labels).await,
    }
}
