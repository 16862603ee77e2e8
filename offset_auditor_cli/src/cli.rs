use clap::{Args, Parser, Subcommand};
use offset_auditor::models::KindSelector;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "offset-auditor",
    version,
    about = "Audit and reset consumer group offsets of a Kafka cluster"
)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// Bootstrap brokers, e.g. `-b k1:9092,k2:9092`
    #[arg(short, long, global = true, value_delimiter = ',')]
    pub brokers: Vec<String>,

    /// ZooKeeper servers holding legacy group offsets, e.g. `-z zk1:2181/kafka`
    #[arg(short, long, global = true)]
    pub zk_servers: Option<String>,

    /// Configuration file, `appsettings.*` in the working directory by default
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List consumer groups and how they are coordinated
    ListGroup(ListGroupArgs),
    /// List topics with their partition count
    ListTopic(ListTopicArgs),
    /// Audit consumed offsets and lag of every group
    ListOffset(ListOffsetArgs),
    /// Commit a new offset for one partition, or replay an exported snapshot
    ResetOffset(ResetOffsetArgs),
}

#[derive(Debug, Args)]
pub struct ListGroupArgs {
    #[arg(short, long, default_value = "*")]
    pub group_filter: String,

    /// zk, kf or *
    #[arg(short = 't', long = "type", default_value = "*")]
    pub kind: KindSelector,
}

#[derive(Debug, Args)]
pub struct ListTopicArgs {
    #[arg(short, long, default_value = "*")]
    pub filter: String,
}

#[derive(Debug, Args)]
pub struct ListOffsetArgs {
    #[arg(short, long, default_value = "*")]
    pub group_filter: String,

    #[arg(short, long, default_value = "*")]
    pub topic_filter: String,

    #[arg(short = 'm', long, default_value = "*")]
    pub consumer_filter: String,

    /// zk, kf or *
    #[arg(short = 'k', long = "type", default_value = "*")]
    pub kind: KindSelector,

    /// Write the audit as JSON instead of printing it
    #[arg(short, long)]
    pub export_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ResetOffsetArgs {
    #[arg(short, long, required_unless_present = "import_file")]
    pub group: Option<String>,

    #[arg(short, long, required_unless_present = "import_file")]
    pub topic: Option<String>,

    #[arg(short, long, required_unless_present = "import_file")]
    pub partition: Option<i32>,

    #[arg(short, long, required_unless_present = "import_file")]
    pub offset: Option<i64>,

    /// Snapshot previously written by `list-offset --export-file`
    #[arg(
        short,
        long,
        conflicts_with_all = ["group", "topic", "partition", "offset"]
    )]
    pub import_file: Option<PathBuf>,
}
