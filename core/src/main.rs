// Coding conventions
#![forbid(unsafe_code)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![deny(unused_imports)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

use std::env;
use std::path::Path;
use std::path::PathBuf;
use std::thread;

use anyhow::anyhow;
use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use ergo_box_feed::codec::LedgerCodec;
use ergo_box_feed::feed_config::FeedConfig;
use ergo_box_feed::feed_config::DEFAULT_FEED_CONFIG_FILE_NAME;
use ergo_box_feed::feed_config::FEED_CONFIG_FILE_PATH;
use ergo_box_feed::feed_config::FEED_CONFIG_OPT;
use ergo_box_feed::feed_source::accept;
use ergo_box_feed::feed_source::read_batch;
use ergo_box_feed::feed_source::FeedFormat;
use ergo_box_feed::ledger::DataInputBox;
use ergo_box_feed::ledger::ErgoBox;
use ergo_box_feed::ledger::TransactionAggregate;
use ergo_box_feed::logging;
use ergo_box_feed::merge_queue;
use ergo_box_feed::merge_view::OrderedMergeView;
use ergo_box_feed::merge_view::ViewState;
use log::error;
use log::info;
use log::LevelFilter;

#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,
    /// Increase the logging verbosity
    #[clap(short, long)]
    verbose: bool,
    /// Set path of the configuration file to use. Default is ./box_feed_config.yaml
    #[clap(long)]
    feed_config_file: Option<String>,
    /// Set folder path for the log files. Default is the current folder.
    #[clap(short, long)]
    data_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Entity {
    #[value(name = "box")]
    LedgerBox,
    DataInput,
    Transaction,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate box_feed_config.yaml with default settings.
    GenerateConfig,
    /// Decode a feed batch file and print every record that decoded, re-encoded.
    Decode {
        /// JSON array of records, or an explorer page object with an `items` array
        file: PathBuf,
        #[clap(long, value_enum, default_value_t = Entity::LedgerBox)]
        entity: Entity,
        /// Decode incrementally from the file instead of parsing it whole first
        #[clap(long)]
        stream: bool,
    },
    /// Merge transaction feed files into the ordered view and print one page of it.
    View {
        /// Transaction batch files, each read on its own thread
        #[clap(required = true)]
        files: Vec<PathBuf>,
        /// Zero-based page index
        #[clap(long, default_value_t = 0)]
        page: usize,
        #[clap(long)]
        stream: bool,
    },
}

fn main() {
    let args = Args::parse();

    let config_path = PathBuf::from(
        args.feed_config_file
            .clone()
            .unwrap_or_else(|| DEFAULT_FEED_CONFIG_FILE_NAME.to_string()),
    );
    if FEED_CONFIG_FILE_PATH.set(config_path.clone()).is_err() {
        eprintln!("config file path was already set");
        std::process::exit(exitcode::SOFTWARE);
    }

    if let Command::GenerateConfig = args.command {
        generate_config(&config_path);
        return;
    }

    let config = match FEED_CONFIG_OPT.clone() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", config_path.display(), e);
            std::process::exit(exitcode::CONFIG);
        }
    };

    let cmdline_log_level = if args.verbose {
        Some(LevelFilter::Debug)
    } else {
        None
    };
    let data_dir_path = match &args.data_dir {
        Some(data_dir) => Path::new(data_dir).to_path_buf(),
        None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    if let Err(e) = logging::setup_log(cmdline_log_level, config.log_level, &data_dir_path) {
        eprintln!("Failed to set up logging: {:?}", e);
        std::process::exit(exitcode::SOFTWARE);
    }

    match args.command {
        Command::GenerateConfig => {}
        Command::Decode {
            file,
            entity,
            stream,
        } => {
            if !file.exists() {
                error!("{} not found", file.display());
                std::process::exit(exitcode::NOINPUT);
            }
            if let Err(e) = decode(&file, entity, format_of(stream)) {
                error!("Fatal decode error: {:?}", e);
                std::process::exit(exitcode::SOFTWARE);
            }
        }
        Command::View {
            files,
            page,
            stream,
        } => {
            if let Some(missing) = files.iter().find(|f| !f.exists()) {
                error!("{} not found", missing.display());
                std::process::exit(exitcode::NOINPUT);
            }
            if let Err(e) = view(files, page, format_of(stream), &config) {
                error!("Fatal view error: {:?}", e);
                std::process::exit(exitcode::SOFTWARE);
            }
        }
    }
}

fn generate_config(config_path: &Path) {
    if config_path.exists() {
        println!(
            "{} file already exists. Please, remove it and run again",
            config_path.display()
        );
        return;
    }
    if let Err(e) = FeedConfig::write_default_config_file(config_path) {
        eprintln!("Failed to write {}: {}", config_path.display(), e);
        std::process::exit(exitcode::CANTCREAT);
    }
    println!("Default {} file is generated.", config_path.display());
}

fn format_of(stream: bool) -> FeedFormat {
    if stream {
        FeedFormat::Stream
    } else {
        FeedFormat::Document
    }
}

fn decode(file: &Path, entity: Entity, format: FeedFormat) -> anyhow::Result<()> {
    let origin = file.display().to_string();
    let lines = match entity {
        Entity::LedgerBox => encode_all(accept(read_batch::<ErgoBox>(file, format)?, &origin))?,
        Entity::DataInput => {
            encode_all(accept(read_batch::<DataInputBox>(file, format)?, &origin))?
        }
        Entity::Transaction => encode_all(accept(
            read_batch::<TransactionAggregate>(file, format)?,
            &origin,
        ))?,
    };
    info!("{}: {} records decoded", origin, lines.len());
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

fn encode_all<T: LedgerCodec>(records: Vec<T>) -> anyhow::Result<Vec<String>> {
    records
        .iter()
        .map(|r| r.encode_stream().context("encoding record"))
        .collect()
}

fn view(
    files: Vec<PathBuf>,
    page_index: usize,
    format: FeedFormat,
    config: &FeedConfig,
) -> anyhow::Result<()> {
    let (sender, queue) = merge_queue::channel::<TransactionAggregate>(config.queue_capacity);
    let readers: Vec<_> = files
        .into_iter()
        .map(|file| {
            let sender = sender.clone();
            thread::spawn(move || -> anyhow::Result<()> {
                let origin = file.display().to_string();
                let batch = accept(read_batch(&file, format)?, &origin);
                sender.submit(batch)?;
                Ok(())
            })
        })
        .collect();
    drop(sender);

    let mut view = OrderedMergeView::new(&config.empty_placeholder);
    queue.run(&mut view, |v| log::debug!("view reordered, {} records", v.len()));

    for reader in readers {
        reader
            .join()
            .map_err(|_| anyhow!("feed reader thread panicked"))??;
    }

    match view.state() {
        ViewState::Empty { placeholder } => println!("{}", placeholder),
        ViewState::Populated => {
            let page = view.paginate(page_index, config.page_size);
            for tx in page.rows {
                println!("{}", tx.encode_stream()?);
            }
            if page.controls_visible {
                println!(
                    "page {}/{} previous: {} next: {}",
                    page_index + 1,
                    view.page_count(config.page_size),
                    page.has_previous,
                    page.has_next
                );
            }
        }
    }
    Ok(())
}
