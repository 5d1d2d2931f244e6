//! logview - print and follow windows of large log files
//!
//! Indexing and reads run on tokio's blocking pool; the runtime only drives the
//! poll timer and Ctrl-C handling.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use logview::{FileLoader, ViewerConfig};
use std::io::Write;
use std::path::PathBuf;
use tokio::time::MissedTickBehavior;

/// Outcome of one follow-mode poll
#[derive(Debug, PartialEq)]
enum Update {
    Unchanged,
    /// Lines added after the ones already shown
    Appended(Vec<String>),
    /// The last line shown was partial; the first line is its completed form
    Extended(Vec<String>),
    /// The file shrank or was rewritten; everything is shown again from the top
    Rewritten(Vec<String>),
}

/// What follow mode has printed so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FollowPosition {
    /// Lines printed
    lines: u64,
    /// File size the printed lines were read from
    size: u64,
    /// The last printed line had no newline yet
    partial: bool,
}

impl FollowPosition {
    fn at_end_of(loader: &FileLoader) -> Self {
        Self {
            lines: loader.line_count(),
            size: loader.file_size(),
            partial: !loader.last_line_complete(),
        }
    }

    /// Reload `loader` and collect whatever was not printed yet
    ///
    /// The position only advances when every expected line was read, so a
    /// failed read is retried on the next poll.
    fn poll(&mut self, loader: &mut FileLoader) -> logview::Result<Update> {
        loader.reload()?;

        let total = loader.line_count();
        let size = loader.file_size();
        if total == self.lines && size == self.size {
            return Ok(Update::Unchanged);
        }

        let rewritten = size <= self.size
            || total < self.lines
            || (total == self.lines && !self.partial);
        let start = if rewritten {
            0
        } else if self.partial {
            self.lines - 1
        } else {
            self.lines
        };

        let lines = loader.read_lines(start, (total - start) as usize);
        if lines.len() as u64 != total - start {
            log::warn!(
                "Read {} of {} new lines from {}; retrying on next poll",
                lines.len(),
                total - start,
                loader.path().display()
            );
            return Ok(Update::Unchanged);
        }

        let update = if rewritten {
            Update::Rewritten(lines)
        } else if self.partial {
            Update::Extended(lines)
        } else {
            Update::Appended(lines)
        };
        *self = Self::at_end_of(loader);
        Ok(update)
    }
}

fn print_lines(lines: &[String]) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}

fn print_info(loader: &FileLoader) {
    println!("File:          {}", loader.path().display());
    println!("Lines:         {}", loader.line_count());
    println!("Size:          {} bytes", loader.file_size());
    println!("Last modified: {}", loader.last_modified());
    println!("Read strategy: {}", loader.strategy());
}

async fn follow(mut loader: FileLoader, config: &ViewerConfig) -> Result<()> {
    let mut ticker = tokio::time::interval(config.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut position = FollowPosition::at_end_of(&loader);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {
                let (returned, polled) = tokio::task::spawn_blocking(move || {
                    let polled = position.poll(&mut loader).map(|u| (u, position));
                    (loader, polled)
                })
                .await
                .context("follow worker panicked")?;
                loader = returned;

                match polled {
                    Ok((Update::Unchanged, _)) => {}
                    Ok((Update::Appended(lines), advanced))
                    | Ok((Update::Extended(lines), advanced)) => {
                        position = advanced;
                        print_lines(&lines)?;
                    }
                    Ok((Update::Rewritten(lines), advanced)) => {
                        position = advanced;
                        eprintln!("logview: {} was truncated or replaced", loader.path().display());
                        print_lines(&lines)?;
                    }
                    Err(e) => {
                        log::warn!("Reload of {} failed: {}", loader.path().display(), e);
                    }
                }
            }
        }
    }

    Ok(())
}

fn build_command() -> Command {
    let command = Command::new("logview")
        .version(logview::VERSION)
        .about("Print and follow windows of large log files")
        .long_about(
            "logview indexes line boundaries once and then reads any window of lines \
             directly, so files of any size open quickly. With --follow it polls the \
             file and prints new lines as they are appended.",
        )
        .arg(
            Arg::new("file")
                .help("Path to the log file to view")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("start")
                .help("First line to print (0-based)")
                .long("start")
                .short('s')
                .value_parser(value_parser!(u64))
                .default_value("0"),
        )
        .arg(
            Arg::new("count")
                .help("Number of lines to print")
                .long("count")
                .short('n')
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("follow")
                .help("Keep polling the file and print appended lines")
                .long("follow")
                .short('f')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("interval")
                .help("Poll interval in milliseconds for --follow")
                .long("interval")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("mmap-threshold")
                .help("File size in bytes at which indexing memory-maps the file")
                .long("mmap-threshold")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("info")
                .help("Print file information before the lines")
                .long("info")
                .action(ArgAction::SetTrue),
        );

    #[cfg(feature = "config")]
    let command = command.arg(
        Arg::new("config")
            .help("Configuration file (defaults to <config dir>/logview/config.toml)")
            .long("config")
            .value_parser(value_parser!(PathBuf)),
    );

    command
}

fn load_config(matches: &ArgMatches) -> Result<ViewerConfig> {
    #[cfg(feature = "config")]
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::load_or_default()?,
    };
    #[cfg(not(feature = "config"))]
    let mut config = ViewerConfig::default();

    if let Some(&interval) = matches.get_one::<u64>("interval") {
        config.poll_interval_ms = interval;
    }
    if let Some(&threshold) = matches.get_one::<u64>("mmap-threshold") {
        config.loader.mmap_threshold = threshold;
    }
    if let Some(&count) = matches.get_one::<usize>("count") {
        config.page_lines = count;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; RUST_LOG controls verbosity
    env_logger::init();

    let matches = build_command().get_matches();
    let config = load_config(&matches)?;

    let file_path = matches
        .get_one::<PathBuf>("file")
        .cloned()
        .context("file argument is required")?;
    let start = matches.get_one::<u64>("start").copied().unwrap_or(0);

    let loader_config = config.loader.clone();
    let open_path = file_path.clone();
    let loader = tokio::task::spawn_blocking(move || {
        FileLoader::open_with_config(&open_path, loader_config)
    })
    .await
    .context("loader worker panicked")?
    .with_context(|| format!("Cannot open {}", file_path.display()))?;

    if matches.get_flag("info") {
        print_info(&loader);
    }

    let page_lines = config.page_lines;
    let (loader, lines) = tokio::task::spawn_blocking(move || {
        let lines = loader.read_lines(start, page_lines);
        (loader, lines)
    })
    .await
    .context("read worker panicked")?;
    print_lines(&lines)?;

    if matches.get_flag("follow") {
        follow(loader, &config).await?;
    }

    Ok(())
}
