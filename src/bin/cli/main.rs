use async_std::net::TcpStream;
use async_std::prelude::*;
use clap::Parser;
use std::net::Shutdown;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default address of the qpremoted command server
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 1787;
/// Literal every non-empty reply starts with
const REPLY_TAG: &str = "qtplot:";

/// Send remote-control commands to a running qtplot viewer.
///
/// Commands are sent as one batch in the order FILE, REFR, AXES, UPDA, SHOW.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Server address
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Load a data file
    #[arg(short, long, conflicts_with = "raw")]
    file: Option<PathBuf>,

    /// Reload the file if it is the one currently open
    #[arg(short, long, conflicts_with = "raw")]
    refresh: Option<PathBuf>,

    /// Select axes as X,Y,Z parameter indices
    #[arg(short, long, value_name = "X,Y,Z", conflicts_with = "raw")]
    axes: Option<String>,

    /// Redraw the export view if the file is currently open
    #[arg(short, long, conflicts_with = "raw")]
    update: Option<PathBuf>,

    /// Raise the viewer window
    #[arg(short, long, conflicts_with = "raw")]
    show: bool,

    /// Send a raw command batch, e.g. "AXES:0,2,4;SHOW:"
    #[arg(long)]
    raw: Option<String>,

    /// Seconds to wait for the reply
    #[arg(long, default_value_t = 5)]
    timeout: u64,
}

/// Entry point
#[async_std::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let batch = build_batch(&cli);
    if batch.is_empty() {
        eprintln!("Nothing to send. Use --help for usage information.");
        std::process::exit(2);
    }

    match send_batch(&cli, &batch).await {
        Ok(reply) => {
            if !reply.is_empty() {
                println!("{}", reply);
            }
            if reply_has_error(&reply) {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Build the request batch from the selected options
fn build_batch(cli: &Cli) -> String {
    if let Some(raw) = &cli.raw {
        return raw.clone();
    }

    let mut commands = Vec::new();
    if let Some(file) = &cli.file {
        commands.push(format!("FILE:{}", absolute(file).display()));
    }
    if let Some(file) = &cli.refresh {
        commands.push(format!("REFR:{}", absolute(file).display()));
    }
    if let Some(axes) = &cli.axes {
        commands.push(format!("AXES:{}", axes));
    }
    if let Some(file) = &cli.update {
        commands.push(format!("UPDA:{}", absolute(file).display()));
    }
    if cli.show {
        commands.push("SHOW:".to_string());
    }
    commands.join(";")
}

/// The server resolves paths against its own working directory, so send
/// absolute ones. A path that does not exist is sent as given.
fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Send one request and wait for the server to close the connection
async fn send_batch(cli: &Cli, batch: &str) -> Result<String, Box<dyn std::error::Error>> {
    let mut stream = TcpStream::connect((cli.host.as_str(), cli.port)).await?;
    stream.write_all(batch.as_bytes()).await?;
    stream.flush().await?;
    // Half-close so the server sees the whole request even on a slow link
    stream.shutdown(Shutdown::Write)?;

    let mut reply = String::new();
    async_std::io::timeout(
        Duration::from_secs(cli.timeout),
        stream.read_to_string(&mut reply),
    )
    .await?;
    Ok(reply)
}

/// Whether any fragment of the reply reports a failure
fn reply_has_error(reply: &str) -> bool {
    let body = reply.strip_prefix(REPLY_TAG).unwrap_or(reply);
    body.split(';')
        .filter(|fragment| !fragment.is_empty())
        .any(|fragment| !fragment.ends_with(":Done!"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("qpremote").chain(args.iter().copied()))
    }

    #[test]
    fn test_batch_order() {
        let cli = parse(&["--show", "--axes", "0,2,4", "--file", "/nonexistent/a.dat"]);
        assert_eq!(
            build_batch(&cli),
            "FILE:/nonexistent/a.dat;AXES:0,2,4;SHOW:"
        );
    }

    #[test]
    fn test_raw_batch_verbatim() {
        let cli = parse(&["--raw", "FOO:bar;SHOW:"]);
        assert_eq!(build_batch(&cli), "FOO:bar;SHOW:");
    }

    #[test]
    fn test_raw_conflicts_with_commands() {
        let result = Cli::try_parse_from(["qpremote", "--raw", "SHOW:", "--show"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_batch() {
        assert_eq!(build_batch(&parse(&[])), "");
    }

    #[test]
    fn test_reply_has_error() {
        assert!(!reply_has_error("qtplot:AXES:Done!;SHOW:Done!;"));
        assert!(reply_has_error("qtplot:FILE:Error file path;SHOW:Done!;"));
        assert!(reply_has_error("qtplot:Unknown key:FOO;"));
        assert!(!reply_has_error(""));
    }
}
