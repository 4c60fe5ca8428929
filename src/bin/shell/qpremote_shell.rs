//! qpremote Shell - Interactive command line interface for qpremoted
//!
//! Every line typed at the prompt is sent to the command server as one request
//! batch (e.g. `FILE:/data/sweep.dat;AXES:0,2,4;SHOW:`) and the reply is
//! printed with its round-trip time.

use async_std::io;
use async_std::net::TcpStream;
use async_std::prelude::*;
use std::io::Write as _;
use std::net::Shutdown;
use std::time::{Duration, Instant};

use clap::Parser;

/// Default address of the command server
const HOST_DEFAULT: &str = "127.0.0.1";
const PORT_DEFAULT: u16 = 1787;
/// Default timeout for requests in milliseconds
const TIMEOUT: u64 = 5000;
/// Literal every non-empty reply starts with
const REPLY_TAG: &str = "qtplot:";

/// qpremote Shell - interactive client for qpremoted
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address
    #[arg(long, default_value = HOST_DEFAULT)]
    host: String,

    /// Server port
    #[arg(long, default_value_t = PORT_DEFAULT)]
    port: u16,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = TIMEOUT)]
    timeout: u64,
}

struct QpShell {
    host: String,
    port: u16,
    timeout: Duration,
}

impl QpShell {
    fn new(host: String, port: u16, timeout_ms: u64) -> Self {
        QpShell {
            host,
            port,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Send one request over a fresh connection and return the raw reply
    async fn request(&self, batch: &str) -> io::Result<Vec<u8>> {
        io::timeout(self.timeout, async {
            let mut stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
            stream.write_all(batch.as_bytes()).await?;
            stream.flush().await?;
            stream.shutdown(Shutdown::Write)?;

            let mut reply = Vec::new();
            stream.read_to_end(&mut reply).await?;
            Ok(reply)
        })
        .await
    }

    /// Check the server is reachable; an empty request gets no reply
    async fn connect(&self) -> bool {
        match self.request("").await {
            Ok(_) => true,
            Err(e) => {
                eprintln!("🔴 Connection failed: {}", e);
                eprintln!(
                    "💡 Make sure qpremoted is running and listening on {}",
                    self.endpoint()
                );
                false
            }
        }
    }

    /// Format and display the reply, one fragment per line
    fn format_response(&self, reply: &[u8], start_time: Option<Instant>) {
        if let Some(start_time) = start_time {
            let elapsed = start_time.elapsed();
            println!("⏱️  Response time: {:.3}s", elapsed.as_secs_f64());
        }

        let text = String::from_utf8_lossy(reply);
        if text.is_empty() {
            println!("(no reply)");
            return;
        }

        let body = text.strip_prefix(REPLY_TAG).unwrap_or(&text);
        for fragment in body.split(';').filter(|f| !f.is_empty()) {
            if fragment.ends_with(":Done!") {
                println!("{}", fragment);
            } else {
                eprintln!("{}", fragment);
            }
        }
    }

    /// Show help information
    fn show_help(&self) {
        let help_text = r#"
qpremote Shell Help
===================
Shell Commands:
  help            - Show this help message
  clear           - Clear the screen
  exit/quit/q     - Exit the shell

Server Commands (join several with ';'):
  FILE:<path>     - Load a data file
  AXES:<x>,<y>,<z> - Select the plotted axes
  SHOW:           - Raise the viewer window
  REFR:<path>     - Reload the file if it is open
  UPDA:<path>     - Redraw the export view if the file is open
"#;
        println!("{}", help_text);
    }

    /// Handle internal shell commands
    ///
    /// Returns `Some(true)` to exit, `Some(false)` when handled locally and
    /// `None` when the line should go to the server.
    fn handle_internal_command(&self, cmd: &str) -> Option<bool> {
        match cmd.trim().to_lowercase().as_str() {
            "exit" | "quit" | "q" => Some(true),
            "help" | "h" | "?" => {
                self.show_help();
                Some(false)
            }
            "clear" => {
                // Clear screen using ANSI escape codes
                print!("\x1B[2J\x1B[1;1H");
                Some(false)
            }
            _ => None,
        }
    }

    /// Run the main interactive command loop
    async fn run(&self) -> io::Result<()> {
        println!("Use 'help' for shell commands.");
        println!("Enter a command batch or 'exit' to quit.");
        println!("{}", "─".repeat(80));

        let hostname = get_hostname();
        loop {
            print!("[{}]> ", hostname);
            std::io::stdout().flush()?;

            let mut input = String::new();
            match io::stdin().read_line(&mut input).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    eprintln!("\n🔴 Error reading input: {}", e);
                    continue;
                }
            }

            let cmd = input.trim();
            if cmd.is_empty() {
                continue;
            }

            match self.handle_internal_command(cmd) {
                Some(true) => break,
                Some(false) => continue,
                None => {}
            }

            let start_time = Some(Instant::now());
            match self.request(cmd).await {
                Ok(reply) => self.format_response(&reply, start_time),
                Err(e) => {
                    eprintln!("🔴 Request failed: {}", e);
                    eprintln!("💡 The server may be down or the request timed out");
                }
            }

            println!("{}", "-".repeat(80));
        }

        Ok(())
    }
}

/// Get the hostname of the current machine
fn get_hostname() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().to_string(),
        Err(_) => "localhost".to_string(),
    }
}

#[async_std::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let shell = QpShell::new(args.host, args.port, args.timeout);

    if !shell.connect().await {
        eprintln!("🔴 Failed to reach qpremoted. The daemon may not be running.");
        std::process::exit(1);
    }

    shell.run().await?;

    Ok(())
}
