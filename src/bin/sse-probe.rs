use std::time::Instant;

use clap::Parser;
use futures_util::StreamExt;

#[derive(Parser)]
#[command(name = "sse-probe")]
#[command(about = "Connect to an SSE endpoint and print what arrives", long_about = None)]
struct Cli {
    /// Stream URL
    #[arg(default_value = "http://localhost:8080/events")]
    url: String,

    /// Also print keep-alive comments and retry directives
    #[arg(short, long)]
    verbose: bool,
}

/// One event being assembled from field lines.
#[derive(Default)]
struct Event {
    id: Option<String>,
    kind: Option<String>,
    data: Vec<String>,
}

impl Event {
    fn is_empty(&self) -> bool {
        self.id.is_none() && self.kind.is_none() && self.data.is_empty()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    println!("Connecting to {}", cli.url);
    let started = Instant::now();
    let res = client
        .get(&cli.url)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await?;

    println!("Status: {}", res.status());
    for (name, value) in res.headers() {
        println!("  {}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    if !res.status().is_success() {
        eprintln!("Error: stream refused with status {}", res.status());
        return Ok(());
    }

    let mut body = res.bytes_stream();
    let mut pending: Vec<u8> = Vec::new();
    let mut event = Event::default();
    let mut count = 0usize;

    loop {
        let chunk = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Interrupted, closing connection");
                break;
            }
            chunk = body.next() => chunk,
        };

        let Some(chunk) = chunk else {
            println!("Stream closed by server after {:.2?}", started.elapsed());
            break;
        };
        pending.extend_from_slice(&chunk?);

        while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !event.is_empty() {
                    count += 1;
                    print_event(count, &event, started);
                    event = Event::default();
                }
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "" if cli.verbose => println!("[{:.2?}] comment: {}", started.elapsed(), value),
                "retry" if cli.verbose => println!("[{:.2?}] retry: {}ms", started.elapsed(), value),
                "id" => event.id = Some(value.to_string()),
                "event" => event.kind = Some(value.to_string()),
                "data" => event.data.push(value.to_string()),
                _ => {}
            }
        }
    }

    println!("Received {} events", count);
    Ok(())
}

fn print_event(n: usize, event: &Event, started: Instant) {
    println!(
        "[{:.2?}] #{} id={} event={} data={}",
        started.elapsed(),
        n,
        event.id.as_deref().unwrap_or("-"),
        event.kind.as_deref().unwrap_or("message"),
        event.data.join("\n")
    );
}
