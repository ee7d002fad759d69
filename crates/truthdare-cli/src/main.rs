//! Truth or Dare terminal entry point.

use std::error::Error;

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;
use truthdare_cli::command::Command;
use truthdare_cli::config::AppConfig;
use truthdare_cli::error::AppError;
use truthdare_cli::shell::Shell;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Logs go to stderr so they never interleave with the game on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(data_dir = %config.data_dir.display(), "starting truth or dare");

    let engine = truthdare_cli::bootstrap(&config).await?;
    let mut shell = Shell::new(engine);
    let result = run(&mut shell).await;

    // Queued record writes must land even when the loop ended on an error.
    shell.engine().flush().await;
    result?;
    Ok(())
}

async fn run(shell: &mut Shell) -> Result<(), AppError> {
    let mut stdout = tokio::io::stdout();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    write_lines(&mut stdout, &shell.greeting()).await?;
    while let Some(line) = input.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                write_lines(&mut stdout, &[e.to_string()]).await?;
                continue;
            }
        };
        let quit = command == Command::Quit;
        let reply = shell
            .execute(command)
            .unwrap_or_else(|e| vec![format!("error: {e}")]);
        write_lines(&mut stdout, &reply).await?;
        if quit {
            break;
        }
    }
    Ok(())
}

async fn write_lines<W>(out: &mut W, lines: &[String]) -> Result<(), AppError>
where
    W: AsyncWrite + Unpin,
{
    for line in lines {
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
    }
    out.flush().await?;
    Ok(())
}
