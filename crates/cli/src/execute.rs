use std::collections::HashSet;
use std::io::Write;

use devices::{DeviceArg, Registry, reader, writer};
use stream::{Reader, ReaderExt};
use walk::{ListEntry, ListOptions, Recurse, list_local};

use crate::command::{CommandArgs, ListArgs};
use crate::error::CliError;

/// Runs `command` to completion on a current-thread runtime.
///
/// Every producer task spawned by the pipeline runs on the calling thread, so
/// diagnostics land in this thread's event buffer.
pub(crate) fn execute<Out: Write>(command: CommandArgs, stdout: &mut Out) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match command {
            CommandArgs::List(args) => list_command(args, stdout).await,
            CommandArgs::Cat { spec } => cat_command(spec, stdout).await,
            CommandArgs::Copy {
                source,
                destination,
            } => copy_command(source, destination).await,
        }
    })
}

fn list_options(args: &ListArgs) -> ListOptions {
    let recurse = if args.postorder {
        Recurse::Postorder
    } else {
        Recurse::from(args.recursive)
    };
    let options = ListOptions::new().recurse(recurse);
    if args.excludes.is_empty() {
        return options;
    }
    let excluded: HashSet<String> = args.excludes.iter().cloned().collect();
    options.accept(move |entry| !excluded.contains(entry.name()))
}

pub(crate) fn format_entry(entry: &ListEntry) -> String {
    let stat = entry.stat();
    format!(
        "{:>3} {:<7} {:>12} {}",
        entry.depth(),
        stat.kind().as_str(),
        stat.len(),
        entry.path()
    )
}

async fn list_command<Out: Write>(args: ListArgs, stdout: &mut Out) -> Result<(), CliError> {
    let options = list_options(&args);
    let mut entries = list_local(args.path, options);
    let mut count = 0usize;

    while let Some(entry) = entries.read().await? {
        if args.json {
            let line = serde_json::to_string(&entry).map_err(std::io::Error::from)?;
            writeln!(stdout, "{line}")?;
        } else {
            writeln!(stdout, "{}", format_entry(&entry))?;
        }
        count += 1;
    }
    stdout.flush()?;

    logging::trace_stats!(entries = count, "list finished");
    Ok(())
}

async fn cat_command<Out: Write>(spec: String, stdout: &mut Out) -> Result<(), CliError> {
    let registry = Registry::<Vec<u8>>::with_defaults();
    let mut source = reader(DeviceArg::from(spec), &registry)?;
    let mut bytes = 0usize;

    while let Some(chunk) = source.read().await? {
        bytes += chunk.len();
        stdout.write_all(&chunk)?;
    }
    stdout.flush()?;

    logging::trace_stats!(bytes, "cat finished");
    Ok(())
}

async fn copy_command(source: String, destination: String) -> Result<(), CliError> {
    let registry = Registry::<Vec<u8>>::with_defaults();
    let input = reader(DeviceArg::from(source), &registry)?;
    let output = writer(DeviceArg::from(destination), &registry)?;
    input.pipe(output).await?;

    logging::trace_stats!("copy finished");
    Ok(())
}
