use clap::{Arg, ArgAction, ArgMatches, Command};

/// Parsed command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ParsedArgs {
    pub(crate) verbosity: u8,
    pub(crate) info: Vec<String>,
    pub(crate) debug: Vec<String>,
    pub(crate) command: CommandArgs,
}

/// Subcommand selected on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum CommandArgs {
    List(ListArgs),
    Cat { spec: String },
    Copy { source: String, destination: String },
}

/// Arguments of `ezs list`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ListArgs {
    pub(crate) path: String,
    pub(crate) recursive: bool,
    pub(crate) postorder: bool,
    pub(crate) excludes: Vec<String>,
    pub(crate) json: bool,
}

/// Builds the `clap` command used for parsing.
pub(crate) fn clap_command() -> Command {
    Command::new("ezs")
        .version(env!("CARGO_PKG_VERSION"))
        .about("List directories and move data between stream devices.")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase verbosity; may be repeated.")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            Arg::new("info")
                .long("info")
                .value_name("FLAGS")
                .help("Fine-grained informational verbosity (e.g. list2,stats).")
                .action(ArgAction::Append)
                .global(true),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .value_name("FLAGS")
                .help("Fine-grained debug verbosity (e.g. walk2,device).")
                .action(ArgAction::Append)
                .global(true),
        )
        .subcommand(
            Command::new("list")
                .about("List a directory tree.")
                .arg(Arg::new("path").value_name("PATH").required(true))
                .arg(
                    Arg::new("recursive")
                        .long("recursive")
                        .short('r')
                        .help("Descend into directories, listing each before its contents.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("postorder")
                        .long("postorder")
                        .help("Descend into directories, listing each after its contents.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("exclude")
                        .long("exclude")
                        .value_name("NAME")
                        .help("Skip entries named NAME and everything below them.")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print one JSON object per entry.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("cat")
                .about("Write everything a device produces to standard output.")
                .arg(Arg::new("spec").value_name("SPEC").required(true)),
        )
        .subcommand(
            Command::new("copy")
                .about("Pipe one device into another.")
                .arg(Arg::new("source").value_name("SRC").required(true))
                .arg(Arg::new("destination").value_name("DST").required(true)),
        )
}

fn strings(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn string(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}

/// Parses `arguments`, including the program name.
pub(crate) fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<std::ffi::OsString> + Clone,
{
    let matches = clap_command().try_get_matches_from(arguments)?;

    let command = match matches.subcommand() {
        Some(("list", sub)) => CommandArgs::List(ListArgs {
            path: string(sub, "path"),
            recursive: sub.get_flag("recursive"),
            postorder: sub.get_flag("postorder"),
            excludes: strings(sub, "exclude"),
            json: sub.get_flag("json"),
        }),
        Some(("cat", sub)) => CommandArgs::Cat {
            spec: string(sub, "spec"),
        },
        Some(("copy", sub)) => CommandArgs::Copy {
            source: string(sub, "source"),
            destination: string(sub, "destination"),
        },
        _ => {
            return Err(clap_command().error(
                clap::error::ErrorKind::MissingSubcommand,
                "a command is required",
            ));
        }
    };

    Ok(ParsedArgs {
        verbosity: matches.get_count("verbose"),
        info: strings(&matches, "info"),
        debug: strings(&matches, "debug"),
        command,
    })
}
