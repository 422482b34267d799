mod output;

use clap::{Arg, ArgAction, ArgMatches, Command};
use glint_core::{Capabilities, lower_json};
use output::StatusPrinter;
use std::fs;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Command::new("glint")
        .version("0.1.0")
        .about("Lower serialized shader trees into structured SSA")
        .subcommand_required(true)
        .arg_required_else_help(true);

    let cli = setup_cli(cli);
    let matches = cli.get_matches();
    dispatch_commands(&matches)
}

/// Sets up the CLI with its subcommands and arguments.
fn setup_cli(cli: Command) -> Command {
    cli.subcommand(
        Command::new("lower")
            .about("Lower a JSON-encoded source shader")
            .arg(
                Arg::new("file")
                    .help("The source shader to lower")
                    .required(true)
                    .index(1),
            )
            .arg(
                Arg::new("no-integers")
                    .help("Target a backend without native integer support")
                    .long("no-integers")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("json")
                    .help("Print the lowered shader as JSON")
                    .long("json")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("stats")
                    .help("Print per-function instruction counts")
                    .long("stats")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("max-instructions")
                    .help("Fail once the lowered shader exceeds N instructions")
                    .long("max-instructions")
                    .value_parser(clap::value_parser!(u32))
                    .value_name("N"),
            )
            .arg(
                Arg::new("output")
                    .help("Write the lowered shader to FILE instead of stdout")
                    .short('o')
                    .long("output")
                    .value_parser(clap::value_parser!(String))
                    .value_name("FILE"),
            ),
    )
}

/// Dispatches the parsed subcommand to its handler.
fn dispatch_commands(matches: &ArgMatches) -> ExitCode {
    let mut status = StatusPrinter::new(std::io::stderr());
    let result = match matches.subcommand() {
        Some(("lower", sub_m)) => lower_command(sub_m, &mut status),
        _ => Err("no valid subcommand was used, use --help for more information".to_string()),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            let _ = status.error(&message);
            ExitCode::FAILURE
        }
    }
}

fn lower_command(sub_m: &ArgMatches, status: &mut StatusPrinter<std::io::Stderr>) -> Result<(), String> {
    let Some(file) = sub_m.get_one::<String>("file") else {
        return Err("missing input file".to_string());
    };
    let caps = Capabilities {
        native_integers: !sub_m.get_flag("no-integers"),
        max_instructions: sub_m.get_one::<u32>("max-instructions").copied(),
    };
    if !caps.native_integers {
        let _ = status.warning("integers and booleans will be carried as floats");
    }

    let text = fs::read_to_string(file).map_err(|e| format!("cannot read {}: {}", file, e))?;
    let shader = lower_json(&text, &caps).map_err(|e| e.to_string())?;

    let rendered = if sub_m.get_flag("json") {
        shader.to_json().map_err(|e| format!("cannot encode shader: {}", e))?
    } else {
        shader.to_string()
    };

    match sub_m.get_one::<String>("output") {
        Some(path) => {
            fs::write(path, &rendered).map_err(|e| format!("cannot write {}: {}", path, e))?;
            let _ = status.info(&format!("wrote {}", path));
        }
        None => print!("{}", rendered),
    }

    if sub_m.get_flag("stats") {
        println!("{}", output::stats_table(&shader));
    }

    let _ = status.success(&format!(
        "lowered {} ({} functions)",
        shader.info.name,
        shader.functions.len()
    ));
    Ok(())
}
