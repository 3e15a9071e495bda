//! Command line front end built from the discovered modules

use clap::{value_parser, Arg, ArgMatches, Command};

use crate::app::{serve, AppContext};
use crate::errors::Result;

/// Root command with the built-in sub-commands and every module group
pub fn build(ctx: &AppContext) -> Command {
    let root = Command::new("realms")
        .about("Simple file based wiki")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(
            Command::new("run").about("Serve the wiki").arg(
                Arg::new("port")
                    .long("port")
                    .short('p')
                    .value_parser(value_parser!(u16))
                    .help("Port to listen on, overriding the configuration"),
            ),
        )
        .subcommand(Command::new("modules").about("List discovered modules and their routes"));
    ctx.commands().attach(root)
}

/// Run whatever `matches` selected; no sub-command means `run`
pub async fn dispatch(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        None => serve(ctx, None).await,
        Some(("run", sub)) => serve(ctx, sub.get_one::<u16>("port").copied()).await,
        Some(("modules", _)) => {
            print!("{}", describe_modules(ctx));
            Ok(())
        }
        Some((group, sub)) => ctx.commands().dispatch(ctx.state(), group, sub),
    }
}

/// Human-readable summary of what discovery wired up
pub fn describe_modules(ctx: &AppContext) -> String {
    let mut out = String::new();
    for module in ctx.modules() {
        out.push_str(module);
        out.push('\n');
        for route in ctx.routes().mounted().iter().filter(|r| &r.module == module) {
            out.push_str(&format!("  route  {}\n", route.path));
        }
    }
    for group in ctx.commands().names() {
        out.push_str(&format!("command  {group}\n"));
    }
    out
}
