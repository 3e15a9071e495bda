use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::app::CommandSet;
use crate::config::SearchType;
use crate::errors::Result;
use crate::types::AppState;

use super::{run_query, warm_index};

/// The module's command group; named `cli` so it is mounted as `search`
pub fn cli() -> CommandSet {
    CommandSet::new("cli")
        .about("Search Module")
        .subcommand(
            Command::new("rebuild-index").about("Rebuild search index"),
            rebuild,
        )
        .subcommand(
            Command::new("query")
                .about("Search the wiki and print matching pages")
                .arg(Arg::new("terms").required(true).num_args(1..).action(ArgAction::Append)),
            query,
        )
}

fn rebuild(state: &AppState, _: &ArgMatches) -> Result<()> {
    if state.config.search_type == SearchType::Simple {
        println!("Search type is simple, try using index.");
        return Ok(());
    }

    let count = super::rebuild_index(state)?;
    println!(
        "Indexed {count} pages into {}.",
        state.config.search_index_file().display()
    );
    Ok(())
}

fn query(state: &AppState, matches: &ArgMatches) -> Result<()> {
    let terms: Vec<String> = matches
        .get_many::<String>("terms")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    if state.config.search_type == SearchType::Index && !state.search_index.is_built() {
        warm_index(state)?;
    }

    let results = run_query(state, &terms.join(" "))?;
    if results.is_empty() {
        println!("No results.");
    }
    for result in results {
        println!("{:>6.1}  {}  ({})", result.relevance, result.title, result.path);
    }
    Ok(())
}
