use filterprims_filters::{Alphabet, FilterKind};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("filterprims {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: filterprims");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!("filters: {}", FilterKind::ALL.len());
    let alphabets = Alphabet::ALL
        .iter()
        .map(|alphabet| alphabet.name())
        .collect::<Vec<_>>()
        .join(", ");
    println!("alphabets: {alphabets}");

    Ok(SUCCESS)
}
