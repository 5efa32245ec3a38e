use filterprims_filters::FilterKind;

use crate::cmd::FiltersArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_filters, FilterEntry, OutputFormat};

pub fn run(_args: FiltersArgs, format: OutputFormat) -> CliResult<i32> {
    let filters: Vec<FilterEntry> = FilterKind::ALL
        .into_iter()
        .map(|kind| FilterEntry {
            name: kind.name(),
            description: kind.description(),
        })
        .collect();

    print_filters(&filters, format);
    Ok(SUCCESS)
}
