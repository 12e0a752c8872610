use clap::Parser;

/// This program consolidates the statement of votes of an election into one data set.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON configuration that names all the input files.
    /// For more information about the file format, read the manual of the precinct_results crate.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (directory path, optional) If specified, the outputs are written in this directory.
    /// Setting this option overrides the directory that may be specified in the configuration.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, optional) A reference precinct_results.json file. If provided, sovload will
    /// check that the consolidated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
