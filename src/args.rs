use clap::{Parser, Subcommand};

/// A token-gated ballot box for ranked multi-seat elections.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON configuration file. The flags below override its values.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory) Where the candidate, ballot and token files are kept. Default: data
    #[clap(long, value_parser)]
    pub data_dir: Option<String>,

    /// The number of seats to fill. Default: 14
    #[clap(long, value_parser)]
    pub seats: Option<u32>,

    /// The exact number of choices on every ballot. Default: 14
    #[clap(long, value_parser)]
    pub ranks: Option<usize>,

    /// The secret expected from administrators. Without one, every privileged command is refused.
    #[clap(long, value_parser)]
    pub admin_secret: Option<String>,

    /// (file path or empty) If specified, the JSON output is written to this file instead of the
    /// standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Creates a new election in the data directory.
    Init {
        /// (list of comma-separated values) The candidates, in their canonical order.
        #[clap(long, value_parser, value_delimiter = ',')]
        candidates: Vec<String>,
        /// (file path) A JSON array of candidate names, used instead of --candidates.
        #[clap(long, value_parser)]
        candidates_file: Option<String>,
    },
    /// Lists the candidates.
    Candidates,
    /// Casts a ballot with a voting token.
    Vote {
        #[clap(long, value_parser)]
        token: String,
        /// (list of comma-separated values) The choices, most preferred first.
        #[clap(long, value_parser, value_delimiter = ',')]
        ballot: Vec<String>,
    },
    /// Shows the ballots (raw) or the tabulation (counted). Privileged.
    Results {
        /// raw or counted
        #[clap(long, value_parser, default_value = "counted")]
        mode: String,
        /// The administrator secret.
        #[clap(long, value_parser)]
        admin_key: Option<String>,
        /// Prints the raw ballots as numbered lines instead of JSON.
        #[clap(long, takes_value = false)]
        text: bool,
        /// (file path) A reference file containing the counted results in JSON format. If provided,
        /// the tabulated output must match the reference.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
    /// Creates new voting tokens. Privileged.
    GenerateTokens {
        #[clap(long, value_parser)]
        count: i64,
        #[clap(long, value_parser)]
        admin_key: Option<String>,
    },
    /// Counts the issued and used tokens. Privileged.
    Tokens {
        #[clap(long, value_parser)]
        admin_key: Option<String>,
    },
}
