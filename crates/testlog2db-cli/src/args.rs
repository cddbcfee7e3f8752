use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "testlog2db",
    version,
    about = "Imports pytest JUnit XML report file(s) into a TestResultWebApp-style database"
)]
pub struct Cli {
    /// Path to the JUnit XML report file, or a directory of report files,
    /// to be imported
    pub results: PathBuf,

    /// Path to the SQLite database that receives the results
    pub database: PathBuf,

    /// Search the results directory recursively for *.xml files
    #[arg(long)]
    pub recursive: bool,

    /// Verify all inputs (including the database) and show what would be
    /// done, without writing anything
    #[arg(long)]
    pub dryrun: bool,

    /// Append new result(s) to the existing execution result named by
    /// --uuid instead of creating a new one
    #[arg(long)]
    pub append: bool,

    /// UUID identifying the execution result; generated when not provided
    #[arg(long, value_name = "UUID")]
    pub uuid: Option<String>,

    /// Configuration JSON file (component mapping and metadata)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project/variant name (overrides the configuration file)
    #[arg(long, value_name = "NAME")]
    pub variant: Option<String>,

    /// Combined version override: software[;hardware[;test]]
    #[arg(long, value_name = "SW[;HW[;TEST]]")]
    pub versions: Option<String>,

    /// Tester account name (overrides the configuration file)
    #[arg(long, value_name = "NAME")]
    pub tester: Option<String>,
}
