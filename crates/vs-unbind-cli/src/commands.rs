use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "vs-unbind")]
#[command(
    about = "Strips source control bindings from Visual Studio solutions and projects",
    long_about = None
)]
pub struct Cli {
    /// Folder to unbind (defaults to the folder containing this executable)
    pub folder: Option<String>,

    /// Exit without waiting for ENTER
    #[arg(long)]
    pub no_pause: bool,

    /// Never relaunch elevated when a directory cannot be deleted
    #[arg(long)]
    pub no_elevate: bool,
}
