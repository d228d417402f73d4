use clap::Parser;
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineArgs {
    #[arg(
        value_name = "CHANNEL",
        help = "YouTube channel or community post link/id"
    )]
    pub links: Vec<String>,

    #[arg(
        long,
        value_name = "COOKIES FILE",
        help = "Path to a Netscape format cookies file where cookies will be read from"
    )]
    pub cookies: Option<PathBuf>,

    #[arg(
        short,
        long,
        help = "Save directory (defaults to current)"
    )]
    pub directory: Option<PathBuf>,

    #[arg(
        long = "post-archive",
        value_name = "FILE",
        help = "Download only posts not listed in the archive file and record the IDs of newly downloaded posts"
    )]
    pub post_archive: Option<PathBuf>,

    #[arg(long, help = "Write information about the post publish date")]
    pub dates: bool,

    #[arg(short, long, help = "Download posts from oldest to newest")]
    pub reverse: bool,

    #[arg(
        long = "skip-download",
        help = "Skip downloading posts, intended for writing the archive file"
    )]
    pub skip_download: bool,

    #[arg(
        long,
        value_name = "FILE",
        help = "JSON file with HTTP settings (user_agent, http_timeout_secs, accept_language, client_version)"
    )]
    pub settings: Option<PathBuf>,
}

impl CommandLineArgs {
    pub fn parse_args() -> Self {
        let args = CommandLineArgs::parse();

        info!("Parsed {} link(s)", args.links.len());
        if let Some(archive) = &args.post_archive {
            info!("Using post archive {}", archive.display());
        }

        args
    }
}
