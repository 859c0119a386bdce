use anyhow::Context;
use bpaf::Bpaf;
use findlibs::{LibraryRequest, Resolver};
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options)]
struct Options {
    #[bpaf(short, long)]
    /// Verbose output
    verbose: bool,

    #[bpaf(external(command))]
    command: Command,
}

#[derive(Debug, Clone, Bpaf)]
enum Command {
    #[bpaf(command)]
    /// Print the resolved path of a library
    Find {
        #[bpaf(long, argument("PACKAGE"))]
        /// Package name when it differs from "<library>lib"
        package: Option<String>,

        #[bpaf(positional("LIBRARY"))]
        /// Library name without the "lib" prefix
        library: String,
    },

    #[bpaf(command)]
    /// Resolve a library and load it into the global namespace
    Load {
        #[bpaf(long, argument("PACKAGE"))]
        /// Package name when it differs from "<library>lib"
        package: Option<String>,

        #[bpaf(positional("LIBRARY"))]
        /// Library name without the "lib" prefix
        library: String,
    },
}

/// Initialize the tracing subscriber with appropriate configuration
fn init_logging(verbose: bool) {
    let filter_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Set up environment filter - allow overriding via RUST_LOG env var
    let env_filter = EnvFilter::builder()
        .with_default_directive(filter_level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_level(verbose)
        .with_target(verbose)
        .with_line_number(verbose)
        .without_time()
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    debug!("Logging initialized with level: {}", filter_level);
}

fn main() -> anyhow::Result<()> {
    let options = options().run();

    init_logging(options.verbose);

    let resolver = Resolver::new();

    match options.command {
        Command::Find { package, library } => {
            let request = LibraryRequest::new(&library, package.as_deref());
            match resolver.find(&request)? {
                Some(path) => println!("{path}"),
                None => {
                    eprintln!("{} not found", request.library);
                    std::process::exit(1);
                }
            }
        }
        Command::Load { package, library } => {
            let request = LibraryRequest::new(&library, package.as_deref());
            let handle = resolver
                .load(&request)
                .with_context(|| format!("loading {}", request.library))?;
            info!("loaded {}", request.library);
            // Keep the object resident until exit.
            std::mem::forget(handle);
        }
    }

    Ok(())
}
