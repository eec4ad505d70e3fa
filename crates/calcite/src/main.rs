//! Calcite - A tabbed front end for a URL-rewriting web proxy
//!
//! Usage: calcite [OPTIONS]

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use calcite_proxy::{Codec, CodecGateway, ProxyGateway};
use calcite_shell::{Shell, ShellConfig, ShellError, ShellResult, UrlResolver};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What the invocation asks for
#[derive(Debug, PartialEq)]
enum Mode {
    Interactive,
    Resolve(String),
    Help,
    Version,
}

/// Parsed command line
#[derive(Debug, PartialEq)]
struct Options {
    mode: Mode,
    config_path: Option<PathBuf>,
    proxy: Option<String>,
    prefix: Option<String>,
    codec: Option<Codec>,
    search: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("calcite");

    let options = match parse_args(args.iter().skip(1).map(String::as_str)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage(program);
            return ExitCode::FAILURE;
        }
    };

    let result = match &options.mode {
        Mode::Help => {
            print_usage(program);
            return ExitCode::SUCCESS;
        }
        Mode::Version => {
            println!("Calcite {}", VERSION);
            return ExitCode::SUCCESS;
        }
        Mode::Resolve(text) => build_config(&options).and_then(|config| resolve(&config, text)),
        Mode::Interactive => match build_config(&options) {
            Ok(config) => run_shell(&config).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_usage(program: &str) {
    println!(
        r#"Calcite {} - A tabbed front end for a URL-rewriting web proxy

USAGE:
    {} [OPTIONS]

OPTIONS:
    -h, --help            Print this help message
    -V, --version         Print version information
    --config <PATH>       Load settings from a JSON file
    --proxy <ORIGIN>      Proxy server origin (default http://127.0.0.1:8080)
    --prefix <PREFIX>     Proxy path prefix (default /service/)
    --codec <CODEC>       URL codec: none, plain, xor, base64 (default xor)
    --search <TEMPLATE>   Search URL with %s for the query
    --resolve <TEXT>      Print the URL and proxy address for TEXT and exit

EXAMPLES:
    {}
    {} --proxy http://localhost:8080 --codec base64
    {} --resolve "rust tabs"
"#,
        VERSION, program, program, program, program
    );
}

fn parse_args<'a>(mut args: impl Iterator<Item = &'a str>) -> Result<Options, String> {
    let mut options = Options {
        mode: Mode::Interactive,
        config_path: None,
        proxy: None,
        prefix: None,
        codec: None,
        search: None,
    };

    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .map(str::to_string)
                .ok_or_else(|| format!("{} needs a value", flag))
        };

        match arg {
            "--help" | "-h" => options.mode = Mode::Help,
            "--version" | "-V" => options.mode = Mode::Version,
            "--config" => options.config_path = Some(PathBuf::from(value(arg)?)),
            "--proxy" => options.proxy = Some(value(arg)?),
            "--prefix" => options.prefix = Some(value(arg)?),
            "--codec" => {
                let codec = value(arg)?.parse::<Codec>().map_err(|e| e.to_string())?;
                options.codec = Some(codec);
            }
            "--search" => options.search = Some(value(arg)?),
            "--resolve" => options.mode = Mode::Resolve(value(arg)?),
            other => return Err(format!("Unknown option: {}", other)),
        }
    }

    Ok(options)
}

/// Config file (or defaults) with command-line overrides applied
fn build_config(options: &Options) -> ShellResult<ShellConfig> {
    let mut config = match &options.config_path {
        Some(path) => ShellConfig::load(path)?,
        None => ShellConfig::default(),
    };

    if let Some(proxy) = &options.proxy {
        config.proxy_origin = proxy.clone();
    }
    if let Some(prefix) = &options.prefix {
        config.proxy.prefix = prefix.clone();
    }
    if let Some(codec) = options.codec {
        config.proxy.codec = codec;
    }
    if let Some(search) = &options.search {
        config.search_template = search.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Print what a search box entry would load, without opening anything
fn resolve(config: &ShellConfig, text: &str) -> ShellResult<()> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ShellError::Config("nothing to resolve".into()));
    }

    let resolver = UrlResolver::new(config.search_template.clone())?;
    let gateway = CodecGateway::from_config(&config.proxy)?;

    let original = resolver.resolve(text);
    let address = gateway.compose(&original);
    let absolute = config.proxy_origin_url()?.join(&address)?;

    println!("URL:     {}", original);
    println!("Address: {}", absolute);

    if let Some(decoded) = gateway.decompose(&address) {
        let decoded = decoded?;
        if decoded != original {
            log::warn!("Codec {} does not round-trip: {}", gateway.codec(), decoded);
        }
    }

    Ok(())
}

/// Run the interactive shell until quit or a stealth launch
async fn run_shell(config: &ShellConfig) -> ShellResult<()> {
    log::info!("Using proxy {} ({} codec)", config.proxy_origin, config.proxy.codec);

    let mut shell = Shell::from_config(config)?;
    shell.run().await
}
