use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::Level;
use url::Url;
use verbcall_core::{DEFAULT_ENDPOINT, VerbRef};

const ENDPOINT_VAR: &str = "FTL_ENDPOINT";

pub const USAGE: &str = "\
Usage:
  verbcall list --catalog FILE
  verbcall fake (--schema FILE | --catalog FILE VERB)
  verbcall call VERB [--catalog FILE | --schema FILE] [--body FILE|-] [--endpoint URL]

Options:
  --log-level LEVEL   trace, debug, info, warn or error [default: warn]
  --endpoint URL      verb service endpoint [env: FTL_ENDPOINT]
";

#[derive(Debug)]
pub struct AppArgs {
    pub log_level: Level,
    pub command: Command,
}

#[derive(Debug)]
pub enum Command {
    List {
        catalog: PathBuf,
    },
    Fake {
        source: SchemaSourceArg,
    },
    Call {
        verb: VerbRef,
        source: Option<SchemaSourceArg>,
        body: Option<BodyArg>,
        endpoint: Url,
    },
    Help,
}

/// Where the request schema of a verb comes from.
#[derive(Debug)]
pub enum SchemaSourceArg {
    Schema(PathBuf),
    Catalog(PathBuf, VerbRef),
}

#[derive(Debug, PartialEq, Eq)]
pub enum BodyArg {
    Stdin,
    File(PathBuf),
}

impl AppArgs {
    pub fn parse() -> Result<Self> {
        Self::parse_from(pico_args::Arguments::from_env())
    }

    fn parse_from(mut pargs: pico_args::Arguments) -> Result<Self> {
        if pargs.contains(["-h", "--help"]) {
            return Ok(Self {
                log_level: Level::WARN,
                command: Command::Help,
            });
        }

        let log_level = pargs
            .opt_value_from_str("--log-level")
            .context("parsing log level argument")?
            .unwrap_or(Level::WARN);

        let subcommand = pargs.subcommand().context("parsing subcommand")?;
        let command = match subcommand.as_deref() {
            Some("list") => {
                let catalog = pargs
                    .value_from_str("--catalog")
                    .context("parsing catalog argument")?;
                Command::List { catalog }
            }
            Some("fake") => {
                let schema = opt_path(&mut pargs, "--schema")?;
                let catalog = opt_path(&mut pargs, "--catalog")?;
                let source = match (schema, catalog) {
                    (Some(schema), None) => SchemaSourceArg::Schema(schema),
                    (None, Some(catalog)) => {
                        let verb = pargs
                            .free_from_str::<VerbRef>()
                            .context("parsing verb argument")?;
                        SchemaSourceArg::Catalog(catalog, verb)
                    }
                    _ => bail!("expected exactly one of --schema or --catalog"),
                };
                Command::Fake { source }
            }
            Some("call") => {
                let schema = opt_path(&mut pargs, "--schema")?;
                let catalog = opt_path(&mut pargs, "--catalog")?;
                let body = pargs
                    .opt_value_from_str::<_, String>("--body")
                    .context("parsing body argument")?
                    .map(|body| {
                        if body == "-" {
                            BodyArg::Stdin
                        } else {
                            BodyArg::File(PathBuf::from(body))
                        }
                    });
                let endpoint = pargs
                    .opt_value_from_str::<_, Url>("--endpoint")
                    .context("parsing endpoint argument")?;
                let endpoint = match endpoint {
                    Some(endpoint) => endpoint,
                    None => default_endpoint()?,
                };
                let verb = pargs
                    .free_from_str::<VerbRef>()
                    .context("parsing verb argument")?;

                let source = match (schema, catalog) {
                    (Some(_), Some(_)) => bail!("--schema and --catalog are mutually exclusive"),
                    (Some(schema), None) => Some(SchemaSourceArg::Schema(schema)),
                    (None, Some(catalog)) => Some(SchemaSourceArg::Catalog(catalog, verb.clone())),
                    (None, None) => None,
                };
                Command::Call {
                    verb,
                    source,
                    body,
                    endpoint,
                }
            }
            Some(other) => bail!("unknown command '{other}'\n\n{USAGE}"),
            None => Command::Help,
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            bail!("unexpected arguments: {remaining:?}");
        }

        Ok(Self { log_level, command })
    }
}

fn opt_path(pargs: &mut pico_args::Arguments, key: &'static str) -> Result<Option<PathBuf>> {
    pargs
        .opt_value_from_str(key)
        .with_context(|| format!("parsing {key} argument"))
}

fn default_endpoint() -> Result<Url> {
    let endpoint = std::env::var(ENDPOINT_VAR).unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
    Url::parse(&endpoint).with_context(|| format!("parsing endpoint '{endpoint}'"))
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    fn parse(args: &[&str]) -> Result<AppArgs> {
        let args = args.iter().map(OsString::from).collect();
        AppArgs::parse_from(pico_args::Arguments::from_vec(args))
    }

    #[test]
    fn should_parse_list() {
        let args = parse(&["list", "--catalog", "verbs.json"]).expect("valid arguments");

        assert_eq!(args.log_level, Level::WARN);
        assert!(matches!(args.command, Command::List { catalog } if catalog == PathBuf::from("verbs.json")));
    }

    #[test]
    fn should_parse_fake_from_catalog() {
        let args = parse(&["--log-level", "debug", "fake", "--catalog", "verbs.json", "echo.echo"])
            .expect("valid arguments");

        assert_eq!(args.log_level, Level::DEBUG);
        let Command::Fake {
            source: SchemaSourceArg::Catalog(catalog, verb),
        } = args.command
        else {
            panic!("expected a fake command from a catalog, got {:?}", args.command);
        };
        assert_eq!(catalog, PathBuf::from("verbs.json"));
        assert_eq!(verb, VerbRef::new("echo", "echo"));
    }

    #[test]
    fn should_reject_fake_without_schema() {
        let result = parse(&["fake"]);

        let error = result.expect_err("missing schema");
        insta::assert_snapshot!(error, @"expected exactly one of --schema or --catalog");
    }

    #[test]
    fn should_parse_call() {
        let args = parse(&[
            "call",
            "echo.echo",
            "--schema",
            "echo.json",
            "--body",
            "-",
            "--endpoint",
            "http://localhost:8892",
        ])
        .expect("valid arguments");

        let Command::Call {
            verb,
            source,
            body,
            endpoint,
        } = args.command
        else {
            panic!("expected a call command, got {:?}", args.command);
        };
        assert_eq!(verb.to_string(), "echo.echo");
        assert!(matches!(source, Some(SchemaSourceArg::Schema(path)) if path == PathBuf::from("echo.json")));
        assert_eq!(body, Some(BodyArg::Stdin));
        assert_eq!(endpoint.as_str(), "http://localhost:8892/");
    }

    #[test]
    fn should_reject_invalid_verb() {
        let result = parse(&["call", "echo", "--endpoint", "http://localhost:8892"]);

        assert!(result.is_err());
    }

    #[test]
    fn should_reject_unknown_command() {
        let result = parse(&["describe"]);

        let error = result.expect_err("unknown command");
        assert!(error.to_string().starts_with("unknown command 'describe'"));
    }

    #[test]
    fn should_show_help() {
        let args = parse(&["--help"]).expect("valid arguments");

        assert!(matches!(args.command, Command::Help));
    }
}
