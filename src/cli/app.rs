//! Main CLI application

use crate::completion::{install_completion, render as render_completion, Shell};
use crate::dispatch::{Dispatcher, HookRegistry};
use crate::error::{Result, SchemaError};
use crate::model::{HookConvention, ResolvedCommand, UNKNOWN_COMMAND_HOOK_CAMEL, UNKNOWN_COMMAND_HOOK_SNAKE};
use crate::pipeline::{self, BuildOptions, Prepared};
use crate::render::Target;
use crate::schema::{load_schema, SCHEMA_FILE_NAMES};
use crate::ui::{Reporter, Verbosity};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Generate CLI front-ends for several runtimes, plus shell completions, from one YAML schema
#[derive(Debug, Parser)]
#[command(name = "polycli", version, about)]
pub struct Cli {
    /// Path to the schema file (default: search for polycli.yaml upwards)
    #[arg(short = 'f', long = "file", value_name = "FILE", global = true)]
    pub file: Option<PathBuf>,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print nothing but requested output
    #[arg(short, long, global = true)]
    pub silent: bool,

    /// Print verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate every selected target and the completion scripts
    Build(BuildArgs),
    /// Validate the schema and report every defect
    Validate,
    /// Print the hook contract: command paths and their hook names
    Hooks {
        /// Show a single naming convention
        #[arg(long, value_enum)]
        convention: Option<Convention>,
    },
    /// Print or install the completion script of the generated CLI
    Completion {
        /// bash, zsh or fish (default: from $SHELL)
        #[arg(long)]
        shell: Option<String>,
        /// Install into the user's shell completion directory
        #[arg(long)]
        install: bool,
    },
    /// Run the generated CLI's dispatch in-process on the given arguments
    Try(TryArgs),
    /// Write a starter schema
    Init {
        /// Name of the CLI to describe
        name: Option<String>,
        /// Overwrite an existing schema file
        #[arg(long)]
        force: bool,
    },
    /// Print the completion script of polycli itself
    SelfCompletions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Output directory; each target gets a subdirectory
    #[arg(short, long, value_name = "DIR", default_value = "generated")]
    pub output_dir: PathBuf,

    /// Target to generate (repeatable; default: the schema's targets, else all)
    #[arg(short, long = "target", value_name = "TARGET")]
    pub targets: Vec<Target>,

    /// Overwrite existing hook files
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct TryArgs {
    /// Hook naming convention to dispatch with
    #[arg(long, value_enum, default_value = "snake")]
    pub convention: Convention,

    /// Register no hooks, to exercise the fallbacks
    #[arg(long)]
    pub no_hooks: bool,

    /// Arguments passed to the generated CLI
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Convention {
    Camel,
    Snake,
}

impl From<Convention> for HookConvention {
    fn from(convention: Convention) -> Self {
        match convention {
            Convention::Camel => HookConvention::PrefixedCamel,
            Convention::Snake => HookConvention::PrefixedSnake,
        }
    }
}

/// CLI application
pub struct App {
    cli: Cli,
    reporter: Reporter,
}

impl App {
    pub fn new(cli: Cli) -> Self {
        let verbosity = Verbosity::from_flags(cli.silent, cli.quiet, cli.verbose);
        App {
            cli,
            reporter: Reporter::new(verbosity),
        }
    }

    /// Run the selected command; returns the process exit status
    pub fn run(self) -> Result<i32> {
        match &self.cli.command {
            Commands::Build(args) => self.build(args),
            Commands::Validate => self.validate(),
            Commands::Hooks { convention } => self.hooks(*convention),
            Commands::Completion { shell, install } => self.completion(shell.as_deref(), *install),
            Commands::Try(args) => self.try_dispatch(args),
            Commands::Init { name, force } => self.init(name.as_deref(), *force),
            Commands::SelfCompletions { shell } => {
                clap_complete::generate(*shell, &mut Cli::command(), "polycli", &mut io::stdout());
                Ok(0)
            }
        }
    }

    fn prepare(&self) -> Result<Prepared> {
        let (document, path) = load_schema(self.cli.file.as_deref())?;
        self.reporter
            .print_debug(&format!("Using schema {}", path.display()));
        pipeline::prepare(document)
    }

    fn build(&self, args: &BuildArgs) -> Result<i32> {
        let prepared = self.prepare()?;
        let options = BuildOptions {
            out_dir: args.output_dir.clone(),
            targets: args.targets.clone(),
            force: args.force,
        };
        for target in prepared.select_targets(&options.targets) {
            self.reporter.print_debug(&format!("Emitting {}", target));
        }

        let report = pipeline::build(&prepared, &options)?;
        for path in &report.written {
            self.reporter.print_debug(&format!("wrote {}", path.display()));
        }
        for path in &report.kept {
            self.reporter.print_info(&format!(
                "Kept existing {} (use --force to overwrite)",
                path.display()
            ));
        }
        self.reporter.print_success(&format!(
            "Generated {} file(s) for '{}' in {}",
            report.written.len(),
            prepared.tree.name,
            options.out_dir.display()
        ));
        Ok(0)
    }

    fn validate(&self) -> Result<i32> {
        let prepared = self.prepare()?;
        let tree = &prepared.tree;
        if self.reporter.is_verbose() {
            print_tree(&tree.root, 0);
        }
        self.reporter.print_success(&format!(
            "Schema for '{}' is valid: {} command(s), {} hook(s)",
            tree.name,
            tree.commands().len(),
            prepared.contract.entries().len() + 1
        ));
        Ok(0)
    }

    fn hooks(&self, convention: Option<Convention>) -> Result<i32> {
        let prepared = self.prepare()?;
        let mut rows: Vec<(String, String, String)> = prepared
            .contract
            .entries()
            .iter()
            .map(|e| (e.path.join(" "), e.names.camel.clone(), e.names.snake.clone()))
            .collect();
        rows.push((
            "<unknown command>".to_string(),
            UNKNOWN_COMMAND_HOOK_CAMEL.to_string(),
            UNKNOWN_COMMAND_HOOK_SNAKE.to_string(),
        ));

        let width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0);
        let camel_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(0);
        for (path, camel, snake) in rows {
            match convention {
                Some(Convention::Camel) => println!("{:width$}  {}", path, camel, width = width),
                Some(Convention::Snake) => println!("{:width$}  {}", path, snake, width = width),
                None => println!(
                    "{:width$}  {:camel_width$}  {}",
                    path,
                    camel,
                    snake,
                    width = width,
                    camel_width = camel_width
                ),
            }
        }
        Ok(0)
    }

    fn completion(&self, shell: Option<&str>, install: bool) -> Result<i32> {
        let shell = shell.map(str::parse::<Shell>).transpose()?;
        let prepared = self.prepare()?;

        if install {
            match install_completion(shell, &prepared.tree) {
                Ok(outcome) => {
                    self.reporter.print_success(&format!(
                        "Installed {} completion to {}",
                        outcome.shell,
                        outcome.path.display()
                    ));
                    self.reporter.print_info(&outcome.hint);
                    Ok(0)
                }
                Err(e) => {
                    self.reporter.print_error(&e.to_string());
                    Ok(1)
                }
            }
        } else {
            let shell = match shell {
                Some(shell) => shell,
                None => Shell::detect()?,
            };
            print!("{}", render_completion(&prepared.tree, shell));
            Ok(0)
        }
    }

    fn try_dispatch(&self, args: &TryArgs) -> Result<i32> {
        let prepared = self.prepare()?;
        let convention = HookConvention::from(args.convention);
        let registry = if args.no_hooks {
            HookRegistry::new()
        } else {
            HookRegistry::accepting(prepared.contract.names(convention))
        };

        let outcome = Dispatcher::new(&prepared.tree, &registry)
            .with_convention(convention)
            .run(args.args.iter().cloned());

        if let (Some(hook), Some(context)) = (&outcome.hook, &outcome.context) {
            if registry.contains(hook) {
                self.reporter.print_info(&format!("Dispatched to hook '{}'", hook));
                println!("{}", context.to_json());
            }
        }
        print!("{}", outcome.stdout);
        eprint!("{}", outcome.stderr);
        Ok(outcome.exit_code)
    }

    fn init(&self, name: Option<&str>, force: bool) -> Result<i32> {
        let path = self
            .cli
            .file
            .clone()
            .unwrap_or_else(|| PathBuf::from(SCHEMA_FILE_NAMES[0]));
        if path.exists() {
            if !force {
                return Err(SchemaError::AlreadyExists(path).into());
            }
            self.reporter
                .print_warning(&format!("Overwriting existing {}", path.display()));
        }

        let name = name.map(str::to_string).unwrap_or_else(|| default_name(&path));
        fs::write(&path, starter_schema(&name))?;
        self.reporter
            .print_success(&format!("Wrote starter schema to {}", path.display()));
        Ok(0)
    }
}

/// Name of the current directory, or `mycli`
fn default_name(schema_path: &Path) -> String {
    let dir = schema_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok());
    dir.and_then(|d| d.file_name().map(|n| n.to_string_lossy().to_string()))
        .filter(|n| n.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "mycli".to_string())
}

/// A small but complete schema to start from
pub fn starter_schema(name: &str) -> String {
    format!(
        r#"cli:
  name: {name}
  tagline: "{name} command-line interface"
  version: 0.1.0
  options:
    - name: config
      short: c
      desc: Path to a config file
  commands:
    hello:
      desc: Print a greeting
      args:
        - name: NAME
          desc: Who to greet
          required: false
      options:
        - name: shout
          type: flag
          desc: Print in upper case
        - name: times
          short: t
          type: count
          desc: Repeat the greeting
    db:
      desc: Database operations
      subcommands:
        status:
          desc: Show connection status
          options:
            - name: format
              default: text
              desc: Output format
"#,
        name = name
    )
}

fn print_tree(command: &ResolvedCommand, depth: usize) {
    let indent = "  ".repeat(depth);
    let label = if command.is_root() {
        command.name.clone()
    } else {
        command.path.join(" ")
    };
    let args: Vec<String> = command
        .arguments
        .iter()
        .map(|a| {
            if a.required {
                format!("<{}>", a.name)
            } else {
                format!("[{}]", a.name)
            }
        })
        .collect();
    let options: Vec<String> = command
        .effective_options
        .iter()
        .map(|o| format!("--{}", o.name))
        .collect();
    println!("{}{} {}  {}", indent, label, args.join(" "), options.join(" "));
    for sub in &command.subcommands {
        print_tree(sub, depth + 1);
    }
}

/// Run the CLI application with the process arguments
pub fn run() -> Result<i32> {
    App::new(Cli::parse()).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{parse_schema, validate};

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_targets() {
        let cli = Cli::try_parse_from(["polycli", "build", "-t", "py", "--target", "rust"]).unwrap();
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.targets, vec![Target::Python, Target::Rust]);
                assert_eq!(args.output_dir, PathBuf::from("generated"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_try_args() {
        let cli = Cli::try_parse_from(["polycli", "-v", "try", "--", "simple", "--verbose"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Try(args) => {
                assert_eq!(args.args, vec!["simple", "--verbose"]);
                assert_eq!(args.convention, Convention::Snake);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_starter_schema_is_valid() {
        let document = parse_schema(&starter_schema("demo")).unwrap();
        assert!(validate(document).is_ok());
    }

    #[test]
    fn test_default_name_from_directory() {
        assert_eq!(default_name(Path::new("/work/my-tool/polycli.yaml")), "my-tool");
        assert_eq!(default_name(Path::new("/work/my tool/polycli.yaml")), "mycli");
    }
}
