use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use repopulse_core::{OutputFormat, PulseConfig};
use repopulse_groups::partition::{GroupRange, Partition};
use repopulse_groups::summary::QualitySummary;

const CONFIG_FILE: &str = ".repopulse.toml";

#[derive(Parser)]
#[command(
    name = "repopulse",
    version,
    about = "Group repositories by contributor activity and compare their code quality",
    long_about = "Repopulse collects contributor counts, commit history and SonarQube\n\
                   quality scores for a list of repositories, then splits the repositories\n\
                   into three balanced activity groups by contributor count.\n\n\
                   Examples:\n  \
                     repopulse contributors              Count contributors for repos_url.csv\n  \
                     repopulse groups                    Partition into activity groups 1-3\n  \
                     repopulse commits collect           Gather first-line commit messages\n  \
                     repopulse commits classify          Tally feat/fix/refactor/ci/chore\n  \
                     repopulse sonar my-key --output o.csv  Export issues and score a project\n  \
                     repopulse summary --format markdown Quality statistics per group"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .repopulse.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable tables and summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Count contributors for every repository in the URL list
    #[command(long_about = "Count contributors for every repository in the URL list.\n\n\
        Reads the `repo_url` column, asks the GitHub API for each repository's\n\
        contributor count (anonymous contributors included) and writes\n\
        `repo,contributors`. A repository whose count cannot be fetched is\n\
        recorded as 0.\n\n\
        Examples:\n  repopulse contributors\n  repopulse contributors --repos list.csv --output data/c.csv")]
    Contributors {
        /// Repository URL list (default: paths.repos_csv)
        #[arg(long)]
        repos: Option<PathBuf>,

        /// Output CSV (default: paths.contributors_csv)
        #[arg(long)]
        output: Option<PathBuf>,

        /// GitHub token (overrides config and GITHUB_TOKEN)
        #[arg(long)]
        token: Option<String>,
    },
    /// Partition repositories into three activity groups
    #[command(long_about = "Partition repositories into three activity groups.\n\n\
        Repositories sharing a contributor count always share a group, a repository\n\
        never lands below one with fewer contributors, and the three groups are as\n\
        close to equal size as that allows.\n\n\
        Examples:\n  repopulse groups\n  repopulse groups --input c.csv --output g.csv --format json")]
    Groups {
        /// Contributor counts CSV (default: paths.contributors_csv)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output CSV (default: paths.groups_csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Collect and classify commit messages
    Commits {
        #[command(subcommand)]
        action: CommitsCommand,
    },
    /// Score a SonarQube project and export its issues
    #[command(long_about = "Score a SonarQube project and export its issues.\n\n\
        Fetches reliability, maintainability and security ratings plus duplication\n\
        and cognitive complexity, computes a weighted 0-100 score, and writes every\n\
        issue to CSV. With --repo-url the score is also recorded in the quality\n\
        summary consumed by `repopulse summary`.\n\n\
        Examples:\n  repopulse sonar api --output sonar/output/api.csv\n  \
        repopulse sonar api --output api.csv --repo-url https://github.com/acme/api")]
    Sonar {
        /// SonarQube project key
        project_key: String,

        /// Issue report CSV
        #[arg(long)]
        output: PathBuf,

        /// Repository URL to record the score under
        #[arg(long)]
        repo_url: Option<String>,

        /// Quality summary CSV (default: paths.quality_summary_csv)
        #[arg(long)]
        summary: Option<PathBuf>,

        /// SonarQube token (overrides config and SONAR_TOKEN)
        #[arg(long)]
        token: Option<String>,
    },
    /// Quality score statistics per activity group
    Summary {
        /// Group assignments CSV (default: paths.groups_csv)
        #[arg(long)]
        groups: Option<PathBuf>,

        /// Quality scores CSV (default: paths.quality_summary_csv)
        #[arg(long)]
        scores: Option<PathBuf>,
    },
    /// Create a default .repopulse.toml configuration file
    #[command(long_about = "Create a default .repopulse.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .repopulse.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum CommitsCommand {
    /// Fetch first-line commit messages for every repository
    Collect {
        /// Repository URL list (default: paths.repos_csv)
        #[arg(long)]
        repos: Option<PathBuf>,

        /// Output JSON (default: paths.raw_commits_json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// GitHub token (overrides config and GITHUB_TOKEN)
        #[arg(long)]
        token: Option<String>,
    },
    /// Tally commit categories per repository
    Classify {
        /// Collected commits JSON (default: paths.raw_commits_json)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Category counts CSV (default: paths.commit_types_csv)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Unmatched messages JSON (default: paths.unclassified_json)
        #[arg(long)]
        unclassified: Option<PathBuf>,
    },
    /// Fix and refactor ratios against contributor counts
    Ratios {
        /// Category counts CSV (default: paths.commit_types_csv)
        #[arg(long)]
        counts: Option<PathBuf>,

        /// Contributor counts CSV (default: paths.contributors_csv)
        #[arg(long)]
        contributors: Option<PathBuf>,
    },
}

const DEFAULT_CONFIG: &str = r#"# Repopulse Configuration

[paths]
# repos_csv = "repos_url.csv"
# contributors_csv = "data/contributors.csv"
# groups_csv = "data/repos_groups.csv"
# raw_commits_json = "data/raw_commits_data.json"
# commit_types_csv = "data/commits_types.csv"
# unclassified_json = "data/commits_unclassified.json"
# quality_summary_csv = "sonar/output/summary.csv"

[github]
# api_base = "https://api.github.com"
# token is read from GITHUB_TOKEN or GH_TOKEN when unset
# rate_limit_wait_secs = 300
# max_rate_limit_retries = 10
# request_delay_ms = 500
# timeout_secs = 30
# commits_per_page = 100

[sonar]
# url = "http://sonarqube-server:9000"
# token is read from SONAR_TOKEN when unset
# page_size = 500
"#;

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!("repopulse v{version}: repository activity groups and code quality\n");

    println!("Pipeline:");
    println!("  contributors      Count contributors per repository");
    println!("  groups            Partition repositories into activity groups 1-3");
    println!("  commits collect   Gather first-line commit messages");
    println!("  commits classify  Tally commit categories");
    println!("  commits ratios    Fix and refactor ratios against contributors");
    println!("  sonar             Score a SonarQube project and export issues");
    println!("  summary           Quality statistics per activity group");
    println!("  init              Create default configuration\n");

    println!("Run 'repopulse <command> --help' for details.");
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<PulseConfig> {
    let config = match path {
        Some(path) => PulseConfig::from_file(path)
            .wrap_err_with(|| format!("loading {}", path.display()))?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                PulseConfig::from_file(default_path)?
            } else {
                PulseConfig::default()
            }
        }
    };
    Ok(config)
}

/// Progress bar on an interactive stderr, hidden otherwise.
fn progress_bar(len: usize) -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .expect("static progress template")
            .progress_chars("=> "),
    );
    pb
}

fn print_groups(format: OutputFormat, partition: &Partition, output: &Path) -> Result<()> {
    let sizes = partition.sizes();
    let ranges = partition.ranges();

    match format {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "output": output,
                "total": sizes.total(),
                "sizes": sizes,
                "ranges": ranges,
            });
            println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("## Activity groups\n");
            println!("| Group | Repositories | Contributors |");
            println!("|-------|--------------|--------------|");
            for range in &ranges {
                println!(
                    "| {} | {} | {} |",
                    range.group,
                    range.repos,
                    contributor_span(range)
                );
            }
            println!("\n**Total:** {} repositories", sizes.total());
        }
        OutputFormat::Text => {
            if partition.is_empty() {
                println!("No repositories to group; wrote header only to {}", output.display());
                return Ok(());
            }
            println!(
                "Grouped {} repositories into {}",
                sizes.total(),
                output.display()
            );
            for range in &ranges {
                println!(
                    "  group {}: {:>4} repos  ({} contributors)",
                    range.group,
                    range.repos,
                    contributor_span(range)
                );
            }
        }
    }
    Ok(())
}

fn contributor_span(range: &GroupRange) -> String {
    if range.min_contributors == range.max_contributors {
        range.min_contributors.to_string()
    } else {
        format!("{}-{}", range.min_contributors, range.max_contributors)
    }
}

fn print_summary(format: OutputFormat, summary: &QualitySummary) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("## Quality by activity group\n");
            println!("| Group | Repos | Median | Mean | Std dev | Min | Max |");
            println!("|-------|-------|--------|------|---------|-----|-----|");
            for group in &summary.groups {
                match &group.stats {
                    Some(s) => println!(
                        "| {} | {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |",
                        group.group, s.count, s.median, s.mean, s.std_dev, s.min, s.max
                    ),
                    None => println!("| {} | 0 | - | - | - | - | - |", group.group),
                }
            }
            if let Some(s) = &summary.overall {
                println!(
                    "| all | {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |",
                    s.count, s.median, s.mean, s.std_dev, s.min, s.max
                );
            }
            if !summary.unscored.is_empty() {
                println!("\n**Unscored:** {}", summary.unscored.join(", "));
            }
        }
        OutputFormat::Text => {
            for group in &summary.groups {
                match &group.stats {
                    Some(s) => {
                        println!(
                            "Group {}: {} repos, median {:.2}, mean {:.2}, std {:.2}, range {:.2}-{:.2}",
                            group.group, s.count, s.median, s.mean, s.std_dev, s.min, s.max
                        );
                        for repo in &group.repos {
                            println!("  {:>7.2}  {}", repo.score, repo.repo);
                        }
                    }
                    None => println!("Group {}: no scored repositories", group.group),
                }
            }
            if let Some(s) = &summary.overall {
                println!(
                    "\nOverall: {} repos, mean {:.2}, median {:.2}, std {:.2}, min {:.2}, max {:.2}",
                    s.count, s.mean, s.median, s.std_dev, s.min, s.max
                );
            }
            if !summary.unscored.is_empty() {
                println!("Unscored: {}", summary.unscored.join(", "));
            }
        }
    }
    Ok(())
}

fn format_ratio(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "-".to_string(), |r| format!("{r:.3}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    debug!(format = %cli.format, "configuration loaded");

    match cli.command {
        None => {
            print_welcome();
            return Ok(());
        }
        Some(Command::Contributors {
            repos,
            output,
            token,
        }) => {
            let repos_path = repos.unwrap_or_else(|| config.paths.repos_csv.clone());
            let output = output.unwrap_or_else(|| config.paths.contributors_csv.clone());

            let repos = repopulse_github::repos::read_repo_list(&repos_path)?;
            let client =
                repopulse_github::GitHubClient::new(&config.github)?.with_token(token);
            if !client.is_authenticated() {
                warn!("no GitHub token configured; unauthenticated requests are heavily rate limited");
            }
            info!(repos = repos.len(), "counting contributors");

            let pb = progress_bar(repos.len());
            let records =
                repopulse_github::collect::collect_contributors(&client, &repos, &pb).await;
            repopulse_groups::dataset::write_contributors(&output, &records)?;

            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&records).into_diagnostic()?);
                }
                _ => println!(
                    "Wrote contributor counts for {} repositories to {}",
                    records.len(),
                    output.display()
                ),
            }
        }
        Some(Command::Groups { input, output }) => {
            let input = input.unwrap_or_else(|| config.paths.contributors_csv.clone());
            let output = output.unwrap_or_else(|| config.paths.groups_csv.clone());

            let records = repopulse_groups::dataset::read_contributors(&input)?;
            let partition = Partition::compute(&records);
            if partition.is_empty() {
                warn!(input = %input.display(), "no repositories to group");
            }
            repopulse_groups::dataset::write_assignments_file(&output, &partition.assignments())?;
            print_groups(cli.format, &partition, &output)?;
        }
        Some(Command::Commits { action }) => match action {
            CommitsCommand::Collect {
                repos,
                output,
                token,
            } => {
                let repos_path = repos.unwrap_or_else(|| config.paths.repos_csv.clone());
                let output = output.unwrap_or_else(|| config.paths.raw_commits_json.clone());

                let repos = repopulse_github::repos::read_repo_list(&repos_path)?;
                let client =
                    repopulse_github::GitHubClient::new(&config.github)?.with_token(token);
                let pb = progress_bar(repos.len());
                let data = repopulse_github::collect::collect_commits(&client, &repos, &pb).await;
                repopulse_github::collect::write_raw_commits(&output, &data)?;

                let total: usize = data.values().map(|r| r.commits.len()).sum();
                println!(
                    "Collected {total} commits from {} repositories into {}",
                    data.len(),
                    output.display()
                );
            }
            CommitsCommand::Classify {
                input,
                output,
                unclassified,
            } => {
                let input = input.unwrap_or_else(|| config.paths.raw_commits_json.clone());
                let output = output.unwrap_or_else(|| config.paths.commit_types_csv.clone());
                let unclassified =
                    unclassified.unwrap_or_else(|| config.paths.unclassified_json.clone());

                let raw = repopulse_commits::report::read_raw_commits(&input)?;
                let classifier = repopulse_commits::CommitClassifier::new();
                let report = repopulse_commits::report::classify_repositories(&raw, &classifier);
                repopulse_commits::report::write_commit_counts(&output, &report.counts)?;
                repopulse_commits::report::write_unclassified(&unclassified, &report.unclassified)?;

                match cli.format {
                    OutputFormat::Json => {
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&report.counts).into_diagnostic()?
                        );
                    }
                    OutputFormat::Markdown => {
                        println!("| Repository | feat | fix | refactor | ci | chore | other | total |");
                        println!("|------------|------|-----|----------|----|-------|-------|-------|");
                        for c in &report.counts {
                            println!(
                                "| {} | {} | {} | {} | {} | {} | {} | {} |",
                                c.repo, c.feat, c.fix, c.refactor, c.ci, c.chore, c.other, c.total_commits
                            );
                        }
                    }
                    OutputFormat::Text => {
                        println!(
                            "Classified {} repositories into {} ({} unclassified messages in {})",
                            report.counts.len(),
                            output.display(),
                            report.unclassified.len(),
                            unclassified.display()
                        );
                    }
                }
            }
            CommitsCommand::Ratios {
                counts,
                contributors,
            } => {
                let counts = counts.unwrap_or_else(|| config.paths.commit_types_csv.clone());
                let contributors =
                    contributors.unwrap_or_else(|| config.paths.contributors_csv.clone());

                let counts = repopulse_commits::report::read_commit_counts(&counts)?;
                let contributors = repopulse_groups::dataset::read_contributors(&contributors)?;
                let ratios = repopulse_commits::activity::activity_ratios(&counts, &contributors);

                match cli.format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&ratios).into_diagnostic()?);
                    }
                    OutputFormat::Markdown => {
                        println!("| Repository | Contributors | Commits | fix ratio | refactor/feat |");
                        println!("|------------|--------------|---------|-----------|---------------|");
                        for r in &ratios {
                            println!(
                                "| {} | {} | {} | {} | {} |",
                                r.repo,
                                r.contributors,
                                r.total_commits,
                                format_ratio(r.fix_ratio),
                                format_ratio(r.refactor_per_feat)
                            );
                        }
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<30} {:>12} {:>8} {:>9} {:>13}",
                            "repository", "contributors", "commits", "fix", "refactor/feat"
                        );
                        for r in &ratios {
                            println!(
                                "{:<30} {:>12} {:>8} {:>9} {:>13}",
                                r.repo,
                                r.contributors,
                                r.total_commits,
                                format_ratio(r.fix_ratio),
                                format_ratio(r.refactor_per_feat)
                            );
                        }
                    }
                }
            }
        },
        Some(Command::Sonar {
            project_key,
            output,
            repo_url,
            summary,
            token,
        }) => {
            let client = repopulse_sonar::SonarClient::new(&config.sonar)?.with_token(token);

            let score = match client.fetch_measures(&project_key).await {
                Ok(measures) => repopulse_sonar::QualityScore::from_measures(&measures),
                Err(e) => {
                    warn!(project_key = %project_key, error = %e, "measures unavailable, scoring 0");
                    repopulse_sonar::QualityScore::default()
                }
            };
            let issues = client
                .fetch_issues(&project_key)
                .await
                .wrap_err_with(|| format!("fetching issues for {project_key}"))?;
            repopulse_sonar::export::write_issue_report_file(&output, &project_key, &score, &issues)?;

            if let Some(url) = &repo_url {
                let summary = summary.unwrap_or_else(|| config.paths.quality_summary_csv.clone());
                repopulse_sonar::export::upsert_quality_summary(&summary, url, score.score)?;
            }

            match cli.format {
                OutputFormat::Json => {
                    let report = serde_json::json!({
                        "projectKey": project_key,
                        "repoUrl": repo_url,
                        "issues": issues.len(),
                        "quality": score,
                    });
                    println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
                }
                _ => println!(
                    "{project_key}: score {:.2}/100, {} issues written to {}",
                    score.score,
                    issues.len(),
                    output.display()
                ),
            }
        }
        Some(Command::Summary { groups, scores }) => {
            let groups = groups.unwrap_or_else(|| config.paths.groups_csv.clone());
            let scores = scores.unwrap_or_else(|| config.paths.quality_summary_csv.clone());

            let assignments = repopulse_groups::dataset::read_assignments(&groups)?;
            let scores = repopulse_groups::summary::read_quality_scores(&scores)?;
            let summary = repopulse_groups::summary::summarize_by_group(&assignments, &scores);
            print_summary(cli.format, &summary)?;
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{} already exists", CONFIG_FILE);
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "repopulse", &mut std::io::stdout());
        }
    }

    Ok(())
}
