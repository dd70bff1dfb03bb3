use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use mailsplit::{dispatch, group_files, scan_directory, Config, GroupPlan, MessageTemplate, SmtpSession};

/// Split a directory of files into size-bounded groups and send each
/// group as one email with those files attached.
#[derive(Parser, Debug)]
#[command(name = "mailsplit", version, about)]
struct Cli {
    /// JSON file with the base configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// SMTP server hostname
    #[arg(long)]
    host: Option<String>,

    /// SMTP submission port
    #[arg(long)]
    port: Option<u16>,

    /// Account username (e.g. michaelscott@gmail.com)
    #[arg(long)]
    username: Option<String>,

    /// Account password
    #[arg(long)]
    password: Option<String>,

    /// From address (defaults to the username)
    #[arg(long)]
    from: Option<String>,

    /// Recipient address
    #[arg(long)]
    to: Option<String>,

    /// Email subject; each message gets a k/N suffix
    #[arg(long)]
    subject: Option<String>,

    /// Email body text
    #[arg(long)]
    body: Option<String>,

    /// Directory containing the files to attach (immediate entries only)
    #[arg(long)]
    directory: Option<PathBuf>,

    /// Max total attachment size per email, in bytes
    #[arg(long)]
    max_size: Option<u64>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    yes: bool,

    /// Show the grouping plan without sending anything
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Merge the config file (if any) with flag overrides into a validated
    /// configuration record.
    fn resolve_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        if let Some(v) = &self.host {
            config.host = v.clone();
        }
        if let Some(v) = self.port {
            config.port = v;
        }
        if let Some(v) = &self.username {
            config.username = v.clone();
        }
        if let Some(v) = &self.password {
            config.password = v.clone();
        }
        if let Some(v) = &self.from {
            config.from_address = v.clone();
        }
        if let Some(v) = &self.to {
            config.to_address = v.clone();
        }
        if let Some(v) = &self.subject {
            config.subject = v.clone();
        }
        if let Some(v) = &self.body {
            config.body = v.clone();
        }
        if let Some(v) = &self.directory {
            config.directory = v.clone();
        }
        if let Some(v) = self.max_size {
            config.max_size = v;
        }

        config.resolve();
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    println!("Step 1: Scanning {}...", config.directory.display());
    let entries = scan_directory(&config.directory)
        .with_context(|| format!("failed to scan {}", config.directory.display()))?;
    println!("✓ Found {} files\n", entries.len());

    println!(
        "Step 2: Grouping by max attachment size ({} bytes)...",
        config.max_size
    );
    let plan = group_files(entries, config.max_size);
    print_plan(&plan, config.max_size);

    if plan.groups.is_empty() {
        println!("Nothing to send.");
        return Ok(());
    }
    if cli.dry_run {
        return Ok(());
    }

    print_summary(&config, &plan);
    if !cli.yes && !confirm()? {
        println!("Aborted. Nothing was sent.");
        return Ok(());
    }

    println!("\nStep 3: Connecting to {}:{}...", config.host, config.port);
    let mut session = SmtpSession::open(
        &config.host,
        config.port,
        &config.username,
        &config.password,
    )
    .context("failed to open SMTP session")?;
    println!("✓ Session authenticated\n");

    println!("Step 4: Sending {} messages...", plan.groups.len());
    let template = MessageTemplate {
        from: config.from_address.clone(),
        to: config.to_address.clone(),
        subject: config.subject.clone(),
        body: config.body.clone(),
    };
    let sent = dispatch(&mut session, &template, &plan.groups)?;
    session.quit()?;

    println!("\n✓ Sent {} messages to {}", sent, config.to_address);
    Ok(())
}

fn print_plan(plan: &GroupPlan, max_size: u64) {
    println!(
        "✓ {} groups covering {} files\n",
        plan.groups.len(),
        plan.file_count()
    );

    for (i, group) in plan.groups.iter().enumerate() {
        println!(
            "  Group {}/{} ({} bytes):",
            i + 1,
            plan.groups.len(),
            group.total_size()
        );
        for entry in &group.entries {
            println!("    {} ({} bytes)", entry.file_name(), entry.size);
        }
    }

    for entry in &plan.skipped {
        println!(
            "  WARNING: '{}' will not be sent: its size ({} bytes) reaches the {} byte limit",
            entry.path.display(),
            entry.size,
            max_size
        );
    }
    println!();
}

fn print_summary(config: &Config, plan: &GroupPlan) {
    println!("Resolved configuration:");
    println!("  host:      {}", config.host);
    println!("  port:      {}", config.port);
    println!("  username:  {}", config.username);
    println!("  password:  ********");
    println!("  from:      {}", config.from_address);
    println!("  to:        {}", config.to_address);
    println!("  subject:   {}", config.subject);
    println!("  message:   {}", config.body);
    println!("  directory: {}", config.directory.display());
    println!("  max size:  {} bytes", config.max_size);
    println!("  emails:    {}", plan.groups.len());
}

fn confirm() -> anyhow::Result<bool> {
    print!("Send emails using the info above? [y/N]: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y"))
}
