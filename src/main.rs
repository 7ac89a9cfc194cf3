use clap::{Parser, Subcommand};
use posterflow::auth::HttpAuthServer;
use posterflow::genai::{ImageGenerator, TextGenerator};
use posterflow::store::{CredentialStore, Identity};
use posterflow::upload::{DriveUploader, HttpTransport};
use posterflow::{config, export, genai, helper, output, prompts};
use std::path::PathBuf;
use std::time::Duration;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "posterflow")]
#[command(about = "Poster art workflow: brainstorm, generate, print-export, upload")]
#[command(long_about = "\
Poster art workflow: brainstorm, generate, print-export, upload

The workflow is four independent stages, each a plain command over plain
files:

  posterflow brainstorm \"autumn forest\" --count 5
      Ask the text model for prompt candidates.

  posterflow generate \"a crimson maple tree, watercolor\" --count 2
      Render source images into the working directory.

  posterflow export gen_1.png --out prints/
      Produce print-ready JPEGs: each source is fit onto fixed 300 DPI
      canvases (Large 3508x4961, Medium 2480x3508, Small 1748x2480 by
      default), centered on white, encoded at quality 95.

  posterflow upload prints/ --email you@example.com
      Upload to the configured Drive folder, refreshing the stored OAuth
      token if it went stale.

Authorization happens once through the local helper:

  posterflow helper          # then open http://127.0.0.1:5001/

Run 'posterflow gen-config' for a documented posterflow.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (defaults to ./posterflow.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the text model for poster prompt candidates
    Brainstorm {
        /// Core concept to riff on
        concept: String,
        /// Optional style direction (e.g. "watercolor", "art deco")
        #[arg(long)]
        style: Option<String>,
        /// Keywords to weave in (repeatable)
        #[arg(long)]
        keyword: Vec<String>,
        /// How many candidates to request
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
    /// Generate source images from a prompt
    Generate {
        prompt: String,
        /// How many images to generate
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// Directory to write the generated PNGs into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Render print-ready JPEG variants for images or directories
    Export {
        /// Source images and/or directories to walk
        inputs: Vec<PathBuf>,
        /// Output directory
        #[arg(long, default_value = "prints")]
        out: PathBuf,
    },
    /// Upload images to the configured Drive folder
    Upload {
        /// Files and/or directories to upload
        inputs: Vec<PathBuf>,
        /// Account to upload as (defaults to the current identity)
        #[arg(long)]
        email: Option<String>,
    },
    /// Show who is currently logged in
    Status,
    /// Remove the stored credentials for one account
    Logout {
        /// Account to log out (defaults to the current identity)
        #[arg(long)]
        email: Option<String>,
    },
    /// Remove every stored credential
    ClearUsers,
    /// Run the local OAuth helper web app
    Helper {
        #[arg(long, default_value_t = 5001)]
        port: u16,
    },
    /// Print a stock posterflow.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let app_config = config::AppConfig::load_or_default(cli.config.as_deref())?;
    let timeout = Duration::from_secs(app_config.http.timeout_secs);

    match cli.command {
        Command::Brainstorm {
            concept,
            style,
            keyword,
            count,
        } => {
            let client = genai::OpenAiClient::new(&app_config.openai, timeout)?;
            let (system, user) =
                prompts::brainstorm_instructions(&concept, style.as_deref(), &keyword, count);
            let reply = client.generate_text(&system, &user)?;
            let candidates = prompts::parse_candidates(&reply, count);
            output::print_candidates(&candidates);
        }
        Command::Generate { prompt, count, out } => {
            let client = genai::OpenAiClient::new(&app_config.openai, timeout)?;
            let images = client.generate_images(&prompt, count)?;
            std::fs::create_dir_all(&out)?;
            for image in &images {
                let path = out.join(&image.name);
                std::fs::write(&path, &image.bytes)?;
                println!("{}", path.display());
            }
            println!("Generated {} image(s)", images.len());
        }
        Command::Export { inputs, out } => {
            let summary = export::export_prints(
                &inputs,
                &out,
                &app_config.print.targets,
                posterflow::imaging::Quality::new(app_config.print.quality),
            )?;
            output::print_export_output(&summary);
        }
        Command::Upload { inputs, email } => {
            app_config.require_oauth_client()?;
            let store = CredentialStore::open(&app_config.storage.db_path)?;
            let identity = resolve_identity(&store, email)?;
            let server = HttpAuthServer::new(app_config.oauth.clone(), timeout)?;
            let transport = HttpTransport::new(app_config.drive.upload_url.clone(), timeout)?;
            let uploader = DriveUploader::new(
                &store,
                &server,
                &transport,
                app_config.drive.folder_id.clone(),
            );

            let items = collect_upload_items(&inputs)?;
            let report = uploader.upload_batch(&identity, &items);
            output::print_upload_output(&report);
            if !report.all_succeeded() {
                std::process::exit(1);
            }
        }
        Command::Status => {
            let store = CredentialStore::open(&app_config.storage.db_path)?;
            let record = match store.current_identity()? {
                Some(identity) => store.get(&identity)?,
                None => None,
            };
            output::print_status(record.as_ref());
        }
        Command::Logout { email } => {
            let store = CredentialStore::open(&app_config.storage.db_path)?;
            let identity = resolve_identity(&store, email)?;
            store.delete(&identity)?;
            println!("Logged out {}", identity);
        }
        Command::ClearUsers => {
            let store = CredentialStore::open(&app_config.storage.db_path)?;
            store.clear_all()?;
            println!("All stored credentials removed");
        }
        Command::Helper { port } => {
            helper::run(app_config, port)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Pick the explicit `--email` if given, else the current identity.
fn resolve_identity(
    store: &CredentialStore,
    email: Option<String>,
) -> Result<Identity, Box<dyn std::error::Error>> {
    if let Some(email) = email {
        return Ok(Identity::new(email));
    }
    store
        .current_identity()?
        .ok_or_else(|| "no account is logged in — run 'posterflow helper' to authorize".into())
}

/// Expand file and directory inputs into named upload items, in path order.
fn collect_upload_items(
    inputs: &[PathBuf],
) -> Result<Vec<(String, Vec<u8>)>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = walkdir::WalkDir::new(input)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.path().to_path_buf())
                .collect();
            entries.sort();
            paths.extend(entries);
        } else {
            paths.push(input.clone());
        }
    }
    if paths.is_empty() {
        return Err("nothing to upload".into());
    }

    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        items.push((name, std::fs::read(&path)?));
    }
    Ok(items)
}
